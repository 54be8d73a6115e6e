//! Declarative operation descriptors and the request/response shapes they exchange
//! with the engine.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde_json::{json, Map, Value as JsonValue};

use crate::error::{PaginationError, ValidationError};
use crate::path::DottedPath;
use crate::schema::Schema;
use crate::validate::{Args, Strictness};

/// Where the cursor for the next page is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorLocation {
    Query,
    Payload,
    Headers,
}

/// `paginate: true` accumulates every page; `paginate: "iterator"` yields pages lazily.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginateMode {
    Auto,
    Iterator,
}

impl PaginateMode {
    /// `false` and `null` mean "no pagination".
    pub fn from_value(value: &JsonValue) -> Result<Option<Self>, ValidationError> {
        match value {
            JsonValue::Bool(true) => Ok(Some(Self::Auto)),
            JsonValue::Bool(false) | JsonValue::Null => Ok(None),
            JsonValue::String(s) if s == "iterator" => Ok(Some(Self::Iterator)),
            _ => Err(ValidationError::WrongType {
                field: "paginate".to_string(),
                expected: "boolean | \"iterator\"".to_string(),
            }),
        }
    }
}

/// Partial pagination settings. Used both as an operation's default and as a
/// per-call override; fields set on the override win.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paginator {
    pub location: Option<CursorLocation>,
    pub cursor: Option<Cow<'static, str>>,
    pub token: Option<Cow<'static, str>>,
    pub accumulator: Option<Cow<'static, str>>,
}

impl Paginator {
    pub const fn query(cursor: &'static str) -> Self {
        Self::at(CursorLocation::Query, cursor)
    }

    pub const fn payload(cursor: &'static str) -> Self {
        Self::at(CursorLocation::Payload, cursor)
    }

    pub const fn headers(cursor: &'static str) -> Self {
        Self::at(CursorLocation::Headers, cursor)
    }

    const fn at(location: CursorLocation, cursor: &'static str) -> Self {
        Self {
            location: Some(location),
            cursor: Some(Cow::Borrowed(cursor)),
            token: None,
            accumulator: None,
        }
    }

    pub fn with_cursor(mut self, cursor: impl Into<Cow<'static, str>>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    pub fn with_token(mut self, token: impl Into<Cow<'static, str>>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_accumulator(mut self, accumulator: impl Into<Cow<'static, str>>) -> Self {
        self.accumulator = Some(accumulator.into());
        self
    }

    /// Field-wise merge: values on `self` take precedence over `base`.
    pub fn merged_over(&self, base: &Paginator) -> Paginator {
        Paginator {
            location: self.location.or(base.location),
            cursor: self.cursor.clone().or_else(|| base.cursor.clone()),
            token: self.token.clone().or_else(|| base.token.clone()),
            accumulator: self.accumulator.clone().or_else(|| base.accumulator.clone()),
        }
    }

    /// Turn into a complete spec; cursor and token are mandatory, paths must be well formed.
    pub fn resolve(&self) -> Result<PaginationSpec, PaginationError> {
        let cursor = self
            .cursor
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .ok_or(PaginationError::MissingField("cursor"))?;
        let token = self
            .token
            .as_deref()
            .ok_or(PaginationError::MissingField("token"))?;
        Ok(PaginationSpec {
            location: self.location.unwrap_or(CursorLocation::Query),
            cursor: cursor.to_string(),
            token: DottedPath::parse(token)?,
            accumulator: self.accumulator.as_deref().map(DottedPath::parse).transpose()?,
        })
    }
}

/// Fully resolved pagination for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationSpec {
    pub location: CursorLocation,
    pub cursor: String,
    pub token: DottedPath,
    pub accumulator: Option<DottedPath>,
}

/// What a descriptor's request function produces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRequest {
    pub method: Option<String>,
    pub path: Option<String>,
    pub query: Option<Args>,
    pub payload: Option<JsonValue>,
    pub headers: BTreeMap<String, String>,
    pub paginate: Option<PaginateMode>,
    pub paginator: Option<Paginator>,
}

impl RawRequest {
    pub fn with_query(query: Args) -> Self {
        Self {
            query: Some(query),
            ..Self::default()
        }
    }

    pub fn with_payload(payload: JsonValue) -> Self {
        Self {
            payload: Some(payload),
            ..Self::default()
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn paginate(mut self, mode: PaginateMode) -> Self {
        self.paginate = Some(mode);
        self
    }

    pub fn paginator(mut self, paginator: Paginator) -> Self {
        self.paginator = Some(paginator);
        self
    }
}

/// A decoded HTTP response handed to a descriptor's response function.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub payload: JsonValue,
}

impl RawResponse {
    /// The `{ statusCode, headers, payload }` shape returned by descriptor-less calls.
    pub fn into_value(self) -> JsonValue {
        json!({
            "statusCode": self.status_code,
            "headers": self.headers,
            "payload": self.payload,
        })
    }

    /// Remove and return a top-level payload member, e.g. `GetRoleResult`.
    /// Missing or empty members yield an empty object.
    pub fn take_result(&mut self, key: &str) -> JsonValue {
        let taken = self
            .payload
            .as_object_mut()
            .and_then(|m| m.remove(key));
        match taken {
            Some(JsonValue::Object(map)) => JsonValue::Object(map),
            Some(JsonValue::String(s)) if !s.is_empty() => JsonValue::String(s),
            Some(JsonValue::Array(items)) => JsonValue::Array(items),
            _ => JsonValue::Object(Map::new()),
        }
    }
}

/// Body encoding conventions of a service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Protocol {
    /// AWS query protocol: `Action`/`Version` in the query string, lists as
    /// `Name.member.N`, XML responses.
    Query,
    #[default]
    Json,
}

/// How a service's host name is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// `{service}.{region}.amazonaws.com`
    Regional,
    /// A single global host signed for a fixed region.
    Global {
        host: &'static str,
        signing_region: &'static str,
    },
}

/// One remote operation: schema plus pure shaping functions.
#[derive(Debug, Clone)]
pub struct OperationDescriptor {
    pub name: &'static str,
    pub docs: Option<&'static str>,
    pub validate: Schema,
    pub strictness: Strictness,
    pub request: fn(&Args) -> RawRequest,
    pub response: fn(RawResponse) -> JsonValue,
    pub paginator: Option<Paginator>,
}

impl OperationDescriptor {
    pub const fn new(
        name: &'static str,
        validate: Schema,
        request: fn(&Args) -> RawRequest,
        response: fn(RawResponse) -> JsonValue,
    ) -> Self {
        Self {
            name,
            docs: None,
            validate,
            strictness: Strictness::Permissive,
            request,
            response,
            paginator: None,
        }
    }

    pub const fn docs(mut self, url: &'static str) -> Self {
        self.docs = Some(url);
        self
    }

    pub fn paginated(mut self, paginator: Paginator) -> Self {
        self.paginator = Some(paginator);
        self
    }

    pub const fn strict(mut self) -> Self {
        self.strictness = Strictness::RejectUnknown;
        self
    }
}

/// All operations of one service, looked up by name.
#[derive(Debug, Clone)]
pub struct ServiceTable {
    pub service: &'static str,
    pub protocol: Protocol,
    pub endpoint: Endpoint,
    methods: BTreeMap<&'static str, OperationDescriptor>,
}

impl ServiceTable {
    pub fn new(service: &'static str, protocol: Protocol) -> Self {
        Self {
            service,
            protocol,
            endpoint: Endpoint::Regional,
            methods: BTreeMap::new(),
        }
    }

    pub fn global(mut self, host: &'static str, signing_region: &'static str) -> Self {
        self.endpoint = Endpoint::Global {
            host,
            signing_region,
        };
        self
    }

    pub fn with(mut self, descriptor: OperationDescriptor) -> Self {
        self.methods.insert(descriptor.name, descriptor);
        self
    }

    pub fn get(&self, operation: &str) -> Option<&OperationDescriptor> {
        self.methods.get(operation)
    }

    pub fn operations(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.methods.keys().copied()
    }
}
