//! Cursor pagination in two modes: auto-accumulate and lazy iteration.
//!
//! Each page's token is looked up on the decoded payload, before the response
//! function shapes it. A token that is absent or falsy (`null`, `false`, `""`, `0`)
//! ends pagination.

use std::fmt;

use awslite_core::{
    into_list, CursorLocation, DottedPath, PaginationError, PaginationSpec, RawRequest, RawResponse,
};
use futures_util::stream::{self, Stream};
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use crate::client::{Client, Route};
use crate::error::Error;

pub(crate) type Shape = fn(RawResponse) -> JsonValue;

enum State {
    Start,
    Continue(String),
    Done,
}

/// Forward-only, single-use sequence of pages. Each call to [`next`](Self::next)
/// issues at most one request; nothing is prefetched.
pub struct PageIterator {
    client: Client,
    route: Route,
    request: RawRequest,
    spec: PaginationSpec,
    shape: Shape,
    state: State,
    page: usize,
}

impl PageIterator {
    pub(crate) fn new(
        client: Client,
        route: Route,
        request: RawRequest,
        spec: PaginationSpec,
        shape: Shape,
    ) -> Result<Self, PaginationError> {
        if spec.location == CursorLocation::Payload
            && request.payload.as_ref().is_some_and(|p| !p.is_object() && !p.is_null())
        {
            return Err(PaginationError::PayloadNotObject { cursor: spec.cursor });
        }
        Ok(Self {
            client,
            route,
            request,
            spec,
            shape,
            state: State::Start,
            page: 0,
        })
    }

    pub fn spec(&self) -> &PaginationSpec {
        &self.spec
    }

    /// Number of pages requested so far.
    pub fn pages_fetched(&self) -> usize {
        self.page
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, State::Done)
    }

    /// Fetch and shape the next page. `None` once exhausted; an error is yielded
    /// once and ends the sequence.
    pub async fn next(&mut self) -> Option<Result<JsonValue, Error>> {
        match self.next_raw().await {
            Ok(Some(raw)) => Some(Ok((self.shape)(raw))),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<JsonValue, Error>> {
        stream::unfold(self, |mut pages| async move {
            match pages.next().await {
                Some(item) => Some((item, pages)),
                None => None,
            }
        })
    }

    /// Drain every page, concatenating the accumulator slices in page order.
    ///
    /// The result is the last page with its accumulator replaced by the
    /// concatenation, passed through the response function once.
    pub(crate) async fn collect_all(mut self) -> Result<JsonValue, Error> {
        let accumulator = self
            .spec
            .accumulator
            .clone()
            .ok_or(PaginationError::MissingField("accumulator"))?;

        let mut items = Vec::new();
        let mut last = None;
        while let Some(raw) = self.next_raw().await? {
            if let Some(slice) = accumulator.lookup(&raw.payload) {
                items.extend(into_list(slice.clone()));
            }
            last = Some(raw);
        }

        let mut last =
            last.ok_or_else(|| Error::InvalidRequest("pagination produced no pages".into()))?;
        if !accumulator.replace(&mut last.payload, JsonValue::Array(items)) {
            debug!(accumulator = %accumulator, "accumulator path is not writable on the last page");
        }
        Ok((self.shape)(last))
    }

    async fn next_raw(&mut self) -> Result<Option<RawResponse>, Error> {
        let request = match &self.state {
            State::Done => return Ok(None),
            State::Start => self.request.clone(),
            State::Continue(token) => {
                let mut request = self.request.clone();
                inject_cursor(&mut request, &self.spec, token)?;
                request
            }
        };

        self.page += 1;
        let raw = match self.client.send_raw(&self.route, &request).await {
            Ok(raw) => raw,
            Err(e) => {
                self.state = State::Done;
                return Err(e);
            }
        };

        let token = extract_token(&self.spec.token, &raw.payload);
        debug!(page = self.page, has_token = token.is_some(), "fetched page");
        self.state = match token {
            Some(token) => State::Continue(token),
            None => State::Done,
        };
        Ok(Some(raw))
    }
}

impl fmt::Debug for PageIterator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageIterator")
            .field("service", &self.route.service)
            .field("spec", &self.spec)
            .field("page", &self.page)
            .field("done", &self.is_done())
            .finish()
    }
}

/// The token at `path`, rendered for the wire. Absent and falsy tokens are `None`.
pub fn extract_token(path: &DottedPath, payload: &JsonValue) -> Option<String> {
    match path.lookup(payload)? {
        JsonValue::Null | JsonValue::Bool(false) => None,
        JsonValue::String(s) if s.is_empty() => None,
        JsonValue::Number(n) if n.as_f64() == Some(0.0) => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Place `token` under the cursor name at the configured location.
pub fn inject_cursor(
    request: &mut RawRequest,
    spec: &PaginationSpec,
    token: &str,
) -> Result<(), PaginationError> {
    let value = JsonValue::String(token.to_string());
    match spec.location {
        CursorLocation::Query => {
            request
                .query
                .get_or_insert_with(Map::new)
                .insert(spec.cursor.clone(), value);
        }
        CursorLocation::Payload => {
            let payload = request
                .payload
                .get_or_insert_with(|| JsonValue::Object(Map::new()));
            if payload.is_null() {
                *payload = JsonValue::Object(Map::new());
            }
            let map = payload.as_object_mut().ok_or_else(|| PaginationError::PayloadNotObject {
                cursor: spec.cursor.clone(),
            })?;
            map.insert(spec.cursor.clone(), value);
        }
        CursorLocation::Headers => {
            request.headers.insert(spec.cursor.clone(), token.to_string());
        }
    }
    Ok(())
}
