use std::collections::BTreeMap;
use std::fmt;

use awslite_core::{ConfigError, PaginationError, ValidationError};
use serde_json::Value as JsonValue;

use crate::decode::{decode_body, DecodeError};
use crate::http::{HttpError, HttpResponseParts};
use crate::signer::SigningError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Pagination(#[from] PaginationError),
    #[error(transparent)]
    Transport(#[from] HttpError),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Signing(#[from] SigningError),
    #[error("unknown operation `{operation}` for service `{service}`")]
    UnknownOperation { service: String, operation: String },
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl Error {
    /// HTTP status of a service error response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Service(e) => Some(e.status),
            _ => None,
        }
    }

    pub fn as_service(&self) -> Option<&ServiceError> {
        match self {
            Self::Service(e) => Some(e),
            _ => None,
        }
    }
}

/// A non-2xx/3xx response. The decoded payload and raw body are preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceError {
    pub status: u16,
    pub code: Option<String>,
    pub message: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub payload: JsonValue,
    pub body: String,
}

impl ServiceError {
    pub fn from_response(resp: HttpResponseParts) -> Self {
        let body = String::from_utf8_lossy(&resp.body).into_owned();
        let payload = decode_body(&resp.headers, &resp.body)
            .unwrap_or_else(|_| JsonValue::String(body.clone()));
        let (code, message) = extract_code_and_message(&payload);
        Self {
            status: resp.status,
            code,
            message,
            headers: resp.headers,
            payload,
            body,
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "service responded with status {}", self.status)?;
        if let Some(code) = &self.code {
            write!(f, ": {code}")?;
        }
        if let Some(message) = &self.message {
            write!(f, " - {message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ServiceError {}

// XML: `<ErrorResponse><Error><Code/><Message/></Error></ErrorResponse>` or a bare
// `<Error>` root. JSON: `__type` (possibly `namespace#Code`) plus `message`.
fn extract_code_and_message(payload: &JsonValue) -> (Option<String>, Option<String>) {
    let text = |v: Option<&JsonValue>| {
        v.and_then(JsonValue::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    if let Some(err) = payload.get("Error").filter(|e| e.is_object()) {
        return (text(err.get("Code")), text(err.get("Message")));
    }

    let code = text(payload.get("__type"))
        .or_else(|| text(payload.get("code")))
        .or_else(|| text(payload.get("Code")))
        .map(|c| c.rsplit('#').next().unwrap_or_default().to_string());
    let message = text(payload.get("message")).or_else(|| text(payload.get("Message")));
    (code, message)
}
