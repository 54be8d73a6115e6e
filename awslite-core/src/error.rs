use thiserror::Error;

/// Region, profile or credentials could not be resolved. Never sent over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Region must be a string")]
    RegionNotString,
    #[error("Invalid region specified: {0}")]
    InvalidRegion(String),
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),
    #[error("You must supply AWS region")]
    MissingRegion,
    #[error("You must supply AWS credentials")]
    MissingCredentials,
    #[error("Retries must be a number")]
    RetriesNotNumber,
    #[error("invalid config value for `{field}`: {message}")]
    InvalidValue { field: String, message: String },
}

impl ConfigError {
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Caller-supplied arguments do not satisfy an operation's schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Parameters must be an object")]
    NotAnObject,
    #[error("Missing required parameter: {field}")]
    MissingRequired { field: String },
    #[error("Parameter `{field}` must be of type {expected}")]
    WrongType { field: String, expected: String },
    #[error("Unknown parameter: {field}")]
    UnknownField { field: String },
}

impl ValidationError {
    /// Name of the offending field, if the error concerns one.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::NotAnObject => None,
            Self::MissingRequired { field }
            | Self::WrongType { field, .. }
            | Self::UnknownField { field } => Some(field),
        }
    }
}

/// Malformed pagination configuration. Always fatal, raised before the first request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaginationError {
    #[error("invalid pagination path `{path}`: empty segment")]
    EmptySegment { path: String },
    #[error("paginator is missing `{0}`")]
    MissingField(&'static str),
    #[error("operation `{0}` does not support pagination")]
    NotPaginated(String),
    #[error("cannot set payload cursor `{cursor}`: request payload is not an object")]
    PayloadNotObject { cursor: String },
}
