#![forbid(unsafe_code)]

//! Pure building blocks for the awslite engine: operation descriptors, parameter
//! schemas and validation, dotted-path lookups, array normalization and
//! region/credential resolution. Nothing in this crate performs network I/O.

pub mod config;
pub mod descriptor;
pub mod error;
pub mod normalize;
pub mod path;
pub mod schema;
pub mod validate;

pub use crate::config::{
    resolve, resolve_credentials, resolve_region, ConfigParams, Credentials, Env,
    FsProfileReader, ProfileFile, ProfileFileReader, ResolvedConfig,
};
pub use crate::descriptor::{
    CursorLocation, Endpoint, OperationDescriptor, PaginateMode, PaginationSpec, Paginator,
    Protocol, RawRequest, RawResponse, ServiceTable,
};
pub use crate::error::{ConfigError, PaginationError, ValidationError};
pub use crate::normalize::{into_list, normalize_object_arrays};
pub use crate::path::DottedPath;
pub use crate::schema::{ParamSpec, ParamType, Schema};
pub use crate::validate::{validate, Args, Strictness, ValidatedArgs};
