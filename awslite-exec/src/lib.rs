#![forbid(unsafe_code)]

//! Runtime engine for awslite: builds, signs and sends requests described by
//! `awslite-core` descriptors, retries transient failures, decodes responses and
//! drives cursor pagination.

pub mod builder;
pub mod client;
pub mod config;
pub mod decode;
pub mod error;
pub mod http;
pub mod paginator;
pub mod retry;
pub mod signer;
pub mod transport;

pub use crate::client::{CallOutput, Client, ClientBuilder};
pub use crate::config::ClientConfig;
pub use crate::error::{Error, ServiceError};
pub use crate::http::{
    HttpClient, HttpError, HttpRequestParts, HttpResponseParts, ReqwestHttpClient,
};
pub use crate::paginator::PageIterator;
pub use crate::retry::RetryPolicy;
pub use crate::signer::{SigV4Signer, Signer, SigningContext, SigningError};
