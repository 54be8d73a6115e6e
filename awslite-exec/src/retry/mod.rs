mod decision;
mod headers;
mod policy;

pub use decision::{decide_retry, RetryDecision, RetryReason};
pub use headers::parse_retry_after;
pub use policy::{is_retryable_status, RetryPolicy, DEFAULT_RETRIES};
