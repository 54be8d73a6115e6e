use std::time::{Duration, SystemTime};

use tracing::{debug, warn};

use crate::error::{Error, ServiceError};
use crate::http::{HttpClient, HttpRequestParts, HttpResponseParts};
use crate::retry::{decide_retry, RetryDecision, RetryPolicy};
use crate::signer::SigningError;

/// Per-attempt resource bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub timeout: Duration,
    pub max_response_bytes: usize,
}

/// Send `request` until it succeeds, fails fatally, or the policy runs out of attempts.
///
/// `sign` runs before every attempt so each one carries a fresh signature. Any
/// status below 400 is success. On exhaustion the last failure is returned as is.
pub async fn execute<S>(
    http: &dyn HttpClient,
    request: &HttpRequestParts,
    policy: &RetryPolicy,
    limits: Limits,
    sign: S,
) -> Result<HttpResponseParts, Error>
where
    S: Fn(&mut HttpRequestParts) -> Result<(), SigningError>,
{
    let mut attempt = 0usize;
    loop {
        attempt += 1;
        let mut req = request.clone();
        sign(&mut req)?;
        debug!(attempt, method = %req.method, url = %req.url, "sending request");

        let sent = http.send(req, limits.timeout, limits.max_response_bytes).await;
        let (failure, decision) = match sent {
            Ok(resp) if resp.status < 400 => return Ok(resp),
            Ok(resp) => {
                let decision = decide_retry(
                    policy,
                    attempt,
                    Some(resp.status),
                    Some(&resp.headers),
                    false,
                    SystemTime::now(),
                    || fastrand::u64(..),
                );
                (Error::Service(ServiceError::from_response(resp)), decision)
            }
            Err(e) => {
                let decision = decide_retry(
                    policy,
                    attempt,
                    None,
                    None,
                    e.is_retryable(),
                    SystemTime::now(),
                    || fastrand::u64(..),
                );
                (Error::Transport(e), decision)
            }
        };

        match decision {
            RetryDecision::RetryAfter { delay, reason } => {
                warn!(
                    attempt,
                    status = ?failure.status(),
                    error = %failure,
                    backoff_ms = delay.as_millis() as u64,
                    ?reason,
                    "request failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            RetryDecision::Stop { reason } => {
                debug!(attempt, ?reason, "not retrying");
                return Err(failure);
            }
        }
    }
}
