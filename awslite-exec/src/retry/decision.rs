use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};

use crate::retry::headers::parse_retry_after;
use crate::retry::policy::{is_retryable_status, RetryPolicy};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter { delay: Duration, reason: RetryReason },
    Stop { reason: RetryReason },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryReason {
    NotRetryable,
    AttemptsExhausted,
    NetworkFailure,
    HttpStatus(u16),
    RetryAfterHeader,
}

/// Decide if we should retry and how long to wait.
///
/// - `attempt_no`: 1-based number of the attempt that just failed.
/// - `http_status`: status code if a response was received.
/// - `response_headers`: headers if a response was received.
/// - `network_failed`: true for a retryable connection-level failure.
/// - `now`: time source for parsing HTTP-date `Retry-After`.
/// - `rand_u64`: RNG for full jitter.
pub fn decide_retry(
    policy: &RetryPolicy,
    attempt_no: usize,
    http_status: Option<u16>,
    response_headers: Option<&BTreeMap<String, String>>,
    network_failed: bool,
    now: SystemTime,
    rand_u64: impl Fn() -> u64,
) -> RetryDecision {
    if let Some(status) = http_status {
        if !is_retryable_status(status) {
            return RetryDecision::Stop {
                reason: RetryReason::HttpStatus(status),
            };
        }
    } else if !network_failed {
        return RetryDecision::Stop {
            reason: RetryReason::NotRetryable,
        };
    }

    if attempt_no >= policy.max_attempts.max(1) {
        return RetryDecision::Stop {
            reason: RetryReason::AttemptsExhausted,
        };
    }

    // Retry-After header wins.
    if let Some(h) = response_headers {
        if let Some(delay) = parse_retry_after(h, now) {
            return RetryDecision::RetryAfter {
                delay: delay.min(policy.max_delay),
                reason: RetryReason::RetryAfterHeader,
            };
        }
    }

    // Exponential backoff: base * factor^(attempt_no-1), with full jitter.
    let exp = attempt_no.saturating_sub(1).min(i32::MAX as usize) as i32;
    let raw = (policy.base_delay.as_millis() as f64) * policy.factor.powi(exp);
    let raw_ms = raw.min(policy.max_delay.as_millis() as f64).max(0.0) as u64;

    let jitter_ms = if raw_ms == 0 { 0 } else { rand_u64() % (raw_ms + 1) };
    RetryDecision::RetryAfter {
        delay: Duration::from_millis(jitter_ms),
        reason: http_status
            .map(RetryReason::HttpStatus)
            .unwrap_or(RetryReason::NetworkFailure),
    }
}
