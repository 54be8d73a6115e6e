use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};

use httpdate::parse_http_date;

use crate::http::header_ci;

/// Delay requested by a `Retry-After` header, as delta seconds or an HTTP-date.
/// A date in the past yields `None`.
pub fn parse_retry_after(headers: &BTreeMap<String, String>, now: SystemTime) -> Option<Duration> {
    let v = header_ci(headers, "retry-after")?.trim();
    if let Ok(secs) = v.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let dt = parse_http_date(v).ok()?;
    dt.duration_since(now).ok()
}
