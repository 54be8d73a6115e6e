use std::path::PathBuf;
use std::time::Duration;

use awslite_core::{ConfigError, ConfigParams};
use secrecy::SecretString;
use serde_json::Value as JsonValue;
use url::Url;

use crate::retry::{RetryPolicy, DEFAULT_RETRIES};
use crate::transport::Limits;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 16 * 1024 * 1024;

/// Client construction options.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub params: ConfigParams,
    /// Overrides the derived `https://{service}.{region}.amazonaws.com` / global host.
    pub endpoint: Option<Url>,
    pub retry: RetryPolicy,
    pub timeout: Duration,
    pub max_response_bytes: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            params: ConfigParams::default(),
            endpoint: None,
            retry: RetryPolicy::from_retries(DEFAULT_RETRIES),
            timeout: DEFAULT_TIMEOUT,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }
}

impl ClientConfig {
    /// Read options from a camelCase JSON object, type-checking each field.
    ///
    /// Recognized keys: `region`, `profile`, `configFile`, `credentialsFile`,
    /// `accessKeyId`, `secretAccessKey`, `sessionToken`, `endpoint`,
    /// `retries` (alias `maxAttempts`) and `timeout` in milliseconds.
    pub fn from_json(value: &JsonValue) -> Result<Self, ConfigError> {
        let obj = value
            .as_object()
            .ok_or_else(|| ConfigError::invalid_value("config", "must be an object"))?;
        let mut cfg = Self::default();

        cfg.params.region = match obj.get("region") {
            None | Some(JsonValue::Null) => None,
            Some(JsonValue::String(s)) => Some(s.clone()),
            Some(_) => return Err(ConfigError::RegionNotString),
        };
        cfg.params.profile = string_field(obj, "profile")?;
        cfg.params.config_file = string_field(obj, "configFile")?.map(PathBuf::from);
        cfg.params.credentials_file = string_field(obj, "credentialsFile")?.map(PathBuf::from);
        cfg.params.access_key_id = string_field(obj, "accessKeyId")?;
        cfg.params.secret_access_key =
            string_field(obj, "secretAccessKey")?.map(SecretString::from);
        cfg.params.session_token = string_field(obj, "sessionToken")?.map(SecretString::from);

        if let Some(endpoint) = string_field(obj, "endpoint")? {
            let url = Url::parse(&endpoint)
                .map_err(|e| ConfigError::invalid_value("endpoint", e.to_string()))?;
            cfg.endpoint = Some(url);
        }

        let retries = ["retries", "maxAttempts"]
            .into_iter()
            .find_map(|key| obj.get(key).filter(|v| !v.is_null()).map(|v| (key, v)));
        if let Some((key, retries)) = retries {
            if !retries.is_number() {
                return Err(ConfigError::RetriesNotNumber);
            }
            let n = whole_number(retries)
                .ok_or_else(|| ConfigError::invalid_value(key, "must be a non-negative integer"))?;
            cfg.retry = RetryPolicy::from_retries(usize::try_from(n).unwrap_or(usize::MAX));
        }

        if let Some(timeout) = obj.get("timeout").filter(|v| !v.is_null()) {
            let ms = whole_number(timeout).ok_or_else(|| {
                ConfigError::invalid_value("timeout", "must be a whole number of milliseconds")
            })?;
            cfg.timeout = Duration::from_millis(ms);
        }

        Ok(cfg)
    }

    pub fn limits(&self) -> Limits {
        Limits {
            timeout: self.timeout,
            max_response_bytes: self.max_response_bytes,
        }
    }
}

// Integral floats such as `2.0` are accepted.
fn whole_number(value: &JsonValue) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    (f >= 0.0 && f.fract() == 0.0 && f < u64::MAX as f64).then_some(f as u64)
}

fn string_field(
    obj: &serde_json::Map<String, JsonValue>,
    key: &str,
) -> Result<Option<String>, ConfigError> {
    match obj.get(key) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ConfigError::invalid_value(key, "must be a string")),
    }
}
