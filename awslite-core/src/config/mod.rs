//! Region, profile and credential resolution.
//!
//! Resolution is a pure function of explicit [`ConfigParams`], an [`Env`]
//! snapshot and a [`ProfileFileReader`]. The only side effect is reading profile
//! files through the reader, and that is skipped entirely inside the managed
//! function runtime.
//!
//! Region precedence, highest first:
//! 1. `params.region` (validated against the region-name pattern)
//! 2. `AWS_REGION`, `AWS_DEFAULT_REGION`, `AMAZON_REGION`
//! 3. the config file (`params.config_file`, `AWS_CONFIG_FILE`, or
//!    `~/.aws/config` when `AWS_SDK_LOAD_CONFIG` is set)
//!
//! Credentials follow the same shape: params, then `AWS_ACCESS_KEY_ID` /
//! `AWS_SECRET_ACCESS_KEY` / `AWS_SESSION_TOKEN`, then the shared credentials file.

mod env;
mod profile;
mod region;

use std::fmt;
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::error::ConfigError;

pub use env::{Env, MANAGED_RUNTIME_MARKER};
pub use profile::{FsProfileReader, ProfileFile, ProfileFileReader};
pub use region::validate_region;

pub const REGION_ENV_VARS: [&str; 3] = ["AWS_REGION", "AWS_DEFAULT_REGION", "AMAZON_REGION"];
pub const DEFAULT_PROFILE: &str = "default";

/// Explicitly supplied configuration; every field is optional.
#[derive(Debug, Default)]
pub struct ConfigParams {
    pub region: Option<String>,
    pub profile: Option<String>,
    pub config_file: Option<PathBuf>,
    pub credentials_file: Option<PathBuf>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<SecretString>,
    pub session_token: Option<SecretString>,
}

impl Clone for ConfigParams {
    fn clone(&self) -> Self {
        Self {
            region: self.region.clone(),
            profile: self.profile.clone(),
            config_file: self.config_file.clone(),
            credentials_file: self.credentials_file.clone(),
            access_key_id: self.access_key_id.clone(),
            secret_access_key: self.secret_access_key.as_ref().map(copy_secret),
            session_token: self.session_token.as_ref().map(copy_secret),
        }
    }
}

impl ConfigParams {
    /// Field-wise merge: values set on `self` take precedence over `base`.
    pub fn merged_over(&self, base: &ConfigParams) -> ConfigParams {
        let own = self.clone();
        let base = base.clone();
        ConfigParams {
            region: own.region.or(base.region),
            profile: own.profile.or(base.profile),
            config_file: own.config_file.or(base.config_file),
            credentials_file: own.credentials_file.or(base.credentials_file),
            access_key_id: own.access_key_id.or(base.access_key_id),
            secret_access_key: own.secret_access_key.or(base.secret_access_key),
            session_token: own.session_token.or(base.session_token),
        }
    }
}

/// Signing credentials. The secret parts are redacted from `Debug` output.
pub struct Credentials {
    access_key_id: String,
    secret_access_key: SecretString,
    session_token: Option<SecretString>,
}

impl Credentials {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: SecretString::from(secret_access_key.into()),
            session_token: session_token.map(SecretString::from),
        }
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub fn secret_access_key(&self) -> &str {
        self.secret_access_key.expose_secret()
    }

    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_ref().map(|t| t.expose_secret())
    }
}

impl Clone for Credentials {
    fn clone(&self) -> Self {
        Self {
            access_key_id: self.access_key_id.clone(),
            secret_access_key: copy_secret(&self.secret_access_key),
            session_token: self.session_token.as_ref().map(copy_secret),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn copy_secret(secret: &SecretString) -> SecretString {
    SecretString::from(secret.expose_secret().to_string())
}

/// Outcome of resolution; immutable for the lifetime of the client that owns it.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub region: String,
    pub profile: String,
    pub credentials: Credentials,
}

pub fn resolve(
    params: &ConfigParams,
    env: &Env,
    reader: &dyn ProfileFileReader,
) -> Result<ResolvedConfig, ConfigError> {
    let region = resolve_region(params, env, reader)?;
    let credentials = resolve_credentials(params, env, reader)?;
    let (profile, _) = selected_profile(params, env);
    Ok(ResolvedConfig {
        region,
        profile,
        credentials,
    })
}

pub fn resolve_region(
    params: &ConfigParams,
    env: &Env,
    reader: &dyn ProfileFileReader,
) -> Result<String, ConfigError> {
    if let Some(region) = &params.region {
        validate_region(region)?;
        debug!(region = %region, source = "params", "resolved region");
        return Ok(region.clone());
    }

    for var in REGION_ENV_VARS {
        if let Some(region) = env.get(var) {
            debug!(region = %region, source = var, "resolved region");
            return Ok(region.to_string());
        }
    }

    if let Some(region) = region_from_config_file(params, env, reader)? {
        debug!(region = %region, source = "config file", "resolved region");
        return Ok(region);
    }

    Err(ConfigError::MissingRegion)
}

pub fn resolve_credentials(
    params: &ConfigParams,
    env: &Env,
    reader: &dyn ProfileFileReader,
) -> Result<Credentials, ConfigError> {
    if let (Some(id), Some(secret)) = (&params.access_key_id, &params.secret_access_key) {
        debug!(source = "params", "resolved credentials");
        return Ok(Credentials {
            access_key_id: id.clone(),
            secret_access_key: copy_secret(secret),
            session_token: params.session_token.as_ref().map(copy_secret),
        });
    }

    let env_keys = (env.get("AWS_ACCESS_KEY_ID"), env.get("AWS_SECRET_ACCESS_KEY"));
    if let (Some(id), Some(secret)) = env_keys {
        debug!(source = "env", "resolved credentials");
        return Ok(Credentials::new(
            id,
            secret,
            env.get("AWS_SESSION_TOKEN").map(str::to_string),
        ));
    }

    if let Some(credentials) = credentials_from_file(params, env, reader) {
        debug!(source = "credentials file", "resolved credentials");
        return Ok(credentials);
    }

    Err(ConfigError::MissingCredentials)
}

/// Profile name and whether it was explicitly requested.
fn selected_profile(params: &ConfigParams, env: &Env) -> (String, bool) {
    if let Some(p) = params.profile.as_deref().filter(|p| !p.is_empty()) {
        return (p.to_string(), true);
    }
    if let Some(p) = env.get("AWS_PROFILE") {
        return (p.to_string(), true);
    }
    (DEFAULT_PROFILE.to_string(), false)
}

fn config_file_path(params: &ConfigParams, env: &Env) -> Option<PathBuf> {
    if let Some(path) = &params.config_file {
        return Some(path.clone());
    }
    if let Some(path) = env.get("AWS_CONFIG_FILE") {
        return Some(PathBuf::from(path));
    }
    if env.is_truthy("AWS_SDK_LOAD_CONFIG") {
        return env.home().map(|h| h.join(".aws").join("config"));
    }
    None
}

fn credentials_file_path(params: &ConfigParams, env: &Env) -> Option<PathBuf> {
    if let Some(path) = &params.credentials_file {
        return Some(path.clone());
    }
    if let Some(path) = env.get("AWS_SHARED_CREDENTIALS_FILE") {
        return Some(PathBuf::from(path));
    }
    env.home().map(|h| h.join(".aws").join("credentials"))
}

fn region_from_config_file(
    params: &ConfigParams,
    env: &Env,
    reader: &dyn ProfileFileReader,
) -> Result<Option<String>, ConfigError> {
    if env.in_managed_runtime() {
        debug!("managed runtime detected, skipping config file");
        return Ok(None);
    }
    let Some(path) = config_file_path(params, env) else {
        return Ok(None);
    };
    let Some(contents) = reader.read(&path) else {
        debug!(path = %path.display(), "config file not found");
        return Ok(None);
    };

    let file = ProfileFile::parse(&contents);
    let (profile, explicit) = selected_profile(params, env);
    match file.profile(&profile) {
        Some(_) => Ok(file.get(&profile, "region").map(str::to_string)),
        None if explicit => Err(ConfigError::ProfileNotFound(profile)),
        None => Ok(None),
    }
}

fn credentials_from_file(
    params: &ConfigParams,
    env: &Env,
    reader: &dyn ProfileFileReader,
) -> Option<Credentials> {
    if env.in_managed_runtime() {
        return None;
    }
    let path = credentials_file_path(params, env)?;
    let file = ProfileFile::parse(&reader.read(&path)?);
    let (profile, _) = selected_profile(params, env);
    let id = file.get(&profile, "aws_access_key_id")?;
    let secret = file.get(&profile, "aws_secret_access_key")?;
    Some(Credentials::new(
        id,
        secret,
        file.get(&profile, "aws_session_token").map(str::to_string),
    ))
}
