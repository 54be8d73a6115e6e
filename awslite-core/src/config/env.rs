use std::collections::BTreeMap;
use std::path::PathBuf;

/// Set inside AWS Lambda; disables every on-disk config lookup.
pub const MANAGED_RUNTIME_MARKER: &str = "AWS_LAMBDA_FUNCTION_NAME";

/// Snapshot of the environment the resolver reads from.
///
/// Taken once by the caller; resolution never touches the live process environment.
#[derive(Debug, Clone, Default)]
pub struct Env {
    vars: BTreeMap<String, String>,
    home: Option<PathBuf>,
}

impl Env {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
            home: dirs::home_dir(),
        }
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    /// Non-empty value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn is_truthy(&self, key: &str) -> bool {
        self.get(key)
            .is_some_and(|v| !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "no"))
    }

    pub fn home(&self) -> Option<&PathBuf> {
        self.home.as_ref()
    }

    pub fn in_managed_runtime(&self) -> bool {
        self.get(MANAGED_RUNTIME_MARKER).is_some()
    }
}
