use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;

/// Source of profile file contents. `None` means the file is not available.
pub trait ProfileFileReader: Send + Sync {
    fn read(&self, path: &Path) -> Option<String>;
}

/// Reads profile files from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsProfileReader;

impl ProfileFileReader for FsProfileReader {
    fn read(&self, path: &Path) -> Option<String> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Some(contents),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "profile file unreadable");
                None
            }
        }
    }
}

/// Parsed INI-style profile file (`~/.aws/config` or `~/.aws/credentials`).
///
/// Sections may be written `[name]` or `[profile name]`; both map to `name`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileFile {
    profiles: BTreeMap<String, BTreeMap<String, String>>,
}

impl ProfileFile {
    pub fn parse(contents: &str) -> Self {
        let mut profiles: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        let mut current: Option<String> = None;

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                let header = header.trim();
                let name = header
                    .strip_prefix("profile ")
                    .map(str::trim)
                    .unwrap_or(header)
                    .to_string();
                profiles.entry(name.clone()).or_default();
                current = Some(name);
                continue;
            }
            // Keys outside any section are ignored.
            let (Some(section), Some((key, value))) = (&current, line.split_once('=')) else {
                continue;
            };
            if let Some(props) = profiles.get_mut(section) {
                props.insert(key.trim().to_string(), value.trim().to_string());
            }
        }

        Self { profiles }
    }

    pub fn profile(&self, name: &str) -> Option<&BTreeMap<String, String>> {
        self.profiles.get(name)
    }

    pub fn get(&self, profile: &str, key: &str) -> Option<&str> {
        self.profile(profile)
            .and_then(|p| p.get(key))
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}
