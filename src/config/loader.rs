//! Override document loading.
//!
//! The user document is optional and untrusted: a missing, unreadable or
//! malformed file degrades to an empty override so the site still resolves
//! to the full defaults.

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// How the override document was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideStatus {
    /// No file at the override path.
    Missing,
    /// File parsed into a mapping.
    Loaded,
    /// File exists but could not be read.
    Unreadable(String),
    /// File was read but is not a YAML mapping.
    Malformed(String),
}

impl OverrideStatus {
    /// Returns true if the document contributed to the result.
    pub fn is_loaded(&self) -> bool {
        matches!(self, OverrideStatus::Loaded)
    }
}

impl std::fmt::Display for OverrideStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverrideStatus::Missing => write!(f, "missing"),
            OverrideStatus::Loaded => write!(f, "loaded"),
            OverrideStatus::Unreadable(reason) => write!(f, "unreadable ({})", reason),
            OverrideStatus::Malformed(reason) => write!(f, "malformed ({})", reason),
        }
    }
}

/// A loaded override tree. `value` is always a mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedOverride {
    pub value: Value,
    pub status: OverrideStatus,
    pub path: PathBuf,
}

impl LoadedOverride {
    fn empty(path: &Path, status: OverrideStatus) -> Self {
        Self {
            value: Value::Object(Map::new()),
            status,
            path: path.to_path_buf(),
        }
    }
}

/// Load the override document at `path`. Never fails.
pub fn load_override(path: &Path) -> LoadedOverride {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No override document, using defaults only");
            return LoadedOverride::empty(path, OverrideStatus::Missing);
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cannot read override document, using defaults only");
            return LoadedOverride::empty(path, OverrideStatus::Unreadable(e.to_string()));
        }
    };

    match parse_override(&content) {
        Ok(value) => LoadedOverride {
            value,
            status: OverrideStatus::Loaded,
            path: path.to_path_buf(),
        },
        Err(reason) => {
            warn!(path = %path.display(), error = %reason, "Cannot parse override document, using defaults only");
            LoadedOverride::empty(path, OverrideStatus::Malformed(reason))
        }
    }
}

/// Parse override YAML into a mapping. An empty document is an empty mapping.
pub fn parse_override(content: &str) -> Result<Value, String> {
    let is_blank = content
        .lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with('#'));
    if is_blank {
        return Ok(Value::Object(Map::new()));
    }

    let value: Value = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
    match value {
        Value::Object(_) => Ok(value),
        Value::Null => Ok(Value::Object(Map::new())),
        Value::Bool(_) | Value::Number(_) | Value::String(_) | Value::Array(_) => Err(format!(
            "top level must be a mapping, found {}",
            super::merge::kind_name(&value)
        )),
    }
}
