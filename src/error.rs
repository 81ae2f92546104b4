//! Error types for the configuration pipeline.
//!
//! Only a few conditions surface as errors at all: the loader swallows
//! missing and malformed override documents, and unresolvable placeholders
//! are left in place. What remains is the defaults source failing (fatal at
//! startup), the artifact write failing (logged by the orchestrator), and
//! the file watcher failing to start.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the configuration pipeline.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The defaults file could not be read.
    #[error("failed to read defaults file {path}: {source}")]
    DefaultsUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The defaults file is not a complete site configuration.
    #[error("defaults file {path} is not a complete site configuration: {source}")]
    DefaultsInvalid {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The typed defaults could not be converted into a value tree.
    #[error("failed to convert default configuration to a value tree: {0}")]
    DefaultsTree(#[source] serde_json::Error),

    /// The resolved configuration could not be serialized.
    #[error("failed to serialize resolved configuration: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Writing the artifact failed.
    #[error("failed to write artifact {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file watcher could not be started.
    #[error("failed to start config watcher: {0}")]
    Watch(#[from] notify::Error),
}

impl ConfigError {
    /// Returns true if this error means no baseline configuration exists.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ConfigError::DefaultsUnreadable { .. }
                | ConfigError::DefaultsInvalid { .. }
                | ConfigError::DefaultsTree(_)
        )
    }
}

/// Result type for pipeline operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_errors_are_fatal() {
        let err = ConfigError::DefaultsUnreadable {
            path: PathBuf::from("defaults.yaml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.is_fatal());
        assert!(err.to_string().contains("defaults.yaml"));
    }

    #[test]
    fn test_persist_error_is_not_fatal() {
        let err = ConfigError::Persist {
            path: PathBuf::from("build/site.data.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("site.data.json"));
    }
}
