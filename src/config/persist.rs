//! Artifact persistence.
//!
//! The resolved configuration is written as pretty JSON for consumers that
//! read it at startup. Writes go to a sibling temp file that is renamed over
//! the artifact, so a reader sees either the old or the new content.

use super::types::ResolvedConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::Path;
use tracing::debug;

/// Write `config` to `path`, replacing any previous artifact.
///
/// Returns the number of bytes written.
pub fn persist(config: &ResolvedConfig, path: &Path) -> ConfigResult<usize> {
    let content = config.to_pretty_json()?;
    write_atomic(path, content.as_bytes())?;
    debug!(path = %path.display(), bytes = content.len(), "Artifact written");
    Ok(content.len())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> ConfigResult<()> {
    let persist_err = |source: std::io::Error| ConfigError::Persist {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(persist_err)?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    std::fs::write(&tmp_path, bytes).map_err(persist_err)?;
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(persist_err(e));
    }
    Ok(())
}
