//! Locations of the pipeline's inputs and outputs.
//!
//! ## Environment Variables
//! - `SITE_CONFIG_ROOT` - Site root holding `site.config.yaml` (default: `.`)
//! - `SITE_CONFIG_BUILD_DIR` - Directory for `site.data.json` (default: `<root>/build`)
//! - `SITE_CONFIG_DEFAULTS` - YAML file replacing the built-in defaults

use super::types::DefaultsSource;
use std::path::{Path, PathBuf};

/// File name of the user override document.
pub const OVERRIDE_FILE_NAME: &str = "site.config.yaml";

/// File name of the generated artifact.
pub const ARTIFACT_FILE_NAME: &str = "site.data.json";

/// Build directory used when none is configured, relative to the root.
pub const DEFAULT_BUILD_DIR: &str = "build";

/// Resolved locations for one site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitePaths {
    pub root: PathBuf,
    pub build_dir: PathBuf,
    pub defaults: DefaultsSource,
}

impl SitePaths {
    /// Paths for `root` with the default build dir and built-in defaults.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            build_dir: root.join(DEFAULT_BUILD_DIR),
            root,
            defaults: DefaultsSource::Builtin,
        }
    }

    /// Discover paths from the environment, with explicit values taking precedence.
    pub fn discover(
        root: Option<PathBuf>,
        build_dir: Option<PathBuf>,
        defaults: Option<PathBuf>,
    ) -> Self {
        let root = root
            .or_else(|| std::env::var("SITE_CONFIG_ROOT").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("."));
        let build_dir = build_dir
            .or_else(|| std::env::var("SITE_CONFIG_BUILD_DIR").ok().map(PathBuf::from));
        let defaults = defaults
            .or_else(|| std::env::var("SITE_CONFIG_DEFAULTS").ok().map(PathBuf::from));

        let mut paths = Self::new(root);
        if let Some(build_dir) = build_dir {
            paths.build_dir = build_dir;
        }
        if let Some(defaults) = defaults {
            paths.defaults = DefaultsSource::File(defaults);
        }
        paths
    }

    pub fn with_build_dir(mut self, build_dir: impl Into<PathBuf>) -> Self {
        self.build_dir = build_dir.into();
        self
    }

    pub fn with_defaults_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.defaults = DefaultsSource::File(path.into());
        self
    }

    /// The user override document.
    pub fn override_file(&self) -> PathBuf {
        self.root.join(OVERRIDE_FILE_NAME)
    }

    /// The generated artifact.
    pub fn artifact_file(&self) -> PathBuf {
        self.build_dir.join(ARTIFACT_FILE_NAME)
    }

    /// The defaults file, when defaults are not built in.
    pub fn defaults_file(&self) -> Option<&Path> {
        self.defaults.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let paths = SitePaths::new("/srv/site");
        assert_eq!(paths.override_file(), PathBuf::from("/srv/site/site.config.yaml"));
        assert_eq!(
            paths.artifact_file(),
            PathBuf::from("/srv/site/build/site.data.json")
        );
        assert_eq!(paths.defaults_file(), None);
    }

    #[test]
    fn test_explicit_values_take_precedence() {
        let paths = SitePaths::discover(
            Some(PathBuf::from("/a")),
            Some(PathBuf::from("/out")),
            Some(PathBuf::from("/a/defaults.yaml")),
        );
        assert_eq!(paths.root, PathBuf::from("/a"));
        assert_eq!(paths.artifact_file(), PathBuf::from("/out/site.data.json"));
        assert_eq!(paths.defaults_file(), Some(Path::new("/a/defaults.yaml")));
    }

    #[test]
    fn test_builders() {
        let paths = SitePaths::new("site")
            .with_build_dir("dist")
            .with_defaults_file("site/defaults.yaml");
        assert_eq!(paths.artifact_file(), PathBuf::from("dist/site.data.json"));
        assert_eq!(
            paths.defaults,
            DefaultsSource::File(PathBuf::from("site/defaults.yaml"))
        );
    }
}
