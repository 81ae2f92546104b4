//! Site configuration pipeline.
//!
//! Resolves the site configuration from two sources:
//! 1. **Defaults** - `SiteConfig::default()`, or a complete YAML file
//! 2. **Override** - `<root>/site.config.yaml`, partial and optional
//!
//! ## Merge Strategy
//! - Mappings: deep merge field-by-field, override wins
//! - Sequences: replaced entirely by the override
//! - Scalars: replaced by the override, including explicit nulls
//!
//! ## Placeholders
//! After merging, string values may reference other values of the merged
//! tree as `{dotted.path}`; `{year}` is the current calendar year.
//!
//! The result is written to `<build-dir>/site.data.json`.

mod loader;
mod merge;
mod paths;
mod persist;
mod placeholders;
mod types;
pub mod watcher;

pub use loader::{LoadedOverride, OverrideStatus, load_override, parse_override};
pub use merge::{ShapeConflict, deep_merge, deep_merge_reporting};
pub use paths::{ARTIFACT_FILE_NAME, DEFAULT_BUILD_DIR, OVERRIDE_FILE_NAME, SitePaths};
pub use persist::persist;
pub use placeholders::{PlaceholderResolver, YEAR_TOKEN, lookup, resolve_placeholders};
pub use types::*;
pub use watcher::{ConfigChangeEvent, WatchPaths, WatcherConfig, start_config_watcher};
