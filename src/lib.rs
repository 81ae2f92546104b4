//! Site configuration resolver.
//!
//! Merges a user's `site.config.yaml` onto typed defaults, resolves
//! placeholders, writes `site.data.json`, and publishes the result for the
//! presentation layer, optionally reloading on change.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod store;
