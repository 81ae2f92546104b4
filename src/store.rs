//! Process-wide published configuration.
//!
//! A single writer (the orchestrator) replaces the current snapshot with an
//! atomic pointer swap; readers load an `Arc<ResolvedConfig>` and keep it as
//! long as they like. Consumers that want to refresh on change subscribe to
//! a watch channel carrying the latest [`ConfigUpdate`].

use crate::config::ResolvedConfig;
use arc_swap::ArcSwap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;

/// Notification sent after a configuration was re-published.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigUpdate {
    /// Generation of the snapshot now published.
    pub generation: u64,
    /// Files whose change triggered the reload.
    pub changed: Vec<PathBuf>,
    /// How long the cycle took.
    pub duration: Duration,
}

/// Holder of the latest resolved configuration.
pub struct ConfigStore {
    current: ArcSwap<ResolvedConfig>,
    generation: AtomicU64,
    updates: watch::Sender<Option<ConfigUpdate>>,
}

impl ConfigStore {
    /// Create a store holding `initial` as generation 1.
    pub fn new(initial: ResolvedConfig) -> Self {
        let (updates, _) = watch::channel(None);
        Self {
            current: ArcSwap::from_pointee(initial),
            generation: AtomicU64::new(1),
            updates,
        }
    }

    /// The latest published configuration.
    pub fn snapshot(&self) -> Arc<ResolvedConfig> {
        self.current.load_full()
    }

    /// Generation of the latest published configuration.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Replace the published configuration. Returns the new generation.
    pub fn publish(&self, config: ResolvedConfig) -> u64 {
        self.current.store(Arc::new(config));
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Emit a change notification to subscribers.
    pub fn notify(&self, update: ConfigUpdate) {
        self.updates.send_replace(Some(update));
    }

    /// Subscribe to change notifications.
    ///
    /// Only notifications sent after subscribing are observed as changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<ConfigUpdate>> {
        self.updates.subscribe()
    }
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("generation", &self.generation())
            .finish_non_exhaustive()
    }
}
