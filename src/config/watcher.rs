//! File watcher for the configuration inputs.
//!
//! Watches for changes to:
//! - the user override document (`site.config.yaml`)
//! - the defaults file, when defaults are not built in
//!
//! The parent directories are watched rather than the files themselves, so
//! a document that does not exist yet, or that an editor replaces by
//! rename, is still picked up. Emits events through a tokio watch channel;
//! the channel keeps only the newest event, which coalesces changes that
//! arrive while a reload is running.

use notify::RecommendedWatcher;
use notify_debouncer_mini::{DebouncedEvent, DebouncedEventKind, Debouncer, new_debouncer};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Event types emitted when configuration inputs change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigChangeEvent {
    /// The override document was created, modified or removed
    OverrideChanged(PathBuf),
    /// The defaults file changed
    DefaultsChanged(PathBuf),
    /// Both inputs changed in quick succession
    BatchChange(Vec<PathBuf>),
    /// Watcher encountered an error
    Error(String),
}

impl ConfigChangeEvent {
    /// Returns true if this event requires a config reload.
    pub fn requires_reload(&self) -> bool {
        !matches!(self, ConfigChangeEvent::Error(_))
    }

    /// Get the affected paths for this event.
    pub fn affected_paths(&self) -> Vec<&Path> {
        match self {
            ConfigChangeEvent::OverrideChanged(p) => vec![p.as_path()],
            ConfigChangeEvent::DefaultsChanged(p) => vec![p.as_path()],
            ConfigChangeEvent::BatchChange(paths) => paths.iter().map(|p| p.as_path()).collect(),
            ConfigChangeEvent::Error(_) => vec![],
        }
    }
}

/// Configuration for the file watcher.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Debounce duration for coalescing rapid changes.
    pub debounce_duration: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce_duration: Duration::from_millis(300),
        }
    }
}

/// Files to watch for configuration changes.
#[derive(Debug, Clone)]
pub struct WatchPaths {
    /// The user override document
    pub override_file: PathBuf,
    /// The defaults file, if defaults are file-backed
    pub defaults_file: Option<PathBuf>,
}

impl WatchPaths {
    fn files(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.override_file.as_path()).chain(self.defaults_file.as_deref())
    }
}

/// Handle to control the config watcher.
pub struct ConfigWatcherHandle {
    /// Receiver for config change events.
    pub events: watch::Receiver<Option<ConfigChangeEvent>>,
    /// The debouncer; dropping it closes the notify channel, which ends the
    /// event processing task.
    _debouncer: Debouncer<RecommendedWatcher>,
    _task_handle: tokio::task::JoinHandle<()>,
}

impl ConfigWatcherHandle {
    /// Wait for the next config change event.
    pub async fn wait_for_change(&mut self) -> Option<ConfigChangeEvent> {
        // Skip the initial None value
        loop {
            if self.events.changed().await.is_err() {
                return None; // Sender dropped
            }
            let event = self.events.borrow_and_update().clone();
            if event.is_some() {
                return event;
            }
        }
    }
}

/// Starts the configuration file watcher.
///
/// Must be called from within a tokio runtime. Watching stops when the
/// returned handle is dropped.
pub fn start_config_watcher(
    paths: WatchPaths,
    config: WatcherConfig,
) -> Result<ConfigWatcherHandle, notify::Error> {
    let (event_tx, event_rx) = watch::channel(None);
    let (notify_tx, notify_rx) = mpsc::channel();

    let mut debouncer = new_debouncer(config.debounce_duration, notify_tx)?;
    let watcher = debouncer.watcher();

    let mut watched_dirs: Vec<PathBuf> = Vec::new();
    for file in paths.files() {
        let dir = watch_dir(file);
        if watched_dirs.contains(&dir) {
            continue;
        }
        if dir.exists() {
            info!("Watching {} in {}", file_label(file), dir.display());
            watcher.watch(&dir, notify::RecursiveMode::NonRecursive)?;
            watched_dirs.push(dir);
        } else {
            warn!(
                "Directory does not exist, skipping watch: {}",
                dir.display()
            );
        }
    }

    let task_handle = tokio::task::spawn_blocking(move || {
        process_notify_events(notify_rx, event_tx, &paths);
    });

    Ok(ConfigWatcherHandle {
        events: event_rx,
        _debouncer: debouncer,
        _task_handle: task_handle,
    })
}

/// Process events from the notify debouncer and convert to ConfigChangeEvents.
fn process_notify_events(
    rx: mpsc::Receiver<Result<Vec<DebouncedEvent>, notify::Error>>,
    tx: watch::Sender<Option<ConfigChangeEvent>>,
    paths: &WatchPaths,
) {
    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                if let Some(event) = classify_events(events, paths) {
                    debug!("Config change detected: {:?}", event);
                    if tx.send(Some(event)).is_err() {
                        info!("Config watcher receiver dropped, stopping");
                        return;
                    }
                }
            }
            Ok(Err(e)) => {
                error!("File watcher error: {}", e);
                let _ = tx.send(Some(ConfigChangeEvent::Error(e.to_string())));
            }
            Err(_) => {
                info!("Config watcher channel closed, stopping");
                return;
            }
        }
    }
}

/// Classify one debounced batch into at most one ConfigChangeEvent.
fn classify_events(events: Vec<DebouncedEvent>, paths: &WatchPaths) -> Option<ConfigChangeEvent> {
    let mut classified: Vec<ConfigChangeEvent> = Vec::new();

    for event in events {
        if !matches!(
            event.kind,
            DebouncedEventKind::Any | DebouncedEventKind::AnyContinuous
        ) {
            continue;
        }
        if let Some(change) = classify_path(&event.path, paths)
            && !classified.contains(&change)
        {
            classified.push(change);
        }
    }

    if classified.len() > 1 {
        let changed = classified
            .iter()
            .flat_map(|e| e.affected_paths())
            .map(Path::to_path_buf)
            .collect();
        Some(ConfigChangeEvent::BatchChange(changed))
    } else {
        classified.pop()
    }
}

/// Classify a single path into a ConfigChangeEvent.
fn classify_path(path: &Path, paths: &WatchPaths) -> Option<ConfigChangeEvent> {
    if same_file(path, &paths.override_file) {
        return Some(ConfigChangeEvent::OverrideChanged(paths.override_file.clone()));
    }
    if let Some(ref defaults) = paths.defaults_file
        && same_file(path, defaults)
    {
        return Some(ConfigChangeEvent::DefaultsChanged(defaults.clone()));
    }
    None
}

/// Compare by file name and canonical parent, since either path may be
/// relative and the file itself may no longer exist.
fn same_file(event_path: &Path, watched: &Path) -> bool {
    if event_path.file_name() != watched.file_name() {
        return false;
    }
    watch_dir(event_path) == watch_dir(watched)
}

/// Canonical parent directory of `file`.
fn watch_dir(file: &Path) -> PathBuf {
    let parent = match file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    canonical_or_self(parent)
}

fn canonical_or_self(dir: &Path) -> PathBuf {
    std::fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf())
}

fn file_label(file: &Path) -> String {
    file.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string())
}
