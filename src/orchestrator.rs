//! Resolution cycles and hot reload.
//!
//! A cycle is Load -> Merge -> Resolve -> Persist -> Publish. The startup
//! cycle runs inside [`Orchestrator::start`] and is the only place where a
//! broken defaults source is fatal. In development mode the orchestrator
//! then watches its inputs and runs one cycle per change event. Cycles are
//! serialized: the watch loop handles one event at a time and `run_cycle`
//! holds a lock for its whole duration.

use crate::config::{
    ConfigChangeEvent, LoadedOverride, OverrideStatus, PlaceholderResolver, ResolvedConfig,
    ShapeConflict, SitePaths, WatchPaths, WatcherConfig, deep_merge_reporting, load_override,
    persist, start_config_watcher,
};
use crate::error::ConfigResult;
use crate::store::{ConfigStore, ConfigUpdate};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Whether inputs are watched after the startup cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Exactly one cycle, no watching.
    #[default]
    Production,
    /// Startup cycle, then one cycle per input change.
    Development,
}

impl RunMode {
    pub fn is_dev(&self) -> bool {
        matches!(self, RunMode::Development)
    }
}

/// Orchestrator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Resolving,
    /// Idle, with the input watcher running.
    Watching,
}

/// Atomic cell holding a [`CycleState`].
struct StateCell(AtomicU8);

impl StateCell {
    fn new(state: CycleState) -> Self {
        Self(AtomicU8::new(state_to_u8(state)))
    }

    fn get(&self) -> CycleState {
        u8_to_state(self.0.load(Ordering::Acquire))
    }

    fn set(&self, state: CycleState) {
        self.0.store(state_to_u8(state), Ordering::Release);
    }
}

fn state_to_u8(state: CycleState) -> u8 {
    match state {
        CycleState::Idle => 0,
        CycleState::Resolving => 1,
        CycleState::Watching => 2,
    }
}

fn u8_to_state(val: u8) -> CycleState {
    match val {
        1 => CycleState::Resolving,
        2 => CycleState::Watching,
        _ => CycleState::Idle,
    }
}

/// Output of Load -> Merge -> Resolve, before anything is written.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub config: ResolvedConfig,
    pub override_status: OverrideStatus,
    pub conflicts: Vec<ShapeConflict>,
}

/// Run Load -> Merge -> Resolve for `paths`.
///
/// Fails only when the defaults cannot be established.
pub fn resolve_site(paths: &SitePaths, resolver: &PlaceholderResolver) -> ConfigResult<Resolution> {
    let defaults = paths.defaults.load_tree()?;
    let LoadedOverride { value, status, .. } = load_override(&paths.override_file());

    let (merged, conflicts) = deep_merge_reporting(defaults, value);
    for conflict in &conflicts {
        warn!(conflict = %conflict, "Override value rejected");
    }

    let resolved = resolver.resolve(&merged, &merged);
    Ok(Resolution {
        config: ResolvedConfig::new(resolved),
        override_status: status,
        conflicts,
    })
}

/// Summary of one completed cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub generation: u64,
    pub override_status: OverrideStatus,
    pub conflicts: usize,
    /// False if the artifact could not be written.
    pub persisted: bool,
    pub duration: Duration,
}

impl CycleReport {
    pub fn duration_ms(&self) -> f64 {
        self.duration.as_secs_f64() * 1000.0
    }
}

/// Owner of the artifact path and the published configuration.
pub struct Orchestrator {
    paths: SitePaths,
    mode: RunMode,
    /// Fixed `{year}` value; the local clock is used when unset.
    year: Option<i32>,
    store: Arc<ConfigStore>,
    state: StateCell,
    watching: AtomicBool,
    cycle_lock: Mutex<()>,
    initial: CycleReport,
}

impl Orchestrator {
    /// Run the startup cycle and publish its result.
    pub fn start(paths: SitePaths, mode: RunMode) -> ConfigResult<Self> {
        Self::start_inner(paths, mode, None)
    }

    /// Like [`Orchestrator::start`], with `{year}` pinned to `year`.
    pub fn start_at_year(paths: SitePaths, mode: RunMode, year: i32) -> ConfigResult<Self> {
        Self::start_inner(paths, mode, Some(year))
    }

    fn start_inner(paths: SitePaths, mode: RunMode, year: Option<i32>) -> ConfigResult<Self> {
        let start = Instant::now();
        let resolver = resolver_for(year);

        let resolution = resolve_site(&paths, &resolver)?;
        let persisted = persist_logged(&resolution.config, &paths);
        let store = Arc::new(ConfigStore::new(resolution.config));

        let initial = CycleReport {
            generation: store.generation(),
            override_status: resolution.override_status,
            conflicts: resolution.conflicts.len(),
            persisted,
            duration: start.elapsed(),
        };

        let duration_ms = initial.duration_ms();
        if mode.is_dev() {
            info!(
                override_status = %initial.override_status,
                duration_ms,
                "Site config loaded ({:.2} ms)",
                duration_ms
            );
        } else {
            debug!(
                override_status = %initial.override_status,
                duration_ms,
                "Site config loaded ({:.2} ms)",
                duration_ms
            );
        }

        Ok(Self {
            paths,
            mode,
            year,
            store,
            state: StateCell::new(CycleState::Idle),
            watching: AtomicBool::new(false),
            cycle_lock: Mutex::new(()),
            initial,
        })
    }

    /// Shared handle to the published configuration.
    pub fn store(&self) -> Arc<ConfigStore> {
        Arc::clone(&self.store)
    }

    /// The latest published configuration.
    pub fn current(&self) -> Arc<ResolvedConfig> {
        self.store.snapshot()
    }

    pub fn state(&self) -> CycleState {
        self.state.get()
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    pub fn paths(&self) -> &SitePaths {
        &self.paths
    }

    /// Report of the startup cycle.
    pub fn initial_report(&self) -> &CycleReport {
        &self.initial
    }

    /// Run a full cycle and re-publish.
    ///
    /// On error nothing is published and the previous snapshot stays current.
    /// In development mode a successful cycle notifies subscribers.
    pub fn run_cycle(&self, changed: Vec<PathBuf>) -> ConfigResult<CycleReport> {
        let _guard = self
            .cycle_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let start = Instant::now();
        self.state.set(CycleState::Resolving);

        let result = resolve_site(&self.paths, &resolver_for(self.year));
        let resolution = match result {
            Ok(resolution) => resolution,
            Err(e) => {
                self.state.set(self.resting_state());
                return Err(e);
            }
        };

        let persisted = persist_logged(&resolution.config, &self.paths);
        let generation = self.store.publish(resolution.config);
        let duration = start.elapsed();

        if self.mode.is_dev() {
            self.store.notify(ConfigUpdate {
                generation,
                changed,
                duration,
            });
        }
        self.state.set(self.resting_state());

        Ok(CycleReport {
            generation,
            override_status: resolution.override_status,
            conflicts: resolution.conflicts.len(),
            persisted,
            duration,
        })
    }

    /// React to a watcher event. Errors are logged, never propagated.
    pub fn handle_event(&self, event: ConfigChangeEvent) -> Option<CycleReport> {
        if !event.requires_reload() {
            warn!("Config watcher reported an error: {:?}", event);
            return None;
        }

        let changed: Vec<PathBuf> = event
            .affected_paths()
            .into_iter()
            .map(|p| p.to_path_buf())
            .collect();
        for path in &changed {
            info!(path = %path.display(), "Config change detected");
        }

        match self.run_cycle(changed) {
            Ok(report) => {
                let duration_ms = report.duration_ms();
                info!(
                    generation = report.generation,
                    duration_ms,
                    "Site config hot-reloaded ({:.2} ms)",
                    duration_ms
                );
                Some(report)
            }
            Err(e) => {
                error!(error = %e, "Reload failed, keeping previous configuration");
                None
            }
        }
    }

    /// Start watching the inputs and reloading on change.
    ///
    /// Returns `None` in production mode, where no watching occurs.
    /// Must be called from within a tokio runtime.
    pub fn spawn_watcher(
        self: &Arc<Self>,
        config: WatcherConfig,
    ) -> ConfigResult<Option<JoinHandle<()>>> {
        if !self.mode.is_dev() {
            debug!("Production mode, config watching disabled");
            return Ok(None);
        }

        let watch_paths = WatchPaths {
            override_file: self.paths.override_file(),
            defaults_file: self.paths.defaults_file().map(|p| p.to_path_buf()),
        };
        if watch_paths.defaults_file.is_none() {
            debug!("Defaults are built in; only the override document is watched");
        }

        let mut handle = start_config_watcher(watch_paths, config)?;
        self.watching.store(true, Ordering::Release);
        if self.state.get() == CycleState::Idle {
            self.state.set(CycleState::Watching);
        }
        info!("Config file watcher started for hot-reload");

        let orchestrator = Arc::clone(self);
        let task = tokio::spawn(async move {
            while let Some(event) = handle.wait_for_change().await {
                orchestrator.handle_event(event);
            }
            info!("Config file watcher stopped");
            orchestrator.watching.store(false, Ordering::Release);
            orchestrator.state.set(CycleState::Idle);
        });
        Ok(Some(task))
    }

    fn resting_state(&self) -> CycleState {
        if self.watching.load(Ordering::Acquire) {
            CycleState::Watching
        } else {
            CycleState::Idle
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("paths", &self.paths)
            .field("mode", &self.mode)
            .field("state", &self.state.get())
            .field("generation", &self.store.generation())
            .finish_non_exhaustive()
    }
}

fn resolver_for(year: Option<i32>) -> PlaceholderResolver {
    year.map(PlaceholderResolver::new)
        .unwrap_or_else(PlaceholderResolver::current)
}

/// Write the artifact, logging failures. Returns whether it was written.
fn persist_logged(config: &ResolvedConfig, paths: &SitePaths) -> bool {
    let artifact = paths.artifact_file();
    match persist(config, &artifact) {
        Ok(_) => true,
        Err(e) => {
            error!(path = %artifact.display(), error = %e, "Failed to write site data artifact");
            false
        }
    }
}
