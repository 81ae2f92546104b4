//! site-config
//!
//! Resolves the site configuration, writes the artifact consumed by the
//! presentation layer, and in `dev` mode keeps it up to date as the inputs
//! change.

use anyhow::{Context, Result, bail};
use clap::Parser;
use site_config::cli::{Cli, Command, DevArgs, ShowArgs, ShowFormat};
use site_config::config::{PlaceholderResolver, SiteConfig, SitePaths, WatcherConfig};
use site_config::logging::{self, LogTarget};
use site_config::orchestrator::{Orchestrator, RunMode, resolve_site};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    let paths = SitePaths::discover(cli.root, cli.build_dir, cli.defaults);

    match cli.command.unwrap_or(Command::Build) {
        Command::Build => run_build(paths),
        Command::Dev(args) => run_dev(paths, args).await,
        Command::Show(args) => run_show(&paths, args),
        Command::Defaults => run_defaults(&paths),
    }
}

/// Run the build command: exactly one cycle.
fn run_build(paths: SitePaths) -> Result<()> {
    let orchestrator =
        Orchestrator::start(paths, RunMode::Production).context("cannot establish defaults")?;
    let report = orchestrator.initial_report();
    if !report.persisted {
        bail!(
            "failed to write {}",
            orchestrator.paths().artifact_file().display()
        );
    }
    info!(
        artifact = %orchestrator.paths().artifact_file().display(),
        "Site config written ({:.2} ms)",
        report.duration_ms()
    );
    Ok(())
}

/// Run the dev command: startup cycle, then reload on change until Ctrl-C.
async fn run_dev(paths: SitePaths, args: DevArgs) -> Result<()> {
    let orchestrator = Arc::new(
        Orchestrator::start(paths, RunMode::Development).context("cannot establish defaults")?,
    );

    let watcher_config = WatcherConfig {
        debounce_duration: Duration::from_millis(args.debounce_ms),
    };
    let task = orchestrator
        .spawn_watcher(watcher_config)
        .context("cannot start config watcher")?;

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    if let Some(task) = task {
        task.abort();
    }
    Ok(())
}

/// Run the show command: resolve and print, no artifact.
fn run_show(paths: &SitePaths, args: ShowArgs) -> Result<()> {
    let resolution = resolve_site(paths, &PlaceholderResolver::current())
        .context("cannot establish defaults")?;

    let value = match args.path.as_deref() {
        Some(path) => resolution
            .config
            .get(path)
            .cloned()
            .with_context(|| format!("no value at '{}'", path))?,
        None => resolution.config.into_tree(),
    };

    let output = match args.format {
        ShowFormat::Json => serde_json::to_string_pretty(&value)?,
        ShowFormat::Yaml => serde_yaml::to_string(&value)?,
    };
    println!("{}", output.trim_end());
    Ok(())
}

/// Run the defaults command: print the defaults as a starting override document.
fn run_defaults(paths: &SitePaths) -> Result<()> {
    let defaults = match paths.defaults_file() {
        Some(path) => SiteConfig::load(path)?,
        None => SiteConfig::default(),
    };
    print!("{}", serde_yaml::to_string(&defaults)?);
    Ok(())
}
