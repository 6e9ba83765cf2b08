//! Reloadwatch: restarts containers when files in watched directories change.
//!
//! Filesystem events are filtered, mapped to the containers selected by name or label,
//! and coalesced by a debounce timer so a burst of saves causes a single restart.
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc;

use config::ReloadConfig;
use error::{Error, Result};
use reload::{DebounceScheduler, RestartExecutor};
use resolver::TargetResolver;
use watch::{Dispatcher, PathFilter, WatchSource};

pub mod config;
pub mod container;
pub mod docker;
pub mod environment;
pub mod error;
pub mod fsutil;
pub mod mountinfo;
pub mod reload;
pub mod resolver;
pub mod watch;

const EVENT_BUFFER: usize = 256;
const HOSTNAME_FILE: &str = "/etc/hostname";
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Runs the reloader until SIGINT or SIGTERM.
///
/// # Errors
///
/// Only startup problems are fatal:
/// - invalid or incomplete configuration,
/// - no directory to watch,
/// - the watcher backend cannot be created,
/// - signal handlers cannot be installed.
pub async fn run() -> Result<()> {
    let config = ReloadConfig::from_env()?;
    log::debug!("Configuration: {:?}", config);

    let runtime = Arc::new(docker::Client::new(config.docker_socket.clone()));

    let self_container = if config.watch_dirs.is_empty() {
        let env = environment::detect_runtime_environment();
        log::debug!("Runtime environment: {:?}", env);
        resolver::identify_self_container(
            config.self_container.as_deref(),
            &env,
            Path::new(HOSTNAME_FILE),
        )
    } else {
        config.self_container.clone()
    };

    let resolver = TargetResolver::from_config(Arc::clone(&runtime), &config, self_container);
    let roots = resolver.resolve_watch_roots().await?;
    let filter = PathFilter::from_config(&config)?;
    log::info!(
        "Watching {:?} for {} ({} selector(s), delay {:?})",
        roots,
        config.patterns.join(","),
        resolver.selectors().len(),
        config.delay
    );

    let scheduler = DebounceScheduler::new(
        RestartExecutor::new(Arc::clone(&runtime), config.restart_timeout),
        config.delay,
    );

    let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
    let dispatcher = Dispatcher::new(filter, resolver, scheduler.clone()).spawn(events_rx);
    let source = WatchSource::start(config.observer, config.poll_interval, &roots, events_tx)?;
    if source.roots().len() < roots.len() {
        log::warn!(
            "Only {} of {} directories are watched",
            source.roots().len(),
            roots.len()
        );
    }

    let waited = wait_for_shutdown().await;
    log::info!("Shutting down");

    drop(source);
    dispatcher.shutdown(SHUTDOWN_GRACE).await;
    if scheduler.cancel() {
        log::info!("Pending reload abandoned");
    }
    waited
}

async fn wait_for_shutdown() -> Result<()> {
    let mut terminate = signal(SignalKind::terminate()).map_err(Error::Signal)?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => res.map_err(Error::Signal),
        _ = terminate.recv() => Ok(()),
    }
}
