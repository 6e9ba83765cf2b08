//! Runtime configuration read from the process environment.
//!
//! All options are plain environment variables so the reloader can be configured from a
//! compose file. See [`ReloadConfig::from_lookup`] for the recognized keys.
use std::path::PathBuf;
use std::time::Duration;

pub const RELOAD_DIR: &str = "RELOAD_DIR";
pub const RELOAD_CONTAINER: &str = "RELOAD_CONTAINER";
pub const RELOAD_LABEL: &str = "RELOAD_LABEL";
pub const RELOAD_DELAY: &str = "RELOAD_DELAY";
pub const RESTART_TIMEOUT: &str = "RESTART_TIMEOUT";
pub const MUST_RUN: &str = "MUST_RUN";
pub const OBSERVER_TYPE: &str = "OBSERVER_TYPE";
pub const RELOAD_PATTERNS: &str = "RELOAD_PATTERNS";
pub const RELOAD_IGNORE_PATTERNS: &str = "RELOAD_IGNORE_PATTERNS";
pub const RELOAD_DIRECTORIES: &str = "RELOAD_DIRECTORIES";
pub const RELOAD_POLL_INTERVAL: &str = "RELOAD_POLL_INTERVAL";
pub const DOCKER_SOCKET: &str = "DOCKER_SOCKET";
pub const SELF_CONTAINER: &str = "SELF_CONTAINER";

const DEFAULT_DELAY_SECS: f64 = 1.5;
const DEFAULT_RESTART_TIMEOUT_SECS: u64 = 10;
const DEFAULT_POLL_INTERVAL_SECS: f64 = 1.0;
pub const DEFAULT_DOCKER_SOCKET: &str = "/var/run/docker.sock";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid value for `{key}`: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
    #[error("no restart target configured; set `RELOAD_CONTAINER` and/or `RELOAD_LABEL`")]
    MissingTarget,
}

pub type Result<T> = std::result::Result<T, Error>;

/// Which filesystem watch backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObserverKind {
    /// inotify/FSEvents/ReadDirectoryChanges, whatever the platform offers.
    #[default]
    Native,
    /// Periodic rescans; needed for bind mounts from hosts that do not forward events
    /// (e.g. Docker Desktop on some platforms).
    Polling,
}

impl std::str::FromStr for ObserverKind {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "native" | "inotify" | "default" | "" => Ok(ObserverKind::Native),
            "polling" | "poll" => Ok(ObserverKind::Polling),
            _ => Err(()),
        }
    }
}

/// Immutable configuration of a reloader process.
#[derive(Debug, Clone, PartialEq)]
pub struct ReloadConfig {
    /// Explicit watch roots. Empty means derive them from the own container's mounts.
    pub watch_dirs: Vec<PathBuf>,
    /// Exact names of containers to restart.
    pub container_names: Vec<String>,
    /// Label selectors (`key` or `key=value`) of containers to restart.
    pub labels: Vec<String>,
    pub delay: Duration,
    pub restart_timeout: Duration,
    /// Restrict label-matched containers to running ones.
    pub must_be_running: bool,
    pub observer: ObserverKind,
    pub poll_interval: Duration,
    pub patterns: Vec<String>,
    pub ignore_patterns: Vec<String>,
    /// React to events on directories, not only files.
    pub match_directories: bool,
    pub docker_socket: PathBuf,
    /// Name or id of the container this process runs in.
    pub self_container: Option<String>,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            watch_dirs: Vec::new(),
            container_names: Vec::new(),
            labels: Vec::new(),
            delay: Duration::from_secs_f64(DEFAULT_DELAY_SECS),
            restart_timeout: Duration::from_secs(DEFAULT_RESTART_TIMEOUT_SECS),
            must_be_running: true,
            observer: ObserverKind::Native,
            poll_interval: Duration::from_secs_f64(DEFAULT_POLL_INTERVAL_SECS),
            patterns: vec!["*".to_owned()],
            ignore_patterns: Vec::new(),
            match_directories: false,
            docker_socket: PathBuf::from(DEFAULT_DOCKER_SOCKET),
            self_container: None,
        }
    }
}

impl ReloadConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// See [`ReloadConfig::from_lookup`].
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated like unset ones.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidValue`] if a numeric, boolean or observer option cannot be parsed,
    ///   or a duration is negative.
    /// - [`Error::MissingTarget`] if neither container names nor labels are configured.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(dirs) = get(RELOAD_DIR) {
            config.watch_dirs = split_list(&dirs).into_iter().map(PathBuf::from).collect();
        }
        if let Some(names) = get(RELOAD_CONTAINER) {
            config.container_names = split_list(&names);
        }
        if let Some(labels) = get(RELOAD_LABEL) {
            config.labels = split_list(&labels);
        }
        if config.container_names.is_empty() && config.labels.is_empty() {
            return Err(Error::MissingTarget);
        }

        if let Some(delay) = get(RELOAD_DELAY) {
            config.delay = parse_seconds(RELOAD_DELAY, &delay)?;
        }
        if let Some(timeout) = get(RESTART_TIMEOUT) {
            let secs = timeout.trim().parse::<u64>().map_err(|_| Error::InvalidValue {
                key: RESTART_TIMEOUT,
                value: timeout.clone(),
                reason: "expected a non-negative integer",
            })?;
            config.restart_timeout = Duration::from_secs(secs);
        }
        if let Some(must_run) = get(MUST_RUN) {
            config.must_be_running = parse_bool(MUST_RUN, &must_run)?;
        }
        if let Some(observer) = get(OBSERVER_TYPE) {
            config.observer = observer.parse().map_err(|_| Error::InvalidValue {
                key: OBSERVER_TYPE,
                value: observer.clone(),
                reason: "expected `native` or `polling`",
            })?;
        }
        if let Some(interval) = get(RELOAD_POLL_INTERVAL) {
            config.poll_interval = parse_seconds(RELOAD_POLL_INTERVAL, &interval)?;
            if config.poll_interval.is_zero() {
                return Err(Error::InvalidValue {
                    key: RELOAD_POLL_INTERVAL,
                    value: interval,
                    reason: "expected a positive number of seconds",
                });
            }
        }
        if let Some(patterns) = get(RELOAD_PATTERNS) {
            config.patterns = split_list(&patterns);
        }
        if let Some(patterns) = get(RELOAD_IGNORE_PATTERNS) {
            config.ignore_patterns = split_list(&patterns);
        }
        if let Some(dirs) = get(RELOAD_DIRECTORIES) {
            config.match_directories = parse_bool(RELOAD_DIRECTORIES, &dirs)?;
        }
        if let Some(socket) = get(DOCKER_SOCKET) {
            config.docker_socket = PathBuf::from(socket.trim());
        }
        config.self_container = get(SELF_CONTAINER).map(|s| s.trim().to_owned());

        Ok(config)
    }
}

/// Splits a comma-separated list, trimming entries and dropping empty ones.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

fn parse_seconds(key: &'static str, raw: &str) -> Result<Duration> {
    let secs = raw.trim().parse::<f64>().map_err(|_| Error::InvalidValue {
        key,
        value: raw.to_owned(),
        reason: "expected a number of seconds",
    })?;
    Duration::try_from_secs_f64(secs).map_err(|_| Error::InvalidValue {
        key,
        value: raw.to_owned(),
        reason: "expected a finite, non-negative number of seconds",
    })
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::InvalidValue {
            key,
            value: raw.to_owned(),
            reason: "expected a boolean",
        }),
    }
}
