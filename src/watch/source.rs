use std::path::PathBuf;
use std::time::Duration;

use notify::{Config, PollWatcher, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::ObserverKind;
use crate::error::{Error, Result};

use super::event::ChangeEvent;

/// Owns the filesystem watcher thread. Dropping it stops watching and closes the event
/// channel.
pub struct WatchSource {
    _watcher: Box<dyn Watcher + Send>,
    kind: ObserverKind,
    roots: Vec<PathBuf>,
}

impl std::fmt::Debug for WatchSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchSource")
            .field("kind", &self.kind)
            .field("roots", &self.roots)
            .finish_non_exhaustive()
    }
}

impl WatchSource {
    /// Starts watching every root recursively and forwards change events to `events`.
    ///
    /// A root that cannot be watched is logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Watcher`] if the watcher backend itself cannot be created.
    pub fn start(
        kind: ObserverKind,
        poll_interval: Duration,
        roots: &[PathBuf],
        events: mpsc::Sender<ChangeEvent>,
    ) -> Result<Self> {
        let handler = move |res: notify::Result<notify::Event>| match res {
            Ok(event) => {
                for change in ChangeEvent::from_notify(event) {
                    // Runs on the watcher thread, outside the tokio runtime.
                    if events.blocking_send(change).is_err() {
                        log::debug!("Event receiver dropped, discarding change");
                        return;
                    }
                }
            }
            Err(err) => log::error!("Watch error: {}", err),
        };

        let mut watcher: Box<dyn Watcher + Send> = match kind {
            ObserverKind::Native => Box::new(
                RecommendedWatcher::new(handler, Config::default())
                    .map_err(|source| Error::Watcher { kind, source })?,
            ),
            ObserverKind::Polling => Box::new(
                PollWatcher::new(handler, Config::default().with_poll_interval(poll_interval))
                    .map_err(|source| Error::Watcher { kind, source })?,
            ),
        };

        let mut watched = Vec::with_capacity(roots.len());
        for root in roots {
            match watcher.watch(root, RecursiveMode::Recursive) {
                Ok(()) => {
                    log::info!("Watching {} ({:?})", root.display(), kind);
                    watched.push(root.clone());
                }
                Err(err) => log::error!("Failed to watch {}: {}", root.display(), err),
            }
        }
        if watched.is_empty() {
            log::warn!("None of the watch directories could be watched");
        }

        Ok(Self {
            _watcher: watcher,
            kind,
            roots: watched,
        })
    }

    /// Roots that are actually being watched.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}
