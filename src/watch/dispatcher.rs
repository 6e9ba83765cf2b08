use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::container::ContainerRuntime;
use crate::error::ResultOkLogExt;
use crate::reload::DebounceScheduler;
use crate::resolver::TargetResolver;

use super::event::ChangeEvent;
use super::filter::PathFilter;

/// Turns filtered change events into reload signals.
#[derive(Debug)]
pub struct Dispatcher<R> {
    filter: PathFilter,
    resolver: TargetResolver<R>,
    scheduler: DebounceScheduler<R>,
}

impl<R: ContainerRuntime> Dispatcher<R> {
    pub fn new(
        filter: PathFilter,
        resolver: TargetResolver<R>,
        scheduler: DebounceScheduler<R>,
    ) -> Self {
        Self {
            filter,
            resolver,
            scheduler,
        }
    }

    /// Handles one event. Returns whether the scheduler was signalled.
    pub async fn on_event(&self, event: &ChangeEvent) -> bool {
        if !self.filter.accepts(event) {
            log::trace!("Ignoring {}", event);
            return false;
        }
        log::info!("Detected {}", event);

        let Some(targets) = self.resolver.resolve_targets().await.ok_log() else {
            log::warn!("Skipping reload for {}", event.path.display());
            return false;
        };
        if targets.is_empty() {
            log::info!("No target container found, reload suppressed");
            return false;
        }
        self.scheduler.signal(targets)
    }

    /// Consumes events until every sender is dropped.
    pub async fn run(self, mut events: mpsc::Receiver<ChangeEvent>) {
        while let Some(event) = events.recv().await {
            self.on_event(&event).await;
        }
        log::debug!("Event channel closed, dispatcher stopped");
    }

    pub fn spawn(self, events: mpsc::Receiver<ChangeEvent>) -> DispatcherTask {
        DispatcherTask {
            handle: tokio::spawn(self.run(events)),
        }
    }
}

/// A running [`Dispatcher`].
#[derive(Debug)]
pub struct DispatcherTask {
    handle: JoinHandle<()>,
}

impl DispatcherTask {
    /// Waits up to `grace` for the dispatcher to drain its channel, then aborts it.
    ///
    /// The channel must already be closed (every sender dropped). A dispatcher stuck on an
    /// unresponsive runtime is aborted with its in-flight resolution.
    ///
    /// Returns whether the dispatcher finished on its own.
    pub async fn shutdown(mut self, grace: Duration) -> bool {
        match tokio::time::timeout(grace, &mut self.handle).await {
            Ok(Ok(())) => true,
            Ok(Err(err)) => {
                log::error!("Dispatcher task failed: {}", err);
                true
            }
            Err(_) => {
                self.handle.abort();
                log::warn!(
                    "Dispatcher did not stop within {:?}, abandoning in-flight work",
                    grace
                );
                false
            }
        }
    }
}
