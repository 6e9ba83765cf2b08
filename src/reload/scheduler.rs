use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::AbortHandle;
use tokio::time::Instant;

use crate::container::{ContainerRuntime, TargetContainer};

use super::executor::RestartExecutor;

/// A restart waiting for its delay to elapse.
#[derive(Debug)]
struct PendingReload {
    generation: u64,
    targets: Arc<[TargetContainer]>,
    fire_at: Instant,
    timer: AbortHandle,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    pending: Option<PendingReload>,
}

#[derive(Debug)]
struct Inner<R> {
    delay: Duration,
    executor: RestartExecutor<R>,
    slot: Mutex<Slot>,
}

/// Coalesces reload signals into at most one restart per quiet period.
///
/// Every non-empty [`signal`](Self::signal) replaces the pending reload: the old timer is
/// cancelled and a new one fires `delay` after the latest signal, restarting the targets
/// of that latest signal. A reload that already started firing is never interrupted; a
/// signal arriving while it runs arms the next one.
///
/// Cloning yields another handle to the same scheduler.
#[derive(Debug)]
pub struct DebounceScheduler<R> {
    inner: Arc<Inner<R>>,
}

impl<R> Clone for DebounceScheduler<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: ContainerRuntime> DebounceScheduler<R> {
    pub fn new(executor: RestartExecutor<R>, delay: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                delay,
                executor,
                slot: Mutex::new(Slot::default()),
            }),
        }
    }

    pub fn delay(&self) -> Duration {
        self.inner.delay
    }

    /// Schedules a restart of `targets` after the debounce delay.
    ///
    /// An empty target set leaves any pending reload untouched. Must be called from within
    /// a tokio runtime.
    ///
    /// Returns whether a reload was armed.
    pub fn signal(&self, targets: Vec<TargetContainer>) -> bool {
        if targets.is_empty() {
            log::debug!("No target container resolved, nothing to schedule");
            return false;
        }

        let mut slot = self.inner.lock_slot();
        if let Some(previous) = slot.pending.take() {
            previous.timer.abort();
            log::debug!(
                "Superseded pending reload #{} (was due in {:?})",
                previous.generation,
                previous.fire_at.saturating_duration_since(Instant::now())
            );
        }

        slot.generation += 1;
        let generation = slot.generation;
        let fire_at = Instant::now() + self.inner.delay;
        let inner = Arc::clone(&self.inner);
        let timer = tokio::spawn(async move {
            tokio::time::sleep_until(fire_at).await;
            inner.fire(generation).await;
        })
        .abort_handle();

        log::debug!(
            "Armed reload #{} of {} container(s) in {:?}",
            generation,
            targets.len(),
            self.inner.delay
        );
        slot.pending = Some(PendingReload {
            generation,
            targets: targets.into(),
            fire_at,
            timer,
        });
        true
    }

    /// Drops the pending reload, if any, without restarting anything.
    pub fn cancel(&self) -> bool {
        match self.inner.lock_slot().pending.take() {
            Some(pending) => {
                pending.timer.abort();
                log::debug!("Abandoned pending reload #{}", pending.generation);
                true
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.inner.lock_slot().pending.is_some()
    }

    /// When the pending reload fires, if one is armed.
    pub fn fire_at(&self) -> Option<Instant> {
        self.inner.lock_slot().pending.as_ref().map(|p| p.fire_at)
    }

    /// Targets of the pending reload, if one is armed.
    pub fn pending_targets(&self) -> Option<Arc<[TargetContainer]>> {
        self.inner
            .lock_slot()
            .pending
            .as_ref()
            .map(|p| Arc::clone(&p.targets))
    }
}

impl<R: ContainerRuntime> Inner<R> {
    fn lock_slot(&self) -> MutexGuard<'_, Slot> {
        // The slot holds plain data; a panic while it was locked leaves it consistent.
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn fire(&self, generation: u64) {
        let targets = {
            let mut slot = self.lock_slot();
            match slot.pending.take_if(|p| p.generation == generation) {
                Some(pending) => pending.targets,
                None => return,
            }
        };

        log::info!("Reload #{} firing for {} container(s)", generation, targets.len());
        let report = self.executor.execute(&targets).await;
        if report.failed.is_empty() {
            log::debug!("Reload #{} done", generation);
        } else {
            log::warn!(
                "Reload #{} done, {} of {} restart(s) failed",
                generation,
                report.failed.len(),
                targets.len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::mock::MockRuntime;
    use crate::container::{ContainerID, ContainerState};

    const DELAY: Duration = Duration::from_millis(200);

    fn target(id: &str) -> TargetContainer {
        TargetContainer::new(ContainerID::new(id).unwrap(), id, ContainerState::Running)
    }

    fn scheduler(runtime: &Arc<MockRuntime>) -> DebounceScheduler<Arc<MockRuntime>> {
        DebounceScheduler::new(
            RestartExecutor::new(Arc::clone(runtime), Duration::from_secs(10)),
            DELAY,
        )
    }

    fn assert_close(actual: Duration, expected: Duration) {
        let diff = actual.abs_diff(expected);
        assert!(
            diff <= Duration::from_millis(5),
            "expected ~{expected:?}, got {actual:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_signal_fires_after_delay() {
        let runtime = Arc::new(MockRuntime::default());
        let scheduler = scheduler(&runtime);
        let start = Instant::now();

        assert!(scheduler.signal(vec![target("c1")]));
        assert!(scheduler.is_armed());
        assert_eq!(scheduler.fire_at(), Some(start + DELAY));

        tokio::time::sleep(DELAY / 2).await;
        assert!(runtime.attempts().is_empty());

        tokio::time::sleep(DELAY).await;
        let restarts = runtime.restarts();
        assert_eq!(restarts.len(), 1);
        assert_close(restarts[0].1 - start, DELAY);
        assert!(!scheduler.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_coalesces_into_last_targets() {
        let runtime = Arc::new(MockRuntime::default());
        let scheduler = scheduler(&runtime);
        let start = Instant::now();

        scheduler.signal(vec![target("c1")]);
        tokio::time::sleep(Duration::from_millis(50)).await;
        scheduler.signal(vec![target("c1"), target("c2")]);
        tokio::time::sleep(Duration::from_millis(50)).await;
        scheduler.signal(vec![target("c3")]);
        assert_eq!(scheduler.fire_at(), Some(start + Duration::from_millis(100) + DELAY));

        tokio::time::sleep(Duration::from_secs(1)).await;
        let restarts = runtime.restarts();
        assert_eq!(runtime.restarted_ids(), vec!["c3"]);
        assert_close(restarts[0].1 - start, Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_reload_never_runs() {
        let runtime = Arc::new(MockRuntime::default());
        let scheduler = scheduler(&runtime);

        scheduler.signal(vec![target("a")]);
        tokio::time::sleep(DELAY - Duration::from_millis(1)).await;
        scheduler.signal(vec![target("b")]);

        tokio::time::sleep(DELAY * 5).await;
        assert_eq!(runtime.attempts(), vec!["b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_signal_is_noop() {
        let runtime = Arc::new(MockRuntime::default());
        let scheduler = scheduler(&runtime);

        assert!(!scheduler.signal(Vec::new()));
        assert!(!scheduler.is_armed());

        scheduler.signal(vec![target("c1")]);
        let fire_at = scheduler.fire_at();
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!scheduler.signal(Vec::new()));
        assert_eq!(scheduler.fire_at(), fire_at);
        assert_eq!(
            scheduler.pending_targets().unwrap().as_ref(),
            &[target("c1")]
        );

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(runtime.restarted_ids(), vec!["c1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_bursts_restart_twice() {
        let runtime = Arc::new(MockRuntime::default());
        let scheduler = scheduler(&runtime);

        scheduler.signal(vec![target("c1")]);
        tokio::time::sleep(Duration::from_secs(1)).await;
        scheduler.signal(vec![target("c1")]);
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(runtime.restarted_ids(), vec!["c1", "c1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_signal_while_firing_arms_next_reload() {
        let runtime = Arc::new(MockRuntime::default());
        runtime.set_restart_delay(Duration::from_millis(500));
        let scheduler = scheduler(&runtime);

        scheduler.signal(vec![target("c1")]);
        // First reload fires at 200ms and its restart call runs until 700ms.
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(runtime.attempts(), vec!["c1"]);
        assert!(!scheduler.is_armed());

        assert!(scheduler.signal(vec![target("c2")]));
        assert!(scheduler.is_armed());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(runtime.attempts(), vec!["c1", "c2"]);
        assert_eq!(runtime.restarted_ids(), vec!["c1", "c2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_restart_keeps_scheduler_usable() {
        let runtime = Arc::new(MockRuntime::default());
        runtime.fail_restart("bad");
        let scheduler = scheduler(&runtime);

        scheduler.signal(vec![target("bad"), target("good")]);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(runtime.attempts(), vec!["bad", "good"]);

        scheduler.signal(vec![target("good")]);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(runtime.restarted_ids(), vec!["good", "good"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_abandons_pending_reload() {
        let runtime = Arc::new(MockRuntime::default());
        let scheduler = scheduler(&runtime);

        scheduler.signal(vec![target("c1")]);
        assert!(scheduler.cancel());
        assert!(!scheduler.cancel());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(runtime.attempts().is_empty());
    }
}
