use std::time::Duration;

use crate::container::{ContainerID, ContainerRuntime, TargetContainer};

/// Outcome of one [`RestartExecutor::execute`] run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RestartReport {
    pub restarted: Vec<ContainerID>,
    pub failed: Vec<(ContainerID, String)>,
}

/// Restarts containers one by one, isolating failures per container.
#[derive(Debug)]
pub struct RestartExecutor<R> {
    runtime: R,
    timeout: Duration,
}

impl<R: ContainerRuntime> RestartExecutor<R> {
    /// `timeout` is forwarded to the runtime; the executor adds no deadline of its own.
    pub fn new(runtime: R, timeout: Duration) -> Self {
        Self { runtime, timeout }
    }

    /// Restarts every target. Never fails: errors are logged and collected in the report,
    /// and the remaining targets are still attempted.
    pub async fn execute(&self, targets: &[TargetContainer]) -> RestartReport {
        let mut report = RestartReport::default();
        for target in targets {
            log::info!("Reloading container: {}", target);
            match self
                .runtime
                .restart_container(&target.id, self.timeout)
                .await
            {
                Ok(()) => {
                    log::info!("Restarted container {}", target);
                    report.restarted.push(target.id.clone());
                }
                Err(err) => {
                    log::error!(
                        "Failed to restart container {} (id={}): {}",
                        target.name,
                        target.id,
                        err
                    );
                    report.failed.push((target.id.clone(), err.to_string()));
                }
            }
        }
        report
    }
}
