use std::path::PathBuf;
use std::time::Duration;

use super::{ContainerID, ContainerState, Result, TargetContainer};

/// Filter passed to [`ContainerRuntime::list_containers`].
///
/// All non-empty fields must match. `names` are exact container names, `labels` are
/// `key` or `key=value` selectors and `states` restricts the lifecycle state. An empty
/// `states` list means running containers only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerFilter {
    pub names: Vec<String>,
    pub labels: Vec<String>,
    pub states: Vec<ContainerState>,
}

impl ContainerFilter {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            names: vec![name.into()],
            ..Default::default()
        }
    }

    pub fn label(label: impl Into<String>, states: Vec<ContainerState>) -> Self {
        Self {
            labels: vec![label.into()],
            states,
            ..Default::default()
        }
    }

    /// States accepted by this filter, defaulting to `running`.
    pub fn effective_states(&self) -> &[ContainerState] {
        if self.states.is_empty() {
            &[ContainerState::Running]
        } else {
            &self.states
        }
    }
}

/// Operations the reloader needs from a container runtime.
pub trait ContainerRuntime: Send + Sync + 'static {
    fn list_containers(
        &self,
        filter: &ContainerFilter,
    ) -> impl std::future::Future<Output = Result<Vec<TargetContainer>>> + Send;

    /// Returns the mount destinations of the container with the given name or id.
    fn container_mounts(
        &self,
        name_or_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<PathBuf>>> + Send;

    /// Restarts a container, letting the runtime wait up to `timeout` before killing it.
    fn restart_container(
        &self,
        id: &ContainerID,
        timeout: Duration,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

impl<R: ContainerRuntime> ContainerRuntime for std::sync::Arc<R> {
    fn list_containers(
        &self,
        filter: &ContainerFilter,
    ) -> impl std::future::Future<Output = Result<Vec<TargetContainer>>> + Send {
        (**self).list_containers(filter)
    }

    fn container_mounts(
        &self,
        name_or_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<PathBuf>>> + Send {
        (**self).container_mounts(name_or_id)
    }

    fn restart_container(
        &self,
        id: &ContainerID,
        timeout: Duration,
    ) -> impl std::future::Future<Output = Result<()>> + Send {
        (**self).restart_container(id, timeout)
    }
}
