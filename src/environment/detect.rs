use std::path::Path;

use crate::container::ContainerID;
use crate::mountinfo;

use super::checks::{has_container_indicators, scan_cgroup_file};

/// Available runtime environments for the reloader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEnvironment {
    /// Running directly on the host.
    Host,
    /// Running inside a container. The id is known when it could be read from
    /// `/proc/self/mountinfo` or `/proc/self/cgroup`.
    Container(Option<ContainerID>),
}

impl RuntimeEnvironment {
    pub fn container_id(&self) -> Option<&ContainerID> {
        match self {
            RuntimeEnvironment::Container(id) => id.as_ref(),
            RuntimeEnvironment::Host => None,
        }
    }
}

/// Detects whether the current process is running in a container or on the host.
///
/// Equivalent to [`detect_runtime_environment_at`] with `/` as root.
pub fn detect_runtime_environment() -> RuntimeEnvironment {
    detect_runtime_environment_at(Path::new("/"))
}

/// Detects the runtime environment by inspecting files below `root`.
///
/// Checks, in order:
///
/// 1. `proc/self/mountinfo` for runtime-managed bind mounts named after the container id.
/// 2. `proc/self/cgroup` for runtime names and container ids.
/// 3. Known marker files (`.dockerenv`, `run/.containerenv`) and the `container` variable.
///
/// Individual failures are logged as warnings and do **not** cause this function to fail.
pub fn detect_runtime_environment_at(root: &Path) -> RuntimeEnvironment {
    match mountinfo::detect_container_id(root.join("proc/self/mountinfo")) {
        Ok(Some(id)) => return RuntimeEnvironment::Container(Some(id)),
        Ok(None) => {}
        Err(err) => log::warn!("Mountinfo analysis failed during runtime detection: {}", err),
    }

    let mut in_container = false;
    match scan_cgroup_file(root.join("proc/self/cgroup")) {
        Ok(scan) => {
            if scan.container_id.is_some() {
                return RuntimeEnvironment::Container(scan.container_id);
            }
            in_container = scan.mentions_runtime;
        }
        Err(err) => log::warn!("Cgroup analysis failed during runtime detection: {}", err),
    }

    if in_container || has_container_indicators(root) {
        return RuntimeEnvironment::Container(None);
    }

    RuntimeEnvironment::Host
}
