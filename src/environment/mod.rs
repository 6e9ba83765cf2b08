//! Environment detection module.
//!
//! Determines whether the reloader runs on the host or inside a container, and which
//! container that is.
mod checks;
mod detect;
mod error;

pub use checks::{CgroupScan, is_container_id_like, scan_cgroup_file};
pub use detect::{RuntimeEnvironment, detect_runtime_environment, detect_runtime_environment_at};
pub use error::{Error, Result};
