use std::io::BufRead;
use std::path::Path;
use std::{env, fs};

use crate::container::ContainerID;
use crate::fsutil;

use super::{Error, Result};

/// Runtime names that show up in cgroup paths of containerized processes.
const RUNTIME_MARKERS: &[&str] = &["docker", "kubepods", "containerd", "libpod"];

/// What a `/proc/<pid>/cgroup` file reveals about the process.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CgroupScan {
    /// A container runtime name appears in the cgroup path.
    pub mentions_runtime: bool,
    /// Full container id embedded in the cgroup path, if any.
    pub container_id: Option<ContainerID>,
}

/// Scans a cgroup file for container runtime hints.
///
/// Recognizes the cgroup v1 layout (`12:memory:/docker/<id>`) as well as systemd scopes
/// used with cgroup v2 (`0::/system.slice/docker-<id>.scope`).
///
/// # Errors
///
/// * [`Error::FileOpen`] if the file cannot be opened.
/// * [`Error::CgroupRead`] if a line from the file cannot be read.
pub fn scan_cgroup_file(path: impl AsRef<Path>) -> Result<CgroupScan> {
    let path = path.as_ref();
    let mut buf = fsutil::open_file_reader(path)?;

    let mut scan = CgroupScan::default();
    let mut line = String::with_capacity(256);

    while buf.read_line(&mut line).map_err(|source| Error::CgroupRead {
        path: path.to_path_buf(),
        source,
    })? != 0
    {
        if RUNTIME_MARKERS.iter().any(|marker| line.contains(marker)) {
            scan.mentions_runtime = true;
        }

        if scan.container_id.is_none() {
            scan.container_id = line
                .trim_end()
                .split('/')
                .filter_map(container_id_from_segment)
                .next_back();
        }

        line.clear();
    }

    Ok(scan)
}

fn container_id_from_segment(segment: &str) -> Option<ContainerID> {
    let segment = segment.strip_suffix(".scope").unwrap_or(segment);
    let candidate = segment.rsplit('-').next().unwrap_or(segment);
    if candidate.len() == 64 && is_container_id_like(candidate) {
        ContainerID::new(candidate).ok()
    } else {
        None
    }
}

/// Returns true if marker files or variables suggest a containerized environment.
///
/// `root` is prepended to the marker file paths (`/` in production).
pub fn has_container_indicators(root: &Path) -> bool {
    fs::metadata(root.join(".dockerenv")).is_ok()
        || fs::metadata(root.join("run/.containerenv")).is_ok()
        || env::var_os("container").is_some()
}

/// Returns true if the input string is not empty and contains only ASCII hex digits.
pub fn is_container_id_like(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_hexdigit())
}
