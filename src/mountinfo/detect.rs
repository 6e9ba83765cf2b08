use std::io::BufRead;
use std::path::Path;

use crate::container::ContainerID;
use crate::environment::is_container_id_like;
use crate::fsutil;

use super::parser::parse_mount_info_line;
use super::{Error, Result};

/// Files the runtime bind-mounts from its per-container state directory.
const RUNTIME_MANAGED_FILES: &[&str] = &["/etc/hostname", "/etc/hosts", "/etc/resolv.conf"];

/// Detects the id of the container this process runs in by parsing a `mountinfo` file.
///
/// Docker and Podman bind-mount `/etc/hostname` and friends from a directory named after the
/// full container id (e.g. `/var/lib/docker/containers/<id>/hostname`). The first such id
/// found is returned.
///
/// # Returns
///
/// `Ok(None)` if no runtime-managed mount carries a container id, e.g. on the host.
///
/// # Errors
///
/// - [`Error::FileOpen`] if the file can't be opened.
/// - [`Error::ReadLine`] if reading from the file fails.
/// - [`Error::Parse`] if parsing any line fails.
///
/// # Example
///
/// ```no_run
/// use reloadwatch::mountinfo::detect_container_id;
///
/// if let Some(id) = detect_container_id("/proc/self/mountinfo").unwrap() {
///     println!("running in container {id}");
/// }
/// ```
pub fn detect_container_id(path: impl AsRef<Path>) -> Result<Option<ContainerID>> {
    let path = path.as_ref();
    let buf = fsutil::open_file_reader(path)?;

    detect_container_id_from_reader(buf, path)
}

/// Same as [`detect_container_id`], reading from an arbitrary buffered reader.
///
/// `origin` is only used in error messages.
pub fn detect_container_id_from_reader<R: BufRead>(
    mut reader: R,
    origin: &Path,
) -> Result<Option<ContainerID>> {
    let mut line = String::with_capacity(256);

    while reader
        .read_line(&mut line)
        .map_err(|source| Error::ReadLine {
            path: origin.to_path_buf(),
            source,
        })?
        != 0
    {
        if line.trim().is_empty() {
            line.clear();
            continue;
        }
        let mount_info = parse_mount_info_line(line.as_str()).map_err(|source| Error::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        if RUNTIME_MANAGED_FILES
            .iter()
            .any(|file| *file == mount_info.mount_point)
        {
            let candidate = mount_info
                .root
                .split('/')
                .find(|segment| segment.len() == 64 && is_container_id_like(segment));
            if let Some(raw) = candidate {
                log::debug!(
                    "Found container id `{}` in mount `{}` -> `{}`",
                    raw,
                    mount_info.root,
                    mount_info.mount_point
                );
                return Ok(Some(ContainerID::new(raw)?));
            }
        }

        line.clear();
    }

    Ok(None)
}
