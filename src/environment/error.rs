use std::path::PathBuf;

use crate::fsutil;

/// Errors that may occur while inspecting the process environment.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    FileOpen(#[from] fsutil::FileOpenError),
    #[error("failed to read cgroup file `{path}`: {source}")]
    CgroupRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
