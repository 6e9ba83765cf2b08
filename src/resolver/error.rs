#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(
        "no directory to watch: set `RELOAD_DIR` or mount the source directories into this container"
    )]
    NoWatchRoots,
    #[error(
        "cannot derive watch directories: not running inside a container and `RELOAD_DIR` is not set"
    )]
    NotInContainer,
    #[error("failed to look up the mounts of own container `{name}`: {source}")]
    SelfMounts {
        name: String,
        #[source]
        source: crate::container::Error,
    },
    #[error("failed to resolve target containers: {0}")]
    Targets(#[source] crate::container::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
