#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid container id: {0:?}")]
    InvalidContainerID(String),
    #[error("container `{0}` not found")]
    NotFound(String),
    #[error("container runtime request failed: {0}")]
    Runtime(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wraps any runtime-specific failure.
    pub fn runtime(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Runtime(err.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
