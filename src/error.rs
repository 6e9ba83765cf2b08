/// Fatal startup errors. Everything that can go wrong after startup is logged instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::Error),
    #[error("configuration error: {0}")]
    Resolve(#[from] crate::resolver::Error),
    #[error("configuration error: invalid pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    #[error("failed to create {kind:?} filesystem watcher: {source}")]
    Watcher {
        kind: crate::config::ObserverKind,
        #[source]
        source: notify::Error,
    },
    #[error("failed to wait for shutdown signal: {0}")]
    Signal(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

pub trait ResultOkLogExt<T, E> {
    fn ok_log(self) -> Option<T>;
}

impl<T, E> ResultOkLogExt<T, E> for std::result::Result<T, E>
where
    E: std::error::Error,
{
    fn ok_log(self) -> Option<T> {
        match self {
            Ok(ok) => Some(ok),
            Err(err) => {
                log::error!("{err}");
                None
            }
        }
    }
}
