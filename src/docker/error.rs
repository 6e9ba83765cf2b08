use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to connect to socket `{path}`: {source}")]
    SocketConnect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to build request for `{uri}`: {source}")]
    Request {
        uri: String,
        #[source]
        source: hyper::http::Error,
    },
    #[error("HTTP exchange with container runtime failed: {0}")]
    Http(#[source] hyper::Error),
    #[error("container runtime returned {status} for `{uri}`: {message}")]
    Api {
        uri: String,
        status: u16,
        message: String,
    },
    #[error("failed to decode response of `{uri}`: {source}")]
    Decode {
        uri: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<Error> for crate::container::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Api {
                status: 404,
                message,
                ..
            } => crate::container::Error::NotFound(message),
            other => crate::container::Error::runtime(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
