//! One-shot HTTP/1.1 exchanges over the engine's unix control socket.
use std::path::Path;

use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper::{Method, Request, StatusCode};
use hyper_util::rt::TokioIo;

use super::error::{Error, Result};
use super::models::ErrorResponse;

#[derive(Debug)]
pub(super) struct Response {
    pub status: StatusCode,
    pub body: Bytes,
}

impl Response {
    /// Parses the body as JSON, turning non-success statuses into [`Error::Api`].
    pub fn json<T: serde::de::DeserializeOwned>(self, uri: &str) -> Result<T> {
        let this = self.error_for_status(uri)?;
        serde_json::from_slice(&this.body).map_err(|source| Error::Decode {
            uri: uri.to_owned(),
            source,
        })
    }

    pub fn error_for_status(self, uri: &str) -> Result<Self> {
        if self.status.is_success() {
            return Ok(self);
        }
        let message = serde_json::from_slice::<ErrorResponse>(&self.body)
            .map(|e| e.message)
            .unwrap_or_else(|_| String::from_utf8_lossy(&self.body).trim().to_owned());
        Err(Error::Api {
            uri: uri.to_owned(),
            status: self.status.as_u16(),
            message,
        })
    }
}

/// Sends a body-less request to `uri` (origin-form, e.g. `/containers/json`) and collects
/// the whole response.
pub(super) async fn send(socket: &Path, method: Method, uri: &str) -> Result<Response> {
    log::trace!("{} {} via {}", method, uri, socket.display());
    let stream = tokio::net::UnixStream::connect(socket)
        .await
        .map_err(|source| Error::SocketConnect {
            path: socket.to_path_buf(),
            source,
        })?;

    let (mut sender, connection) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
        .await
        .map_err(Error::Http)?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            log::debug!("Container runtime connection closed with error: {}", err);
        }
    });

    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(hyper::header::HOST, "localhost")
        .body(Empty::<Bytes>::new())
        .map_err(|source| Error::Request {
            uri: uri.to_owned(),
            source,
        })?;

    let response = sender.send_request(request).await.map_err(Error::Http)?;
    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .map_err(Error::Http)?
        .to_bytes();
    log::trace!("{} answered {} ({} bytes)", uri, status, body.len());

    Ok(Response { status, body })
}
