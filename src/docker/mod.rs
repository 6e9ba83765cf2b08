//! Minimal Docker Engine API client speaking HTTP/1.1 over the local unix socket.
//!
//! Only the three calls the reloader needs are implemented: listing containers, inspecting
//! a container's mounts and restarting a container.
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use hyper::Method;

use crate::container::{
    self, ContainerFilter, ContainerID, ContainerRuntime, ContainerState, TargetContainer,
};

mod error;
mod models;
mod transport;

pub use error::{Error, Result};
pub use models::{ContainerInspect, ContainerSummary, MountPoint};

/// Handle to a Docker (or Podman) engine reachable through a unix socket.
#[derive(Debug, Clone)]
pub struct Client {
    socket_path: PathBuf,
}

impl Client {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
        }
    }

    /// `GET /containers/json` with the given filter.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if the socket is unreachable, the engine rejects the request or
    /// the response cannot be decoded.
    pub async fn list(&self, filter: &ContainerFilter) -> Result<Vec<ContainerSummary>> {
        let uri = list_uri(filter);
        let containers: Vec<ContainerSummary> =
            transport::send(&self.socket_path, Method::GET, &uri)
                .await?
                .json(&uri)?;
        log::debug!("Engine listed {} containers for {:?}", containers.len(), filter);

        // The engine's name filter is a regex; keep exact matches only.
        Ok(containers
            .into_iter()
            .filter(|c| {
                filter
                    .names
                    .iter()
                    .all(|name| c.plain_names().any(|n| n == name.as_str()))
            })
            .collect())
    }

    /// `GET /containers/{id}/json`.
    pub async fn inspect(&self, name_or_id: &str) -> Result<ContainerInspect> {
        let uri = format!("/containers/{}/json", urlencoding::encode(name_or_id));
        transport::send(&self.socket_path, Method::GET, &uri)
            .await?
            .json(&uri)
    }

    /// `POST /containers/{id}/restart?t=<timeout>`.
    ///
    /// The call returns once the engine finished restarting the container, which can take
    /// up to `timeout` plus the container's start time.
    pub async fn restart(&self, id: &ContainerID, timeout: Duration) -> Result<()> {
        let uri = format!(
            "/containers/{}/restart?t={}",
            urlencoding::encode(id.as_ref()),
            timeout.as_secs()
        );
        transport::send(&self.socket_path, Method::POST, &uri)
            .await?
            .error_for_status(&uri)?;
        Ok(())
    }
}

impl ContainerRuntime for Client {
    async fn list_containers(
        &self,
        filter: &ContainerFilter,
    ) -> container::Result<Vec<TargetContainer>> {
        let summaries = self.list(filter).await?;
        let mut targets = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let id = ContainerID::new(&summary.id)?;
            let name = summary.plain_names().next().unwrap_or_default().to_owned();
            targets.push(TargetContainer::new(
                id,
                name,
                ContainerState::from(summary.state.as_str()),
            ));
        }
        Ok(targets)
    }

    async fn container_mounts(&self, name_or_id: &str) -> container::Result<Vec<PathBuf>> {
        let inspect = self.inspect(name_or_id).await?;
        log::debug!(
            "Container `{}` ({}) has {} mounts",
            inspect.name,
            inspect.id,
            inspect.mounts.len()
        );
        for mount in &inspect.mounts {
            log::trace!("Mount {} ({})", mount.destination, mount.kind);
        }
        Ok(inspect
            .mounts
            .into_iter()
            .map(|m| PathBuf::from(m.destination))
            .collect())
    }

    async fn restart_container(&self, id: &ContainerID, timeout: Duration) -> container::Result<()> {
        Ok(self.restart(id, timeout).await?)
    }
}

/// Builds the `GET /containers/json` URI for a filter.
///
/// Names are anchored so that `web` never matches `web-2`. Non-running states require
/// `all=true`, otherwise the engine hides stopped containers.
fn list_uri(filter: &ContainerFilter) -> String {
    let mut filters: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    if !filter.names.is_empty() {
        filters.insert(
            "name",
            filter
                .names
                .iter()
                .map(|n| format!("^/?{}$", escape_regex(n)))
                .collect(),
        );
    }
    if !filter.labels.is_empty() {
        filters.insert("label", filter.labels.clone());
    }
    let states = filter.effective_states();
    filters.insert(
        "status",
        states.iter().map(|s| s.as_str().to_owned()).collect(),
    );

    let all = states.iter().any(|s| *s != ContainerState::Running);
    // Serializing a map of string vectors cannot fail.
    let filters = serde_json::to_string(&filters).unwrap_or_default();
    format!(
        "/containers/json?all={}&filters={}",
        all,
        urlencoding::encode(&filters)
    )
}

fn escape_regex(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(
            c,
            '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$' | '\\'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
