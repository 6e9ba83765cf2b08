//! Subsets of the Docker Engine API payloads the reloader reads.
/// Entry of `GET /containers/json`.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerSummary {
    pub id: String,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub state: String,
}

impl ContainerSummary {
    /// Names without the leading `/`.
    pub fn plain_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|n| n.strip_prefix('/').unwrap_or(n))
    }
}

/// Body of `GET /containers/{id}/json`.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerInspect {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mounts: Vec<MountPoint>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MountPoint {
    pub destination: String,
    #[serde(default, rename = "Type")]
    pub kind: String,
}

#[derive(Debug, serde::Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}
