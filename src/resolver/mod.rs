//! Answers "what to watch" and "what to restart".
//!
//! Watch roots are resolved once at startup. Targets are resolved again for every
//! filesystem event, so containers that start, stop or change labels while the reloader
//! runs are picked up without restarting it.
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::ReloadConfig;
use crate::container::{ContainerRuntime, TargetContainer};
use crate::environment::RuntimeEnvironment;
use crate::fsutil;

mod error;
mod selector;

pub use error::{Error, Result};
pub use selector::TargetSelector;

/// Mount point of the reloader itself when deployed as a container.
pub const SELF_MOUNT: &str = "/reloader";

#[derive(Debug)]
pub struct TargetResolver<R> {
    runtime: R,
    selectors: Vec<TargetSelector>,
    explicit_roots: Vec<PathBuf>,
    self_container: Option<String>,
    excluded_mounts: Vec<PathBuf>,
}

impl<R: ContainerRuntime> TargetResolver<R> {
    pub fn new(runtime: R, selectors: Vec<TargetSelector>) -> Self {
        Self {
            runtime,
            selectors,
            explicit_roots: Vec::new(),
            self_container: None,
            excluded_mounts: vec![PathBuf::from(SELF_MOUNT)],
        }
    }

    /// Builds a resolver from the configuration.
    ///
    /// `self_container` is the name or id of the container this process runs in, see
    /// [`identify_self_container`].
    pub fn from_config(runtime: R, config: &ReloadConfig, self_container: Option<String>) -> Self {
        let mut selectors: Vec<TargetSelector> = config
            .container_names
            .iter()
            .cloned()
            .map(TargetSelector::Name)
            .collect();
        selectors.extend(config.labels.iter().map(|label| TargetSelector::Label {
            selector: label.clone(),
            include_exited: !config.must_be_running,
        }));

        let mut resolver = Self::new(runtime, selectors)
            .with_explicit_roots(config.watch_dirs.clone())
            .with_excluded_mount(config.docker_socket.clone());
        resolver.self_container = self_container;
        resolver
    }

    pub fn with_explicit_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.explicit_roots = roots;
        self
    }

    pub fn with_self_container(mut self, name_or_id: impl Into<String>) -> Self {
        self.self_container = Some(name_or_id.into());
        self
    }

    pub fn with_excluded_mount(mut self, destination: impl Into<PathBuf>) -> Self {
        self.excluded_mounts.push(destination.into());
        self
    }

    pub fn selectors(&self) -> &[TargetSelector] {
        &self.selectors
    }

    /// Returns the directories to watch.
    ///
    /// Explicitly configured roots are returned verbatim. Otherwise every mount of the own
    /// container is a root, except the runtime socket and the reloader's own mount.
    ///
    /// # Errors
    ///
    /// - [`Error::NotInContainer`] if no roots are configured and the own container is
    ///   unknown.
    /// - [`Error::SelfMounts`] if the own container cannot be inspected.
    /// - [`Error::NoWatchRoots`] if no directory remains.
    pub async fn resolve_watch_roots(&self) -> Result<Vec<PathBuf>> {
        if !self.explicit_roots.is_empty() {
            return Ok(dedup_paths(self.explicit_roots.iter().cloned()));
        }

        let name = self.self_container.as_ref().ok_or(Error::NotInContainer)?;
        let mounts = self
            .runtime
            .container_mounts(name)
            .await
            .map_err(|source| Error::SelfMounts {
                name: name.clone(),
                source,
            })?;
        log::debug!("Own container `{}` mounts: {:?}", name, mounts);

        let roots = dedup_paths(
            mounts
                .into_iter()
                .filter(|m| !self.excluded_mounts.iter().any(|ex| m.starts_with(ex))),
        );
        if roots.is_empty() {
            return Err(Error::NoWatchRoots);
        }
        Ok(roots)
    }

    /// Returns the containers to restart right now, deduplicated by id.
    ///
    /// An empty result is not an error; it means no restart should happen.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Targets`] if the runtime cannot be queried.
    pub async fn resolve_targets(&self) -> Result<Vec<TargetContainer>> {
        let mut seen = HashSet::new();
        let mut targets = Vec::new();
        for selector in &self.selectors {
            let found = selector
                .resolve(&self.runtime)
                .await
                .map_err(Error::Targets)?;
            log::trace!("Selector {} matched {} containers", selector, found.len());
            for container in found {
                if seen.insert(container.id.clone()) {
                    targets.push(container);
                }
            }
        }
        Ok(targets)
    }
}

fn dedup_paths(paths: impl IntoIterator<Item = PathBuf>) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    paths
        .into_iter()
        .filter(|p| seen.insert(p.clone()))
        .collect()
}

/// Works out the name or id of the container this process runs in.
///
/// Preference order: the configured value, the id found by environment detection, then
/// the hostname (which the runtime sets to the short container id). Returns `None` when
/// running on the host.
pub fn identify_self_container(
    configured: Option<&str>,
    environment: &RuntimeEnvironment,
    hostname_path: &Path,
) -> Option<String> {
    if let Some(name) = configured {
        return Some(name.to_owned());
    }
    match environment {
        RuntimeEnvironment::Host => None,
        RuntimeEnvironment::Container(Some(id)) => Some(id.to_string()),
        RuntimeEnvironment::Container(None) => match fsutil::read_trimmed(hostname_path) {
            Ok(hostname) => hostname,
            Err(err) => {
                log::warn!("Cannot determine own container: {}", err);
                None
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::container::mock::MockRuntime;
    use crate::container::{ContainerID, ContainerState};

    fn runtime() -> Arc<MockRuntime> {
        let runtime = Arc::new(MockRuntime::default());
        runtime.add("aaa111", "web-server", ContainerState::Running, &[]);
        runtime.add("bbb222", "web-server-2", ContainerState::Running, &[]);
        runtime.add(
            "ccc333",
            "worker",
            ContainerState::Running,
            &[("dev.reload", "true")],
        );
        runtime.add(
            "ddd444",
            "cron",
            ContainerState::Exited,
            &[("dev.reload", "true")],
        );
        runtime.add(
            "aaa111-other",
            "unrelated",
            ContainerState::Running,
            &[("dev.reload", "false")],
        );
        runtime
    }

    fn ids(targets: &[TargetContainer]) -> Vec<&str> {
        targets.iter().map(|t| t.id.as_ref()).collect()
    }

    #[tokio::test]
    async fn test_name_is_exact_match() {
        let resolver = TargetResolver::new(
            runtime(),
            vec![TargetSelector::Name("web-server".to_owned())],
        );
        let targets = resolver.resolve_targets().await.unwrap();
        assert_eq!(ids(&targets), vec!["aaa111"]);
    }

    #[tokio::test]
    async fn test_label_running_only() {
        let resolver = TargetResolver::new(
            runtime(),
            vec![TargetSelector::Label {
                selector: "dev.reload=true".to_owned(),
                include_exited: false,
            }],
        );
        let targets = resolver.resolve_targets().await.unwrap();
        assert_eq!(ids(&targets), vec!["ccc333"]);
    }

    #[tokio::test]
    async fn test_label_including_exited() {
        let resolver = TargetResolver::new(
            runtime(),
            vec![TargetSelector::Label {
                selector: "dev.reload=true".to_owned(),
                include_exited: true,
            }],
        );
        let targets = resolver.resolve_targets().await.unwrap();
        assert_eq!(ids(&targets), vec!["ccc333", "ddd444"]);
    }

    #[tokio::test]
    async fn test_union_is_deduplicated() {
        let resolver = TargetResolver::new(
            runtime(),
            vec![
                TargetSelector::Name("worker".to_owned()),
                TargetSelector::Label {
                    selector: "dev.reload".to_owned(),
                    include_exited: false,
                },
            ],
        );
        let targets = resolver.resolve_targets().await.unwrap();
        assert_eq!(ids(&targets), vec!["ccc333", "aaa111-other"]);
    }

    #[tokio::test]
    async fn test_no_match_is_empty_not_error() {
        let resolver =
            TargetResolver::new(runtime(), vec![TargetSelector::Name("api".to_owned())]);
        assert!(resolver.resolve_targets().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_listing_failure_is_error() {
        let runtime = runtime();
        runtime.fail_listing(true);
        let resolver = TargetResolver::new(runtime, vec![TargetSelector::Name("web".to_owned())]);
        assert!(matches!(
            resolver.resolve_targets().await,
            Err(Error::Targets(_))
        ));
    }

    #[tokio::test]
    async fn test_explicit_roots_win() {
        let resolver = TargetResolver::new(runtime(), Vec::new())
            .with_explicit_roots(vec![
                PathBuf::from("/app/src"),
                PathBuf::from("/app/lib"),
                PathBuf::from("/app/src"),
            ])
            .with_self_container("unknown");
        let roots = resolver.resolve_watch_roots().await.unwrap();
        assert_eq!(
            roots,
            vec![PathBuf::from("/app/src"), PathBuf::from("/app/lib")]
        );
    }

    #[tokio::test]
    async fn test_roots_derived_from_own_mounts() {
        let runtime = runtime();
        runtime.add("eee555", "livereloader", ContainerState::Running, &[]);
        runtime.set_mounts(
            "eee555",
            &["/var/run/docker.sock", "/reloader", "/app/src"],
        );
        let config = ReloadConfig {
            container_names: vec!["web-server".to_owned()],
            ..Default::default()
        };
        let resolver = TargetResolver::from_config(runtime, &config, Some("eee555".to_owned()));

        let roots = resolver.resolve_watch_roots().await.unwrap();
        assert_eq!(roots, vec![PathBuf::from("/app/src")]);
    }

    #[tokio::test]
    async fn test_only_excluded_mounts_is_error() {
        let runtime = runtime();
        runtime.add("eee555", "livereloader", ContainerState::Running, &[]);
        runtime.set_mounts("eee555", &["/var/run/docker.sock", "/reloader/app"]);
        let resolver = TargetResolver::from_config(
            runtime,
            &ReloadConfig::default(),
            Some("livereloader".to_owned()),
        );
        assert!(matches!(
            resolver.resolve_watch_roots().await,
            Err(Error::NoWatchRoots)
        ));
    }

    #[tokio::test]
    async fn test_unknown_self_container_is_error() {
        let resolver = TargetResolver::new(runtime(), Vec::new());
        assert!(matches!(
            resolver.resolve_watch_roots().await,
            Err(Error::NotInContainer)
        ));

        let resolver = TargetResolver::new(runtime(), Vec::new()).with_self_container("ghost");
        assert!(matches!(
            resolver.resolve_watch_roots().await,
            Err(Error::SelfMounts { .. })
        ));
    }

    #[test]
    fn test_from_config_builds_selectors() {
        let config = ReloadConfig {
            container_names: vec!["web".to_owned()],
            labels: vec!["dev.reload".to_owned()],
            must_be_running: false,
            ..Default::default()
        };
        let resolver = TargetResolver::from_config(MockRuntime::default(), &config, None);
        assert_eq!(
            resolver.selectors(),
            &[
                TargetSelector::Name("web".to_owned()),
                TargetSelector::Label {
                    selector: "dev.reload".to_owned(),
                    include_exited: true,
                },
            ]
        );
    }

    #[test]
    fn test_identify_self_container() {
        let dir = tempfile::tempdir().unwrap();
        let hostname = dir.path().join("hostname");
        std::fs::write(&hostname, "4f1c2b9a8e7d\n").unwrap();
        let id = ContainerID::new("4f1c2b9a8e7d6c5b").unwrap();

        assert_eq!(
            identify_self_container(Some("livereloader"), &RuntimeEnvironment::Host, &hostname),
            Some("livereloader".to_owned())
        );
        assert_eq!(
            identify_self_container(None, &RuntimeEnvironment::Container(Some(id)), &hostname),
            Some("4f1c2b9a8e7d6c5b".to_owned())
        );
        assert_eq!(
            identify_self_container(None, &RuntimeEnvironment::Container(None), &hostname),
            Some("4f1c2b9a8e7d".to_owned())
        );
        assert_eq!(
            identify_self_container(None, &RuntimeEnvironment::Host, &hostname),
            None
        );
    }
}
