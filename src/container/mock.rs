//! In-memory [`ContainerRuntime`] used by unit tests.
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::{
    ContainerFilter, ContainerID, ContainerRuntime, ContainerState, Error, Result, TargetContainer,
};

#[derive(Debug)]
struct MockContainer {
    target: TargetContainer,
    labels: HashMap<String, String>,
    mounts: Vec<PathBuf>,
}

#[derive(Debug, Default)]
pub(crate) struct MockRuntime {
    containers: Mutex<Vec<MockContainer>>,
    failing: Mutex<HashSet<ContainerID>>,
    fail_listing: AtomicBool,
    restarts: Mutex<Vec<(ContainerID, tokio::time::Instant)>>,
    attempts: Mutex<Vec<ContainerID>>,
    restart_delay: Mutex<Duration>,
}

impl MockRuntime {
    pub(crate) fn add(&self, id: &str, name: &str, state: ContainerState, labels: &[(&str, &str)]) {
        self.containers.lock().unwrap().push(MockContainer {
            target: TargetContainer::new(ContainerID::new(id).unwrap(), name, state),
            labels: labels
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
            mounts: Vec::new(),
        });
    }

    pub(crate) fn set_mounts(&self, id: &str, mounts: &[&str]) {
        let mut containers = self.containers.lock().unwrap();
        let container = containers
            .iter_mut()
            .find(|c| c.target.id.as_ref() == id)
            .expect("unknown mock container");
        container.mounts = mounts.iter().map(PathBuf::from).collect();
    }

    pub(crate) fn fail_restart(&self, id: &str) {
        self.failing
            .lock()
            .unwrap()
            .insert(ContainerID::new(id).unwrap());
    }

    /// Makes every restart call take `delay` (tokio time).
    pub(crate) fn set_restart_delay(&self, delay: Duration) {
        *self.restart_delay.lock().unwrap() = delay;
    }

    pub(crate) fn fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }

    /// Successful restarts with the (tokio) time the call was issued.
    pub(crate) fn restarts(&self) -> Vec<(ContainerID, tokio::time::Instant)> {
        self.restarts.lock().unwrap().clone()
    }

    pub(crate) fn restarted_ids(&self) -> Vec<String> {
        self.restarts()
            .into_iter()
            .map(|(id, _)| id.to_string())
            .collect()
    }

    /// Every restart call, including failed ones.
    pub(crate) fn attempts(&self) -> Vec<String> {
        self.attempts
            .lock()
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect()
    }
}

fn label_matches(labels: &HashMap<String, String>, selector: &str) -> bool {
    match selector.split_once('=') {
        Some((key, value)) => labels.get(key).is_some_and(|v| v == value),
        None => labels.contains_key(selector),
    }
}

impl ContainerRuntime for MockRuntime {
    async fn list_containers(&self, filter: &ContainerFilter) -> Result<Vec<TargetContainer>> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(Error::runtime("connection refused"));
        }
        let states = filter.effective_states();
        let containers = self.containers.lock().unwrap();
        Ok(containers
            .iter()
            .filter(|c| states.contains(&c.target.state))
            .filter(|c| filter.names.iter().all(|n| *n == c.target.name))
            .filter(|c| filter.labels.iter().all(|l| label_matches(&c.labels, l)))
            .map(|c| c.target.clone())
            .collect())
    }

    async fn container_mounts(&self, name_or_id: &str) -> Result<Vec<PathBuf>> {
        let containers = self.containers.lock().unwrap();
        containers
            .iter()
            .find(|c| c.target.name == name_or_id || c.target.id.as_ref().starts_with(name_or_id))
            .map(|c| c.mounts.clone())
            .ok_or_else(|| Error::NotFound(name_or_id.to_owned()))
    }

    async fn restart_container(&self, id: &ContainerID, _timeout: Duration) -> Result<()> {
        let started = tokio::time::Instant::now();
        self.attempts.lock().unwrap().push(id.clone());
        let delay = *self.restart_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().unwrap().contains(id) {
            return Err(Error::runtime(format!("cannot restart {id}")));
        }
        self.restarts.lock().unwrap().push((id.clone(), started));
        Ok(())
    }
}
