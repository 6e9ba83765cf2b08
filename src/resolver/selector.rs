use crate::container::{self, ContainerFilter, ContainerRuntime, ContainerState, TargetContainer};

/// One way of picking restart targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSelector {
    /// The container whose name is exactly this string.
    Name(String),
    /// Containers carrying a label (`key` or `key=value`).
    Label {
        selector: String,
        /// Also pick exited containers, not only running ones.
        include_exited: bool,
    },
}

impl TargetSelector {
    pub fn filter(&self) -> ContainerFilter {
        match self {
            TargetSelector::Name(name) => ContainerFilter::name(name.clone()),
            TargetSelector::Label {
                selector,
                include_exited,
            } => {
                let mut states = vec![ContainerState::Running];
                if *include_exited {
                    states.push(ContainerState::Exited);
                }
                ContainerFilter::label(selector.clone(), states)
            }
        }
    }

    /// Asks the runtime for the containers this selector picks.
    pub async fn resolve<R: ContainerRuntime>(
        &self,
        runtime: &R,
    ) -> container::Result<Vec<TargetContainer>> {
        let mut found = runtime.list_containers(&self.filter()).await?;
        if let TargetSelector::Name(name) = self {
            found.retain(|c| c.name == *name);
        }
        Ok(found)
    }
}

impl std::fmt::Display for TargetSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetSelector::Name(name) => write!(f, "name={name}"),
            TargetSelector::Label { selector, .. } => write!(f, "label={selector}"),
        }
    }
}
