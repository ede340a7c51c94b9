//! Collective group registry
//!
//! Named, ordered sets of tasks that take part in collective operations.
//! Built once per session and immutable afterwards.

use std::collections::HashMap;

use tracing::debug;

use super::cluster_info::{ClusterInfo, TaskHandle};
use crate::config::DistributedContextConfiguration;
use crate::error::{DistError, Result};

/// A named group of tasks, members in declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectiveGroup {
    pub name: String,
    pub members: Vec<TaskHandle>,
}

impl CollectiveGroup {
    /// Position of `task` in the group, if it is a member
    pub fn rank_of(&self, task: TaskHandle) -> Option<usize> {
        self.members.iter().position(|&member| member == task)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Collective groups of one session, keyed by name
#[derive(Debug, Default)]
pub struct CollectiveGroups {
    groups: HashMap<String, CollectiveGroup>,
}

impl CollectiveGroups {
    /// Resolve every declared group against the cluster.
    ///
    /// Fails on the first member that does not name a cluster task.
    pub fn initialize(
        config: &DistributedContextConfiguration,
        cluster_info: &ClusterInfo,
    ) -> Result<Self> {
        let mut groups = HashMap::with_capacity(config.collective_groups.len());

        for group_config in &config.collective_groups {
            let members = group_config
                .members
                .iter()
                .map(|task_name| cluster_info.get_task_handle_by_name(task_name))
                .collect::<Result<Vec<_>>>()?;

            if groups.contains_key(&group_config.name) {
                return Err(DistError::invalid_argument(format!(
                    "collective group {:?} declared more than once",
                    group_config.name
                )));
            }

            debug!(
                "Registered collective group {} with {} members",
                group_config.name,
                members.len()
            );
            groups.insert(
                group_config.name.clone(),
                CollectiveGroup {
                    name: group_config.name.clone(),
                    members,
                },
            );
        }

        Ok(Self { groups })
    }

    pub fn get(&self, name: &str) -> Result<&CollectiveGroup> {
        self.groups
            .get(name)
            .ok_or_else(|| DistError::CollectiveGroupNotFound {
                name: name.to_string(),
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
