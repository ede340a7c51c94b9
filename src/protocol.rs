//! Context lifecycle messages
//!
//! Requests exchanged between tasks when a distributed context is created
//! or closed. Encoding them for the wire is left to the transport.

use std::sync::Arc;

use crate::config::{ClusterConfig, CollectiveGroupConfig, DistributedContextConfiguration};

/// Part of a create request that is identical for every recipient.
///
/// Built once per broadcast and shared by all per-recipient requests.
#[derive(Debug, PartialEq, Eq)]
pub struct SharedContextPayload {
    pub cluster: ClusterConfig,
    pub collective_groups: Vec<CollectiveGroupConfig>,
}

impl SharedContextPayload {
    pub fn from_config(config: &DistributedContextConfiguration) -> Self {
        Self {
            cluster: config.cluster.clone(),
            collective_groups: config.collective_groups.clone(),
        }
    }
}

/// Ask a task to create its side of a distributed context
#[derive(Debug, Clone)]
pub struct CreateContextRequest {
    pub context_id: u64,
    /// Job of the recipient
    pub job_name: String,
    /// Task index of the recipient
    pub task_id: u32,
    pub shared: Arc<SharedContextPayload>,
}

impl CreateContextRequest {
    /// Configuration of the context as seen by the recipient
    pub fn dist_config(&self) -> DistributedContextConfiguration {
        DistributedContextConfiguration {
            job_name: self.job_name.clone(),
            task_id: self.task_id,
            cluster: self.shared.cluster.clone(),
            collective_groups: self.shared.collective_groups.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateContextResponse {}

/// Ask a task to close its side of a distributed context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseContextRequest {
    pub context_id: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloseContextResponse {}
