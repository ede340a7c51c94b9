//! Cluster topology
//!
//! Task naming, task handle resolution and collective groups.

pub mod cluster_info;
pub mod collective;
pub mod task_name;

pub use cluster_info::{ClusterInfo, TaskEntry, TaskHandle};
pub use collective::{CollectiveGroup, CollectiveGroups};
pub use task_name::{concat_task_name, parse_task_name};
