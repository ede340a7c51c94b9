//! Session configuration
//!
//! Static cluster topology plus collective-group definitions, loaded from
//! TOML. A configuration is an immutable snapshot once a session owns it.
//!
//! ```toml
//! job_name = "worker"
//! task_id = 0
//!
//! [[cluster.jobs]]
//! name = "worker"
//! tasks = [
//!     { id = 0, address = "10.0.0.1:7000" },
//!     { id = 1, address = "10.0.0.2:7000" },
//! ]
//!
//! [[collective_groups]]
//! name = "allreduce"
//! members = ["/job:worker/task:0", "/job:worker/task:1"]
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cluster::task_name::is_valid_job_name;
use crate::error::{DistError, Result};

/// Configuration of one distributed context as seen from the local task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributedContextConfiguration {
    /// Job of the local task
    pub job_name: String,
    /// Index of the local task within its job
    pub task_id: u32,
    /// Cluster topology
    pub cluster: ClusterConfig,
    /// Named groups taking part in collective operations
    #[serde(default)]
    pub collective_groups: Vec<CollectiveGroupConfig>,
}

/// All jobs in the cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    pub jobs: Vec<JobConfig>,
}

/// One job and the addresses of its tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConfig {
    pub name: String,
    pub tasks: Vec<TaskConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskConfig {
    pub id: u32,
    pub address: String,
}

/// Declared collective group; members are canonical task names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectiveGroupConfig {
    pub name: String,
    pub members: Vec<String>,
}

impl FromStr for DistributedContextConfiguration {
    type Err = DistError;

    /// Parse configuration from a TOML string.
    fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s)
            .map_err(|e| DistError::config_with_source("failed to parse TOML config", e))
    }
}

impl DistributedContextConfiguration {
    /// Load and validate configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            DistError::config_with_source(
                format!("failed to read config file {}", path.display()),
                e,
            )
        })?;
        let config: Self = content.parse()?;
        config.validate()?;
        Ok(config)
    }

    // Apply environment variable overrides for the local task identity:
    // - `VORTEX_JOB_NAME` overrides `job_name`
    // - `VORTEX_TASK_ID` overrides `task_id` (ignored if not an integer)
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("VORTEX_JOB_NAME") {
            self.job_name = val;
        }
        if let Ok(val) = std::env::var("VORTEX_TASK_ID") {
            if let Ok(id) = val.parse() {
                self.task_id = id;
            }
        }
        self
    }

    /// The same cluster seen from another task
    pub fn for_task(&self, job_name: impl Into<String>, task_id: u32) -> Self {
        Self {
            job_name: job_name.into(),
            task_id,
            cluster: self.cluster.clone(),
            collective_groups: self.collective_groups.clone(),
        }
    }

    /// Check structural consistency of the configuration.
    ///
    /// Collective-group members are resolved later, when a session is
    /// built, so a bad member surfaces as a lookup error at that point.
    pub fn validate(&self) -> Result<()> {
        if self.cluster.jobs.is_empty() {
            return Err(DistError::config("cluster has no jobs"));
        }

        let mut job_names = HashSet::new();
        for job in &self.cluster.jobs {
            if !is_valid_job_name(&job.name) {
                return Err(DistError::config(format!("invalid job name {:?}", job.name)));
            }
            if !job_names.insert(job.name.as_str()) {
                return Err(DistError::config(format!("duplicate job {:?}", job.name)));
            }
            let mut ids = HashSet::new();
            for task in &job.tasks {
                if !ids.insert(task.id) {
                    return Err(DistError::config(format!(
                        "duplicate task id {} in job {:?}",
                        task.id, job.name
                    )));
                }
            }
        }

        if !self.cluster.contains(&self.job_name, self.task_id) {
            return Err(DistError::TaskNotFound {
                job: self.job_name.clone(),
                task_id: self.task_id,
            });
        }

        let mut group_names = HashSet::new();
        for group in &self.collective_groups {
            if !group_names.insert(group.name.as_str()) {
                return Err(DistError::config(format!(
                    "duplicate collective group {:?}",
                    group.name
                )));
            }
        }

        Ok(())
    }
}

impl ClusterConfig {
    /// Whether the (job, task) pair is declared
    pub fn contains(&self, job_name: &str, task_id: u32) -> bool {
        self.jobs
            .iter()
            .filter(|job| job.name == job_name)
            .any(|job| job.tasks.iter().any(|task| task.id == task_id))
    }

    /// Total number of tasks across all jobs
    pub fn task_count(&self) -> usize {
        self.jobs.iter().map(|job| job.tasks.len()).sum()
    }
}
