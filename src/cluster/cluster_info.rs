//! Task handle resolution
//!
//! Assigns every (job, task) pair in the cluster a dense [`TaskHandle`]
//! and answers lookups in both directions.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use super::task_name::{concat_task_name, parse_task_name};
use crate::config::DistributedContextConfiguration;
use crate::error::{DistError, Result};

/// Opaque identifier of one task in the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u32);

impl TaskHandle {
    /// Position of the task in cluster declaration order
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// One resolved task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEntry {
    pub handle: TaskHandle,
    pub job_name: String,
    pub task_id: u32,
    pub address: String,
}

impl TaskEntry {
    /// Canonical `/job:<job>/task:<id>` name
    pub fn task_name(&self) -> String {
        concat_task_name(&self.job_name, self.task_id)
    }
}

/// Immutable view of the cluster built from static configuration
#[derive(Debug)]
pub struct ClusterInfo {
    tasks: Vec<TaskEntry>,
    by_job: HashMap<String, HashMap<u32, TaskHandle>>,
    local: TaskHandle,
}

impl ClusterInfo {
    /// Resolve every task in the configuration, in declaration order
    pub fn new(config: &DistributedContextConfiguration) -> Result<Self> {
        let mut tasks = Vec::with_capacity(config.cluster.task_count());
        let mut by_job: HashMap<String, HashMap<u32, TaskHandle>> = HashMap::new();

        for job in &config.cluster.jobs {
            if by_job.contains_key(&job.name) {
                return Err(DistError::invalid_argument(format!(
                    "job {:?} declared more than once",
                    job.name
                )));
            }
            let mut ids = HashMap::with_capacity(job.tasks.len());
            for task in &job.tasks {
                let handle = TaskHandle(tasks.len() as u32);
                if ids.insert(task.id, handle).is_some() {
                    return Err(DistError::invalid_argument(format!(
                        "task {} declared more than once in job {:?}",
                        task.id, job.name
                    )));
                }
                tasks.push(TaskEntry {
                    handle,
                    job_name: job.name.clone(),
                    task_id: task.id,
                    address: task.address.clone(),
                });
            }
            by_job.insert(job.name.clone(), ids);
        }

        let local = by_job
            .get(&config.job_name)
            .and_then(|ids| ids.get(&config.task_id))
            .copied()
            .ok_or_else(|| DistError::TaskNotFound {
                job: config.job_name.clone(),
                task_id: config.task_id,
            })?;

        debug!(
            "Resolved {} tasks across {} jobs, local task is {}",
            tasks.len(),
            by_job.len(),
            concat_task_name(&config.job_name, config.task_id)
        );

        Ok(Self {
            tasks,
            by_job,
            local,
        })
    }

    /// Handle of the local task
    pub fn task_handle(&self) -> TaskHandle {
        self.local
    }

    /// Look up the handle of a (job, task) pair
    pub fn get_task_handle(&self, job_name: &str, task_id: u32) -> Result<TaskHandle> {
        self.by_job
            .get(job_name)
            .and_then(|ids| ids.get(&task_id))
            .copied()
            .ok_or_else(|| DistError::TaskNotFound {
                job: job_name.to_string(),
                task_id,
            })
    }

    /// Look up the handle of a canonical task name
    pub fn get_task_handle_by_name(&self, task_name: &str) -> Result<TaskHandle> {
        let (job_name, task_id) = parse_task_name(task_name)?;
        self.get_task_handle(&job_name, task_id)
    }

    pub fn task(&self, handle: TaskHandle) -> Result<&TaskEntry> {
        self.tasks.get(handle.index()).ok_or_else(|| {
            DistError::invalid_argument(format!("{} does not belong to this cluster", handle))
        })
    }

    pub fn task_name(&self, handle: TaskHandle) -> Result<String> {
        self.task(handle).map(TaskEntry::task_name)
    }

    pub fn task_address(&self, handle: TaskHandle) -> Result<&str> {
        self.task(handle).map(|entry| entry.address.as_str())
    }

    /// All tasks in declaration order
    pub fn tasks(&self) -> impl Iterator<Item = &TaskEntry> {
        self.tasks.iter()
    }

    /// Every task except the local one
    pub fn remote_tasks(&self) -> impl Iterator<Item = &TaskEntry> {
        let local = self.local;
        self.tasks.iter().filter(move |entry| entry.handle != local)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
