//! Shared test fixtures: cluster configs and a recording mock transport

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use vortex_dist::config::{
    ClusterConfig, CollectiveGroupConfig, DistributedContextConfiguration, JobConfig, TaskConfig,
};
use vortex_dist::error::{DistError, Result};
use vortex_dist::protocol::*;
use vortex_dist::remote::{CommunicatorFactory, RemoteClient, RemoteTarget};

/// Single-job cluster `worker` with `size` tasks, seen from task `local`
pub fn worker_cluster(size: u32, local: u32) -> DistributedContextConfiguration {
    DistributedContextConfiguration {
        job_name: "worker".into(),
        task_id: local,
        cluster: ClusterConfig {
            jobs: vec![JobConfig {
                name: "worker".into(),
                tasks: (0..size)
                    .map(|id| TaskConfig {
                        id,
                        address: format!("worker-{}:7000", id),
                    })
                    .collect(),
            }],
        },
        collective_groups: vec![],
    }
}

pub fn group(name: &str, members: &[&str]) -> CollectiveGroupConfig {
    CollectiveGroupConfig {
        name: name.into(),
        members: members.iter().map(|m| m.to_string()).collect(),
    }
}

/// A call observed by the mock transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create {
        task: String,
        context_id: u64,
        job_name: String,
        task_id: u32,
        payload: usize,
    },
    Close {
        task: String,
        context_id: u64,
        request: usize,
    },
}

impl Call {
    pub fn task(&self) -> &str {
        match self {
            Call::Create { task, .. } | Call::Close { task, .. } => task,
        }
    }
}

#[derive(Default)]
struct MockState {
    calls: Mutex<Vec<Call>>,
    failures: Mutex<HashMap<String, String>>,
    creation_failures: Mutex<HashMap<String, String>>,
    crashes: Mutex<HashSet<String>>,
    delays: Mutex<HashMap<String, Duration>>,
    created: Mutex<HashMap<String, usize>>,
    creation_delay: Mutex<Option<Duration>>,
}

/// Communicator that records every call and fails on demand
#[derive(Clone, Default)]
pub struct MockCommunicator {
    state: Arc<MockState>,
}

impl MockCommunicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, task: &str, message: &str) {
        self.state
            .failures
            .lock()
            .insert(task.to_string(), message.to_string());
    }

    /// Refuse to build a client for `task`
    pub fn fail_creation(&self, task: &str, message: &str) {
        self.state
            .creation_failures
            .lock()
            .insert(task.to_string(), message.to_string());
    }

    /// Panic inside calls to `task` instead of answering
    pub fn crash(&self, task: &str) {
        self.state.crashes.lock().insert(task.to_string());
    }

    pub fn delay(&self, task: &str, delay: Duration) {
        self.state.delays.lock().insert(task.to_string(), delay);
    }

    /// Slow down client creation to widen race windows
    pub fn slow_creation(&self, delay: Duration) {
        *self.state.creation_delay.lock() = Some(delay);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.calls.lock().clone()
    }

    pub fn clients_created(&self, task: &str) -> usize {
        self.state.created.lock().get(task).copied().unwrap_or(0)
    }
}

impl CommunicatorFactory for MockCommunicator {
    fn create_remote_client(&self, target: &RemoteTarget) -> Result<Arc<dyn RemoteClient>> {
        let delay = *self.state.creation_delay.lock();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        let failure = self
            .state
            .creation_failures
            .lock()
            .get(&target.task_name)
            .cloned();
        if let Some(message) = failure {
            return Err(DistError::rpc(&target.task_name, message));
        }
        *self
            .state
            .created
            .lock()
            .entry(target.task_name.clone())
            .or_insert(0) += 1;
        Ok(Arc::new(MockClient {
            state: self.state.clone(),
            task: target.task_name.clone(),
        }))
    }
}

struct MockClient {
    state: Arc<MockState>,
    task: String,
}

impl MockClient {
    async fn finish(&self) -> Result<()> {
        let delay = self.state.delays.lock().get(&self.task).copied();
        match delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => tokio::task::yield_now().await,
        }
        if self.state.crashes.lock().contains(&self.task) {
            panic!("client for {} crashed", self.task);
        }
        let failure = self.state.failures.lock().get(&self.task).cloned();
        match failure {
            Some(message) => Err(DistError::rpc(&self.task, message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteClient for MockClient {
    async fn create_context(&self, request: CreateContextRequest) -> Result<CreateContextResponse> {
        self.state.calls.lock().push(Call::Create {
            task: self.task.clone(),
            context_id: request.context_id,
            job_name: request.job_name.clone(),
            task_id: request.task_id,
            payload: Arc::as_ptr(&request.shared) as usize,
        });
        self.finish().await?;
        Ok(CreateContextResponse::default())
    }

    async fn close_context(
        &self,
        request: Arc<CloseContextRequest>,
    ) -> Result<CloseContextResponse> {
        self.state.calls.lock().push(Call::Close {
            task: self.task.clone(),
            context_id: request.context_id,
            request: Arc::as_ptr(&request) as usize,
        });
        self.finish().await?;
        Ok(CloseContextResponse::default())
    }
}
