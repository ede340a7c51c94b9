//! In-process fabric
//!
//! Routes context requests to [`ServerContext`]s living in the same
//! process, addressed by task name. Lets a whole cluster run inside one
//! binary or test; supports per-task fault injection.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use super::client::{CommunicatorFactory, RemoteClient, RemoteTarget};
use crate::error::{DistError, Result};
use crate::protocol::{
    CloseContextRequest, CloseContextResponse, CreateContextRequest, CreateContextResponse,
};
use crate::server::ServerContext;

#[derive(Default)]
struct FabricInner {
    servers: RwLock<HashMap<String, Weak<ServerContext>>>,
    faults: RwLock<HashMap<String, String>>,
    delivered: AtomicU64,
}

/// Communicator connecting servers of one process
#[derive(Clone, Default)]
pub struct InProcessFabric {
    inner: Arc<FabricInner>,
}

impl InProcessFabric {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `server` reachable as `task_name`
    pub fn register(&self, task_name: impl Into<String>, server: &Arc<ServerContext>) {
        let task_name = task_name.into();
        debug!("Fabric serving {}", task_name);
        self.inner
            .servers
            .write()
            .insert(task_name, Arc::downgrade(server));
    }

    pub fn deregister(&self, task_name: &str) {
        self.inner.servers.write().remove(task_name);
    }

    /// Fail every call to `task_name` with `message` until cleared
    pub fn inject_failure(&self, task_name: impl Into<String>, message: impl Into<String>) {
        self.inner
            .faults
            .write()
            .insert(task_name.into(), message.into());
    }

    pub fn clear_failure(&self, task_name: &str) {
        self.inner.faults.write().remove(task_name);
    }

    /// Number of requests handed to a server so far
    pub fn delivered(&self) -> u64 {
        self.inner.delivered.load(Ordering::Relaxed)
    }
}

impl CommunicatorFactory for InProcessFabric {
    fn create_remote_client(&self, target: &RemoteTarget) -> Result<Arc<dyn RemoteClient>> {
        Ok(Arc::new(InProcessClient {
            fabric: self.inner.clone(),
            task_name: target.task_name.clone(),
        }))
    }
}

struct InProcessClient {
    fabric: Arc<FabricInner>,
    task_name: String,
}

impl InProcessClient {
    /// Resolve the destination server, honouring injected faults
    async fn route(&self) -> Result<Arc<ServerContext>> {
        // Complete asynchronously, like a network round trip would.
        tokio::task::yield_now().await;

        let fault = self.fabric.faults.read().get(&self.task_name).cloned();
        if let Some(message) = fault {
            return Err(DistError::rpc(&self.task_name, message));
        }
        let server = self
            .fabric
            .servers
            .read()
            .get(&self.task_name)
            .and_then(Weak::upgrade)
            .ok_or_else(|| DistError::rpc(&self.task_name, "unavailable: no server listening"))?;
        self.fabric.delivered.fetch_add(1, Ordering::Relaxed);
        Ok(server)
    }
}

#[async_trait]
impl RemoteClient for InProcessClient {
    async fn create_context(&self, request: CreateContextRequest) -> Result<CreateContextResponse> {
        let server = self.route().await?;
        server
            .handle_create_context(request)
            .map_err(|e| DistError::rpc(&self.task_name, e.to_string()))
    }

    async fn close_context(
        &self,
        request: Arc<CloseContextRequest>,
    ) -> Result<CloseContextResponse> {
        let server = self.route().await?;
        server
            .handle_close_context(&request)
            .map_err(|e| DistError::rpc(&self.task_name, e.to_string()))
    }
}
