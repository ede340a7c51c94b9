//! Distributed context
//!
//! Root coordinator of one session. Owns the resolved cluster, the
//! collective groups and the remote client cache, and broadcasts context
//! creation and teardown to every other task.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::callback::RefCountedCallback;
use super::resources::{FunctionCache, RemoteObjectManager};
use crate::cluster::{ClusterInfo, CollectiveGroup, CollectiveGroups, TaskEntry, TaskHandle};
use crate::config::DistributedContextConfiguration;
use crate::error::{DistError, Result};
use crate::metrics::standard;
use crate::protocol::{CloseContextRequest, CreateContextRequest, SharedContextPayload};
use crate::remote::{CommunicatorFactory, RemoteClient, RemoteClientCache, RemoteTarget};
use crate::server::ServerContext;

/// One coordinated session spanning every task of the cluster
pub struct DistributedContext {
    context_id: u64,
    config: Arc<DistributedContextConfiguration>,
    cluster_info: ClusterInfo,
    collective_groups: CollectiveGroups,
    communicator: Arc<dyn CommunicatorFactory>,
    remote_clients: RemoteClientCache,
    remote_manager: RemoteObjectManager,
    function_cache: FunctionCache,
}

impl DistributedContext {
    /// Build the local side of a session.
    ///
    /// Fails if any collective-group member cannot be resolved.
    pub fn new(
        context_id: u64,
        server: &ServerContext,
        config: DistributedContextConfiguration,
    ) -> Result<Self> {
        let cluster_info = ClusterInfo::new(&config)?;
        let collective_groups = CollectiveGroups::initialize(&config, &cluster_info)?;

        info!(
            "Created distributed context {} on {} ({} tasks, {} collective groups)",
            context_id,
            cluster_info.task_name(cluster_info.task_handle())?,
            cluster_info.len(),
            collective_groups.len()
        );

        Ok(Self {
            context_id,
            remote_manager: RemoteObjectManager::new(cluster_info.task_handle()),
            config: Arc::new(config),
            cluster_info,
            collective_groups,
            communicator: server.communicator(),
            remote_clients: RemoteClientCache::new(),
            function_cache: FunctionCache::new(),
        })
    }

    pub fn context_id(&self) -> u64 {
        self.context_id
    }

    pub fn config(&self) -> &DistributedContextConfiguration {
        &self.config
    }

    pub fn cluster_info(&self) -> &ClusterInfo {
        &self.cluster_info
    }

    /// Handle of the local task
    pub fn task_handle(&self) -> TaskHandle {
        self.cluster_info.task_handle()
    }

    pub fn get_task_handle(&self, job_name: &str, task_id: u32) -> Result<TaskHandle> {
        self.cluster_info.get_task_handle(job_name, task_id)
    }

    pub fn get_collective_group(&self, name: &str) -> Result<&CollectiveGroup> {
        self.collective_groups.get(name)
    }

    pub fn collective_groups(&self) -> &CollectiveGroups {
        &self.collective_groups
    }

    pub fn remote_object_manager(&self) -> &RemoteObjectManager {
        &self.remote_manager
    }

    pub fn function_cache(&self) -> &FunctionCache {
        &self.function_cache
    }

    /// Client for `handle`, created through the communicator on first use
    pub fn get_remote_client(&self, handle: TaskHandle) -> Result<Arc<dyn RemoteClient>> {
        self.remote_clients.get_or_create(handle, || {
            let entry = self.cluster_info.task(handle)?;
            let target = RemoteTarget {
                context_id: self.context_id,
                handle,
                task_name: entry.task_name(),
                address: entry.address.clone(),
            };
            self.communicator.create_remote_client(&target)
        })
    }

    pub fn remote_clients(&self) -> &RemoteClientCache {
        &self.remote_clients
    }

    /// Create this context on every other task.
    ///
    /// Returns immediately; `done` fires exactly once after every task has
    /// answered, with the first error observed if any call failed. Must be
    /// called from within a Tokio runtime.
    pub fn create_remote_contexts<F>(&self, done: F)
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        let context_id = self.context_id;
        let shared = Arc::new(SharedContextPayload::from_config(&self.config));

        self.broadcast("create", done, move |entry, client| {
            let request = CreateContextRequest {
                context_id,
                job_name: entry.job_name.clone(),
                task_id: entry.task_id,
                shared: shared.clone(),
            };
            async move { client.create_context(request).await.map(|_| ()) }
        });
    }

    /// Close this context on every other task.
    ///
    /// Same completion contract as [`create_remote_contexts`](Self::create_remote_contexts).
    pub fn close_remote_contexts<F>(&self, done: F)
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        let request = Arc::new(CloseContextRequest {
            context_id: self.context_id,
        });

        self.broadcast("close", done, move |_, client| {
            let request = request.clone();
            async move { client.close_context(request).await.map(|_| ()) }
        });
    }

    /// Awaitable form of [`create_remote_contexts`](Self::create_remote_contexts)
    pub async fn create_remote_contexts_async(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.create_remote_contexts(move |outcome| {
            let _ = tx.send(outcome);
        });
        rx.await
            .map_err(|_| DistError::internal("create broadcast dropped its completion"))?
    }

    /// Awaitable form of [`close_remote_contexts`](Self::close_remote_contexts)
    pub async fn close_remote_contexts_async(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.close_remote_contexts(move |outcome| {
            let _ = tx.send(outcome);
        });
        rx.await
            .map_err(|_| DistError::internal("close broadcast dropped its completion"))?
    }

    /// Issue one call per remote task and fold the outcomes into `done`
    fn broadcast<D, C, Fut>(&self, op: &'static str, done: D, mut call: C)
    where
        D: FnOnce(Result<()>) + Send + 'static,
        C: FnMut(&TaskEntry, Arc<dyn RemoteClient>) -> Fut,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        standard::BROADCASTS.inc();
        let context_id = self.context_id;
        let started = Instant::now();

        let rc_done = RefCountedCallback::new(move |outcome: Result<()>| {
            standard::BROADCAST_DURATION.observe(started.elapsed().as_secs_f64());
            match &outcome {
                Ok(()) => info!("Broadcast {} for context {} complete", op, context_id),
                Err(e) => warn!("Broadcast {} for context {} failed: {}", op, context_id, e),
            }
            done(outcome);
        });

        let mut issued = 0usize;
        for entry in self.cluster_info.remote_tasks() {
            issued += 1;
            standard::REMOTE_CALLS.inc();
            let task_name = entry.task_name();

            let client = match self.get_remote_client(entry.handle) {
                Ok(client) => client,
                Err(e) => {
                    standard::REMOTE_CALL_FAILURES.inc();
                    warn!("No client for {}: {}", task_name, e);
                    rc_done.update_state(Err(e));
                    continue;
                }
            };

            debug!("Sending {} context {} to {}", op, context_id, task_name);
            let pending = call(entry, client);
            // Records an error if the call panics or is cancelled.
            let guard = rc_done.guard(format!("{} call to {}", op, task_name));
            tokio::spawn(async move {
                let outcome = pending.await;
                if let Err(e) = &outcome {
                    standard::REMOTE_CALL_FAILURES.inc();
                    warn!("{} context {} on {} failed: {}", op, context_id, task_name, e);
                }
                guard.complete(outcome);
            });
        }

        debug!("Issued {} {} calls for context {}", issued, op, context_id);
        // Release the local reference from the runtime so `done` never runs
        // on the caller's stack, even with no peers or no usable client.
        tokio::spawn(async move { drop(rc_done) });
    }
}
