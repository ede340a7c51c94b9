//! Per-process server state
//!
//! Registry of live distributed contexts plus the handlers that serve
//! create/close requests broadcast by other tasks.

pub mod device;

pub use device::{DeviceManager, RemoteDevice, DEFAULT_HOST_DEVICE_NAME};

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::config::DistributedContextConfiguration;
use crate::context::DistributedContext;
use crate::error::{DistError, Result};
use crate::metrics::standard;
use crate::protocol::{
    CloseContextRequest, CloseContextResponse, CreateContextRequest, CreateContextResponse,
};
use crate::remote::CommunicatorFactory;

/// State shared by every context hosted in one process
pub struct ServerContext {
    communicator: Arc<dyn CommunicatorFactory>,
    device_manager: DeviceManager,
    contexts: RwLock<HashMap<u64, Arc<DistributedContext>>>,
}

impl ServerContext {
    pub fn new(communicator: Arc<dyn CommunicatorFactory>) -> Self {
        Self {
            communicator,
            device_manager: DeviceManager::new(),
            contexts: RwLock::new(HashMap::new()),
        }
    }

    /// Factory used by hosted contexts to reach other tasks
    pub fn communicator(&self) -> Arc<dyn CommunicatorFactory> {
        self.communicator.clone()
    }

    pub fn device_manager(&self) -> &DeviceManager {
        &self.device_manager
    }

    /// Build and register a new context.
    ///
    /// Once registered, one remote device per cluster task is added to the
    /// device manager.
    pub fn create_distributed_context(
        &self,
        context_id: u64,
        config: DistributedContextConfiguration,
    ) -> Result<Arc<DistributedContext>> {
        if self.contexts.read().contains_key(&context_id) {
            return Err(DistError::ContextAlreadyExists { context_id });
        }

        // Built outside the lock; the insert below re-checks the id.
        let context = Arc::new(DistributedContext::new(context_id, self, config)?);

        let mut contexts = self.contexts.write();
        if contexts.contains_key(&context_id) {
            return Err(DistError::ContextAlreadyExists { context_id });
        }
        contexts.insert(context_id, context.clone());
        drop(contexts);
        standard::ACTIVE_CONTEXTS.inc();

        for entry in context.cluster_info().tasks() {
            self.device_manager
                .maybe_add_device(RemoteDevice::for_task(entry));
        }
        Ok(context)
    }

    pub fn get_distributed_context(&self, context_id: u64) -> Result<Arc<DistributedContext>> {
        self.contexts
            .read()
            .get(&context_id)
            .cloned()
            .ok_or(DistError::ContextNotFound { context_id })
    }

    /// Unregister a context; it is destroyed once the last caller releases it
    pub fn close_distributed_context(&self, context_id: u64) -> Result<()> {
        self.contexts
            .write()
            .remove(&context_id)
            .ok_or(DistError::ContextNotFound { context_id })?;
        standard::ACTIVE_CONTEXTS.dec();
        info!("Closed distributed context {}", context_id);
        Ok(())
    }

    pub fn context_count(&self) -> usize {
        self.contexts.read().len()
    }

    /// Serve a create request broadcast by another task
    pub fn handle_create_context(
        &self,
        request: CreateContextRequest,
    ) -> Result<CreateContextResponse> {
        debug!(
            "Create request for context {} as /job:{}/task:{}",
            request.context_id, request.job_name, request.task_id
        );
        self.create_distributed_context(request.context_id, request.dist_config())?;
        Ok(CreateContextResponse::default())
    }

    /// Serve a close request broadcast by another task
    pub fn handle_close_context(
        &self,
        request: &CloseContextRequest,
    ) -> Result<CloseContextResponse> {
        self.close_distributed_context(request.context_id)?;
        Ok(CloseContextResponse::default())
    }
}

impl Drop for ServerContext {
    fn drop(&mut self) {
        standard::ACTIVE_CONTEXTS.sub(self.contexts.get_mut().len() as i64);
    }
}
