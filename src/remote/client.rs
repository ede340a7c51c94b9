//! Remote client contracts
//!
//! The transport that actually carries requests between tasks is supplied
//! by the embedding application through these traits.

use std::sync::Arc;

use async_trait::async_trait;

use crate::cluster::TaskHandle;
use crate::error::Result;
use crate::protocol::{
    CloseContextRequest, CloseContextResponse, CreateContextRequest, CreateContextResponse,
};

/// Client for one remote task within one distributed context.
///
/// Each call resolves exactly once, with the response or the error the
/// transport observed.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    async fn create_context(&self, request: CreateContextRequest) -> Result<CreateContextResponse>;

    async fn close_context(
        &self,
        request: Arc<CloseContextRequest>,
    ) -> Result<CloseContextResponse>;
}

/// Everything a communicator needs to reach a remote task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    pub context_id: u64,
    pub handle: TaskHandle,
    pub task_name: String,
    pub address: String,
}

/// Creates remote clients on demand
pub trait CommunicatorFactory: Send + Sync {
    fn create_remote_client(&self, target: &RemoteTarget) -> Result<Arc<dyn RemoteClient>>;
}
