//! Per-session remote client cache
//!
//! Clients are created on first use and kept for the life of the session.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use super::client::RemoteClient;
use crate::cluster::TaskHandle;
use crate::error::Result;
use crate::metrics::standard;

/// Maps task handles to their remote clients
pub struct RemoteClientCache {
    // Held across creation: exactly one client per handle.
    clients: Mutex<HashMap<TaskHandle, Arc<dyn RemoteClient>>>,
}

impl RemoteClientCache {
    pub fn new() -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached client for `handle`, creating it with `create` on first use
    pub fn get_or_create<F>(&self, handle: TaskHandle, create: F) -> Result<Arc<dyn RemoteClient>>
    where
        F: FnOnce() -> Result<Arc<dyn RemoteClient>>,
    {
        let mut clients = self.clients.lock();
        if let Some(client) = clients.get(&handle) {
            return Ok(client.clone());
        }

        let client = create()?;
        clients.insert(handle, client.clone());
        standard::REMOTE_CLIENTS.inc();
        debug!("Created remote client for {}", handle);
        Ok(client)
    }

    pub fn contains(&self, handle: TaskHandle) -> bool {
        self.clients.lock().contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.clients.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.lock().is_empty()
    }
}

impl Default for RemoteClientCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RemoteClientCache {
    fn drop(&mut self) {
        standard::REMOTE_CLIENTS.sub(self.clients.get_mut().len() as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DistError;
    use crate::protocol::*;
    use async_trait::async_trait;

    struct NoopClient;

    #[async_trait]
    impl RemoteClient for NoopClient {
        async fn create_context(&self, _: CreateContextRequest) -> Result<CreateContextResponse> {
            Ok(CreateContextResponse::default())
        }

        async fn close_context(
            &self,
            _: Arc<CloseContextRequest>,
        ) -> Result<CloseContextResponse> {
            Ok(CloseContextResponse::default())
        }
    }

    fn handles() -> (TaskHandle, TaskHandle) {
        use crate::config::*;
        let config = DistributedContextConfiguration {
            job_name: "w".into(),
            task_id: 0,
            cluster: ClusterConfig {
                jobs: vec![JobConfig {
                    name: "w".into(),
                    tasks: vec![
                        TaskConfig { id: 0, address: "a".into() },
                        TaskConfig { id: 1, address: "b".into() },
                    ],
                }],
            },
            collective_groups: vec![],
        };
        let info = crate::cluster::ClusterInfo::new(&config).unwrap();
        (
            info.get_task_handle("w", 0).unwrap(),
            info.get_task_handle("w", 1).unwrap(),
        )
    }

    #[test]
    fn test_reuses_client() {
        let (a, b) = handles();
        let cache = RemoteClientCache::new();

        let first = cache.get_or_create(a, || Ok(Arc::new(NoopClient))).unwrap();
        let again = cache
            .get_or_create(a, || panic!("client must come from the cache"))
            .unwrap();
        assert!(Arc::ptr_eq(&first, &again));

        cache.get_or_create(b, || Ok(Arc::new(NoopClient))).unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_failed_creation_is_not_cached() {
        let (a, _) = handles();
        let cache = RemoteClientCache::new();

        let err = cache
            .get_or_create(a, || Err(DistError::rpc("/job:w/task:0", "bad address")))
            .err()
            .unwrap();
        assert!(matches!(err, DistError::Rpc { .. }));
        assert!(!cache.contains(a));

        cache.get_or_create(a, || Ok(Arc::new(NoopClient))).unwrap();
        assert!(cache.contains(a));
    }
}
