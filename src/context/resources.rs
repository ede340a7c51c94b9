//! Per-context resources
//!
//! Owned by a [`DistributedContext`](super::DistributedContext) for its
//! lifetime. The coordination logic only constructs them; execution code
//! uses them through the context accessors.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use parking_lot::RwLock;

use crate::cluster::TaskHandle;

/// Identifier of an object that lives on some task of the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RemoteObjectId {
    /// Task that allocated the id
    pub prefix: TaskHandle,
    pub local_id: u64,
}

/// Allocates object ids unique within one context
pub struct RemoteObjectManager {
    task: TaskHandle,
    next_id: AtomicU64,
}

impl RemoteObjectManager {
    pub fn new(task: TaskHandle) -> Self {
        Self {
            task,
            next_id: AtomicU64::new(0),
        }
    }

    pub fn next_object_id(&self) -> RemoteObjectId {
        RemoteObjectId {
            prefix: self.task,
            local_id: self.next_id.fetch_add(1, Ordering::Relaxed),
        }
    }
}

/// Programs registered with this context, keyed by name
#[derive(Default)]
pub struct FunctionCache {
    functions: RwLock<HashMap<String, Bytes>>,
}

impl FunctionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a program; returns false if the name is already taken
    pub fn register(&self, name: impl Into<String>, program: Bytes) -> bool {
        let mut functions = self.functions.write();
        let name = name.into();
        if functions.contains_key(&name) {
            return false;
        }
        functions.insert(name, program);
        true
    }

    pub fn get(&self, name: &str) -> Option<Bytes> {
        self.functions.read().get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.functions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_cache_keeps_first_registration() {
        let cache = FunctionCache::new();
        assert!(cache.register("main", Bytes::from_static(b"v1")));
        assert!(!cache.register("main", Bytes::from_static(b"v2")));
        assert_eq!(cache.get("main").unwrap(), Bytes::from_static(b"v1"));
        assert!(cache.get("other").is_none());
        assert_eq!(cache.len(), 1);
    }
}
