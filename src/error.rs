//! Error types for distributed context coordination
//!
//! Covers configuration and lookup failures, per-task RPC failures,
//! and server-side context registry errors.

use thiserror::Error;

/// Primary error type for all coordination operations
#[derive(Debug, Error)]
pub enum DistError {
    // ========== Configuration Errors ==========

    /// Malformed input such as an unparsable task name
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// (job, task) pair is not part of the cluster
    #[error("Task /job:{job}/task:{task_id} not found in cluster configuration")]
    TaskNotFound { job: String, task_id: u32 },

    /// Collective group was never registered for this session
    #[error("Collective group not found: {name}")]
    CollectiveGroupNotFound { name: String },

    /// Configuration could not be loaded or parsed
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // ========== Remote Errors ==========

    /// A call to a single remote task failed
    #[error("RPC to {task} failed: {message}")]
    Rpc { task: String, message: String },

    // ========== Server Errors ==========

    /// No live context with this id on the server
    #[error("Distributed context {context_id} not found")]
    ContextNotFound { context_id: u64 },

    /// A live context already uses this id
    #[error("Distributed context {context_id} already exists")]
    ContextAlreadyExists { context_id: u64 },

    /// Internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DistError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn rpc(task: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rpc {
            task: task.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if retrying the same operation may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, DistError::Rpc { .. })
    }

    /// Returns true if this error stems from bad cluster or session configuration
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            DistError::InvalidArgument { .. }
                | DistError::TaskNotFound { .. }
                | DistError::CollectiveGroupNotFound { .. }
                | DistError::Config { .. }
        )
    }
}

/// Result type alias for coordination operations
pub type Result<T> = std::result::Result<T, DistError>;
