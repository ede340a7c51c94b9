//! Vortex Dist - distributed context coordination
//!
//! This crate coordinates sessions spanning every task of a cluster:
//! - Task naming and task handle resolution
//! - Collective group registration
//! - Lazily created, per-session remote clients
//! - Broadcast creation and teardown of remote contexts

pub mod cluster;
pub mod config;
pub mod context;
pub mod error;
pub mod metrics;
pub mod protocol;
pub mod remote;
pub mod server;

pub use cluster::{ClusterInfo, CollectiveGroup, TaskHandle};
pub use config::DistributedContextConfiguration;
pub use context::{DistributedContext, RefCountedCallback};
pub use error::{DistError, Result};
pub use server::ServerContext;
