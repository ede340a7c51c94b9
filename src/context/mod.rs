//! Distributed contexts
//!
//! Session coordinator, fan-in completion and per-context resources.

pub mod callback;
pub mod distributed;
pub mod resources;

pub use callback::{CallbackFn, OutcomeGuard, RefCountedCallback};
pub use distributed::DistributedContext;
pub use resources::{FunctionCache, RemoteObjectId, RemoteObjectManager};
