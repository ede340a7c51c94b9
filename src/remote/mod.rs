//! Remote task access
//!
//! Transport contracts, the per-session client cache and an in-process
//! fabric for single-binary clusters.

pub mod cache;
pub mod client;
pub mod fabric;

pub use cache::RemoteClientCache;
pub use client::{CommunicatorFactory, RemoteClient, RemoteTarget};
pub use fabric::InProcessFabric;
