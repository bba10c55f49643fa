//! meshcheck - fleet liveness tracking and mesh connectivity probing
//!
//! Agents heartbeat their identity to a central observer, which tracks
//! liveness through a shared monotonic version counter with TTL-based
//! eviction. Each agent periodically probes reachability (ping + one
//! TCP port) toward every peer under a bounded concurrency budget and
//! reports the results back for aggregation.

pub mod api;
pub mod cache;
pub mod collector;
pub mod config;
pub mod error;
pub mod heartbeat;
pub mod models;
pub mod probe;
pub mod registry;
pub mod report;
pub mod scheduler;
pub mod store;

pub use error::{Error, Result};
pub use models::{AgentDescriptor, ConnectivityResult, LivenessRecord, TestStatus};
pub use probe::{ProbeConfig, ProbeEngine};
pub use registry::LivenessRegistry;
pub use store::ResultStore;
