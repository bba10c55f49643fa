//! Concurrent connectivity probing: a liveness (ping) signal plus a TCP
//! port check per target, fanned out under a bounded concurrency budget.

mod engine;
mod prober;

pub use engine::{ProbeConfig, ProbeEngine};
pub use prober::{PingOutcome, Prober, SystemProber};
