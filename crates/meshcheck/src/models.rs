use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Outcome of the liveness (ping) check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PingStatus {
    Reachable,
    Unreachable,
}

impl std::fmt::Display for PingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PingStatus::Reachable => write!(f, "reachable"),
            PingStatus::Unreachable => write!(f, "unreachable"),
        }
    }
}

/// Outcome of a TCP port check.
///
/// `Unknown` only appears in reduced statuses when a result carried no
/// port map at all; the probe engine always records exactly one port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortState {
    Open,
    Closed,
    Unknown,
}

impl std::fmt::Display for PortState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortState::Open => write!(f, "open"),
            PortState::Closed => write!(f, "closed"),
            PortState::Unknown => write!(f, "unknown"),
        }
    }
}

/// Identity of one probing agent, self-reported on every heartbeat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDescriptor {
    pub namespace: String,
    pub node_addr: String,
    pub agent_addr: String,
    pub agent_name: String,
    pub observed_at: DateTime<Utc>,
}

impl AgentDescriptor {
    /// Reject descriptors missing any of the required identity fields
    /// before they reach the registry.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.node_addr.is_empty() {
            missing.push("node_addr");
        }
        if self.agent_addr.is_empty() {
            missing.push("agent_addr");
        }
        if self.agent_name.is_empty() {
            missing.push("agent_name");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::validation(format!("missing required fields: {}", missing.join(", "))))
        }
    }
}

/// One registry entry per distinct agent name, overwritten on every
/// heartbeat and evicted when its TTL elapses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessRecord {
    pub descriptor: AgentDescriptor,
    pub version: i64,
    pub last_heartbeat: DateTime<Utc>,
}

/// Result of probing a single target: liveness signal plus one TCP port.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectivityResult {
    pub source_addr: String,
    pub target_addr: String,
    pub ping_status: PingStatus,
    /// port -> open/closed; the engine records exactly one port per probe
    pub port_status: BTreeMap<u16, PortState>,
    /// Ping wall-clock divided by attempt count on success, zero otherwise
    pub latency: Duration,
    /// Wall-clock span of this target's combined liveness+port check
    pub test_duration: Duration,
    pub observed_at: DateTime<Utc>,
}

impl ConnectivityResult {
    /// Lossy projection keeping only the first port's state.
    pub fn reduced(&self) -> TestStatus {
        let port = self.port_status.values().next().copied().unwrap_or(PortState::Unknown);
        TestStatus { ping: self.ping_status, port, test_duration: self.test_duration }
    }

    /// A probe counts as successful when the target answered the ping
    /// and the checked port was open.
    pub fn succeeded(&self) -> bool {
        self.ping_status == PingStatus::Reachable
            && self.port_status.values().next() == Some(&PortState::Open)
    }
}

/// Reduced per-target status kept in the host/agent snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestStatus {
    pub ping: PingStatus,
    pub port: PortState,
    pub test_duration: Duration,
}

/// source address -> target address -> reduced status
pub type HostTestResults = HashMap<String, HashMap<String, TestStatus>>;

/// source address -> target address -> reduced status
pub type AgentTestResults = HashMap<String, HashMap<String, TestStatus>>;

/// source address -> full result for the configured named service
pub type ServiceTestResults = HashMap<String, ConnectivityResult>;

/// Aggregate view over the registry and result store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkReport {
    pub timestamp: DateTime<Utc>,
    pub active_agent_count: usize,
    pub host_addrs: Vec<String>,
    pub agent_addrs: Vec<String>,
    pub host_test_summary: TestSummary,
    pub agent_test_summary: TestSummary,
    pub service_test_summary: ServiceTestSummary,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestSummary {
    pub total_tests: usize,
    pub successful_tests: usize,
    pub failed_tests: usize,
    pub success_rate: f64,
    pub avg_test_duration: Duration,
    pub total_test_duration: Duration,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceTestSummary {
    pub service_name: String,
    pub total_tests: usize,
    pub successful_tests: usize,
    pub failed_tests: usize,
    pub success_rate: f64,
}
