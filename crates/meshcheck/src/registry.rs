//! Liveness registry: last-known descriptor per agent plus the shared
//! monotonic heartbeat version counter.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::cache::ExpiringMap;
use crate::error::{Error, Result};
use crate::models::{AgentDescriptor, LivenessRecord};

pub const DEFAULT_RECORD_TTL: Duration = Duration::from_secs(15);
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Records whose version lags the global counter by less than this many
/// heartbeats still count as active in the near-match fallback.
const NEAR_MATCH_WINDOW: i64 = 3;

pub struct LivenessRegistry {
    records: ExpiringMap<LivenessRecord>,
    /// Guards the read-increment-write of the global version counter,
    /// independent of the expiring map's own locking.
    version: Mutex<i64>,
    ttl: Duration,
}

impl Default for LivenessRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_RECORD_TTL)
    }
}

impl LivenessRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self { records: ExpiringMap::new(), version: Mutex::new(0), ttl }
    }

    fn version_lock(&self) -> MutexGuard<'_, i64> {
        self.version.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start the background sweep evicting expired records.
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        self.records.spawn_sweeper(every)
    }

    /// Record a heartbeat: validate the descriptor, bump the global
    /// version by exactly one, and overwrite the agent's record stamped
    /// with the new version. Returns the new version.
    pub fn upsert(&self, descriptor: AgentDescriptor) -> Result<i64> {
        descriptor.validate()?;

        let mut version = self.version_lock();
        *version += 1;

        let record = LivenessRecord { version: *version, last_heartbeat: Utc::now(), descriptor };
        self.records.insert(record.descriptor.agent_name.clone(), record, Some(self.ttl));

        Ok(*version)
    }

    pub fn get(&self, agent_name: &str) -> Result<LivenessRecord> {
        self.records
            .get(agent_name)
            .ok_or_else(|| Error::not_found(format!("agent {agent_name}")))
    }

    /// Snapshot of all non-expired records, keyed by agent name.
    pub fn list_all(&self) -> HashMap<String, LivenessRecord> {
        self.records.entries()
    }

    pub fn current_version(&self) -> i64 {
        *self.version_lock()
    }

    /// Heuristic count of currently active agents.
    ///
    /// The counter is global, so an exact version match is only possible
    /// for the most recent heartbeater; when fewer than half the records
    /// match exactly, agents within a small version window of the
    /// counter are counted instead. The thresholds are deliberate and
    /// load-bearing; the heuristic degrades below roughly three agents.
    pub fn active_count(&self) -> usize {
        let current = self.current_version();
        let records = self.list_all();
        if records.is_empty() {
            return 0;
        }

        let mut exact = 0usize;
        let mut near = 0usize;
        for record in records.values() {
            if record.version == current {
                exact += 1;
            }
            if (current - record.version).abs() < NEAR_MATCH_WINDOW {
                near += 1;
            }
        }

        if exact > records.len() / 2 {
            debug!(exact, total = records.len(), "active count from exact matches");
            exact
        } else {
            debug!(exact, near, total = records.len(), "active count from near matches");
            near
        }
    }

    /// Deduplicated node addresses of all live agents.
    pub fn host_addresses(&self) -> Vec<String> {
        self.collect_addresses(|record| &record.descriptor.node_addr)
    }

    /// Deduplicated agent addresses of all live agents.
    pub fn agent_addresses(&self) -> Vec<String> {
        self.collect_addresses(|record| &record.descriptor.agent_addr)
    }

    fn collect_addresses(&self, field: impl Fn(&LivenessRecord) -> &String) -> Vec<String> {
        let addrs: BTreeSet<String> = self
            .list_all()
            .values()
            .map(field)
            .filter(|addr| !addr.is_empty())
            .cloned()
            .collect();
        addrs.into_iter().collect()
    }
}
