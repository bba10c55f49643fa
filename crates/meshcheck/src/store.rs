//! Latest probe-result snapshot per reporting source.
//!
//! Each save replaces the source's entire prior snapshot; there is no
//! per-target merge. Snapshots never expire, only liveness records do.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{Error, Result};
use crate::models::{
    AgentTestResults, ConnectivityResult, HostTestResults, ServiceTestResults, TestStatus,
};

#[derive(Default)]
pub struct ResultStore {
    hosts: Mutex<HostTestResults>,
    agents: Mutex<AgentTestResults>,
    services: Mutex<ServiceTestResults>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Reduce a result list to the per-target map stored in host/agent
/// snapshots. Results without a target address are dropped.
fn reduce(results: &[ConnectivityResult]) -> HashMap<String, TestStatus> {
    results
        .iter()
        .filter(|result| !result.target_addr.is_empty())
        .map(|result| (result.target_addr.clone(), result.reduced()))
        .collect()
}

fn require_source(source_addr: &str) -> Result<()> {
    if source_addr.is_empty() {
        Err(Error::validation("source address must not be empty"))
    } else {
        Ok(())
    }
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_host_results(
        &self,
        source_addr: &str,
        results: &[ConnectivityResult],
    ) -> Result<()> {
        require_source(source_addr)?;
        lock(&self.hosts).insert(source_addr.to_string(), reduce(results));
        Ok(())
    }

    pub fn save_agent_results(
        &self,
        source_addr: &str,
        results: &[ConnectivityResult],
    ) -> Result<()> {
        require_source(source_addr)?;
        lock(&self.agents).insert(source_addr.to_string(), reduce(results));
        Ok(())
    }

    /// The service result is stored verbatim, multi-port map included.
    pub fn save_service_result(&self, source_addr: &str, result: ConnectivityResult) -> Result<()> {
        require_source(source_addr)?;
        lock(&self.services).insert(source_addr.to_string(), result);
        Ok(())
    }

    pub fn host_results(&self) -> HostTestResults {
        lock(&self.hosts).clone()
    }

    pub fn agent_results(&self) -> AgentTestResults {
        lock(&self.agents).clone()
    }

    pub fn service_results(&self) -> ServiceTestResults {
        lock(&self.services).clone()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use chrono::Utc;

    use super::*;
    use crate::models::{PingStatus, PortState};

    fn result(target: &str, port: u16, open: bool) -> ConnectivityResult {
        let mut ports = BTreeMap::new();
        ports.insert(port, if open { PortState::Open } else { PortState::Closed });
        ConnectivityResult {
            source_addr: "10.0.0.1".into(),
            target_addr: target.into(),
            ping_status: PingStatus::Reachable,
            port_status: ports,
            latency: Duration::from_millis(3),
            test_duration: Duration::from_millis(40),
            observed_at: Utc::now(),
        }
    }

    #[test]
    fn save_replaces_prior_snapshot() {
        let store = ResultStore::new();
        store
            .save_host_results("10.0.0.1", &[result("10.0.0.2", 22, true), result("10.0.0.3", 22, false)])
            .unwrap();
        store.save_host_results("10.0.0.1", &[result("10.0.0.4", 22, true)]).unwrap();

        let snapshot = store.host_results();
        let targets = &snapshot["10.0.0.1"];
        assert_eq!(targets.len(), 1);
        assert!(targets.contains_key("10.0.0.4"));
    }

    #[test]
    fn empty_source_is_rejected() {
        let store = ResultStore::new();
        assert!(matches!(
            store.save_host_results("", &[]),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            store.save_agent_results("", &[]),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            store.save_service_result("", result("10.0.0.2", 80, true)),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn reduction_keeps_first_port_only() {
        let mut multi = result("10.0.0.2", 22, true);
        multi.port_status.insert(80, PortState::Closed);

        let store = ResultStore::new();
        store.save_host_results("10.0.0.1", &[multi]).unwrap();

        let snapshot = store.host_results();
        assert_eq!(snapshot["10.0.0.1"]["10.0.0.2"].port, PortState::Open);
    }

    #[test]
    fn targets_without_address_are_dropped() {
        let store = ResultStore::new();
        store.save_agent_results("10.0.0.1", &[result("", 6100, true)]).unwrap();
        assert!(store.agent_results()["10.0.0.1"].is_empty());
    }

    #[test]
    fn service_result_is_stored_verbatim() {
        let mut multi = result("svc.cluster.local", 80, true);
        multi.port_status.insert(443, PortState::Closed);

        let store = ResultStore::new();
        store.save_service_result("10.0.0.1", multi.clone()).unwrap();

        let snapshot = store.service_results();
        assert_eq!(snapshot["10.0.0.1"].port_status.len(), 2);
        assert_eq!(snapshot["10.0.0.1"].target_addr, "svc.cluster.local");
    }
}
