//! Aggregated network report over the registry and result store.

use std::collections::HashMap;

use chrono::Utc;

use crate::models::{
    NetworkReport, PingStatus, PortState, ServiceTestResults, ServiceTestSummary, TestStatus,
    TestSummary,
};
use crate::registry::LivenessRegistry;
use crate::store::ResultStore;

pub fn generate(registry: &LivenessRegistry, store: &ResultStore) -> NetworkReport {
    NetworkReport {
        timestamp: Utc::now(),
        active_agent_count: registry.active_count(),
        host_addrs: registry.host_addresses(),
        agent_addrs: registry.agent_addresses(),
        host_test_summary: summarize(&store.host_results()),
        agent_test_summary: summarize(&store.agent_results()),
        service_test_summary: summarize_service(&store.service_results()),
    }
}

fn summarize(results: &HashMap<String, HashMap<String, TestStatus>>) -> TestSummary {
    let mut summary = TestSummary::default();

    for targets in results.values() {
        for status in targets.values() {
            summary.total_tests += 1;
            summary.total_test_duration += status.test_duration;
            if status.ping == PingStatus::Reachable && status.port == PortState::Open {
                summary.successful_tests += 1;
            } else {
                summary.failed_tests += 1;
            }
        }
    }

    if summary.total_tests > 0 {
        summary.success_rate =
            summary.successful_tests as f64 / summary.total_tests as f64 * 100.0;
        summary.avg_test_duration = summary.total_test_duration / summary.total_tests as u32;
    }

    summary
}

fn summarize_service(results: &ServiceTestResults) -> ServiceTestSummary {
    let mut summary = ServiceTestSummary::default();

    for result in results.values() {
        summary.total_tests += 1;
        if summary.service_name.is_empty() && !result.target_addr.is_empty() {
            summary.service_name = result.target_addr.clone();
        }
        if result.succeeded() {
            summary.successful_tests += 1;
        } else {
            summary.failed_tests += 1;
        }
    }

    if summary.total_tests > 0 {
        summary.success_rate =
            summary.successful_tests as f64 / summary.total_tests as f64 * 100.0;
    }

    summary
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use super::*;
    use crate::models::{AgentDescriptor, ConnectivityResult};

    fn result(target: &str, reachable: bool, open: bool) -> ConnectivityResult {
        let mut ports = BTreeMap::new();
        ports.insert(22u16, if open { PortState::Open } else { PortState::Closed });
        ConnectivityResult {
            source_addr: "10.0.0.1".into(),
            target_addr: target.into(),
            ping_status: if reachable { PingStatus::Reachable } else { PingStatus::Unreachable },
            port_status: ports,
            latency: Duration::from_millis(2),
            test_duration: Duration::from_millis(100),
            observed_at: Utc::now(),
        }
    }

    #[test]
    fn summary_counts_successes_and_averages_duration() {
        let store = ResultStore::new();
        store
            .save_host_results(
                "10.0.0.1",
                &[result("10.0.0.2", true, true), result("10.0.0.3", true, false)],
            )
            .unwrap();

        let summary = summarize(&store.host_results());
        assert_eq!(summary.total_tests, 2);
        assert_eq!(summary.successful_tests, 1);
        assert_eq!(summary.failed_tests, 1);
        assert!((summary.success_rate - 50.0).abs() < f64::EPSILON);
        assert_eq!(summary.avg_test_duration, Duration::from_millis(100));
    }

    #[test]
    fn report_aggregates_registry_and_store() {
        let registry = LivenessRegistry::default();
        registry
            .upsert(AgentDescriptor {
                namespace: "fleet".into(),
                node_addr: "10.0.0.1".into(),
                agent_addr: "10.1.0.1".into(),
                agent_name: "agent-a".into(),
                observed_at: Utc::now(),
            })
            .unwrap();

        let store = ResultStore::new();
        store
            .save_service_result("10.1.0.1", result("svc.cluster.local", true, true))
            .unwrap();

        let report = generate(&registry, &store);
        assert_eq!(report.active_agent_count, 1);
        assert_eq!(report.host_addrs, vec!["10.0.0.1".to_string()]);
        assert_eq!(report.service_test_summary.service_name, "svc.cluster.local");
        assert_eq!(report.service_test_summary.successful_tests, 1);
    }
}
