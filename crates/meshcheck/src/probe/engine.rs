use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::prober::Prober;
use crate::error::{Error, Result};
use crate::models::{ConnectivityResult, PingStatus, PortState};

#[derive(Debug, Clone, Copy)]
pub struct ProbeConfig {
    /// Ping attempts per target
    pub ping_attempts: u32,
    /// Hard ceiling on one target's whole liveness check
    pub ping_deadline: Duration,
    /// Timeout for one TCP connect
    pub port_timeout: Duration,
    /// Timeout for resolving a named service
    pub resolve_timeout: Duration,
    /// Maximum number of targets probed simultaneously
    pub max_concurrency: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ping_attempts: 3,
            ping_deadline: Duration::from_secs(10),
            port_timeout: Duration::from_secs(5),
            resolve_timeout: Duration::from_secs(5),
            max_concurrency: 10,
        }
    }
}

/// Fans out liveness + port checks over a target list, admission
/// controlled by a counting semaphore.
#[derive(Clone)]
pub struct ProbeEngine {
    source_addr: String,
    prober: Arc<dyn Prober>,
    max_concurrency: usize,
    resolve_timeout: Duration,
}

impl ProbeEngine {
    pub fn new(source_addr: impl Into<String>, prober: Arc<dyn Prober>, cfg: &ProbeConfig) -> Self {
        Self {
            source_addr: source_addr.into(),
            prober,
            max_concurrency: cfg.max_concurrency.max(1),
            resolve_timeout: cfg.resolve_timeout,
        }
    }

    pub fn source_addr(&self) -> &str {
        &self.source_addr
    }

    /// Probe every target except the source itself. Results arrive in
    /// completion order, not input order. Individual check failures are
    /// encoded in the result status; this call itself cannot fail.
    pub async fn test_targets(&self, targets: &[String], port: u16) -> Vec<ConnectivityResult> {
        let targets: Vec<String> =
            targets.iter().filter(|t| **t != self.source_addr).cloned().collect();
        if targets.is_empty() {
            debug!(port, "no targets to probe");
            return Vec::new();
        }

        info!(count = targets.len(), port, "starting connectivity probes");

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();
        for target in targets {
            let semaphore = Arc::clone(&semaphore);
            let prober = Arc::clone(&self.prober);
            let source_addr = self.source_addr.clone();
            tasks.spawn(async move {
                // the semaphore is never closed while tasks are running
                let _permit = semaphore.acquire_owned().await.ok();
                probe_target(prober.as_ref(), source_addr, target, port).await
            });
        }

        let mut results = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(err) => warn!(%err, "probe task failed to join"),
            }
        }

        info!(tested = results.len(), port, "connectivity probes finished");
        results
    }

    /// Probe a single named service: resolve the name, then run the same
    /// two checks against the first resolved address. Resolution failure
    /// yields an unreachable result carrying the original name as the
    /// target; only an empty name is an error.
    pub async fn test_service(&self, service_name: &str, port: u16) -> Result<ConnectivityResult> {
        if service_name.is_empty() {
            return Err(Error::validation("service name must not be empty"));
        }

        let started = Instant::now();
        let lookup = timeout(self.resolve_timeout, tokio::net::lookup_host((service_name, port)));
        let resolved = match lookup.await {
            Ok(Ok(mut addrs)) => addrs.next(),
            Ok(Err(err)) => {
                warn!(service_name, %err, "service name resolution failed");
                None
            }
            Err(_) => {
                warn!(service_name, "service name resolution timed out");
                None
            }
        };

        let Some(addr) = resolved else {
            return Ok(ConnectivityResult {
                source_addr: self.source_addr.clone(),
                target_addr: service_name.to_string(),
                ping_status: PingStatus::Unreachable,
                port_status: BTreeMap::new(),
                latency: Duration::ZERO,
                test_duration: started.elapsed(),
                observed_at: Utc::now(),
            });
        };

        let target = addr.ip().to_string();
        info!(service_name, %target, "service name resolved");

        let mut result =
            probe_target(self.prober.as_ref(), self.source_addr.clone(), target, port).await;
        result.test_duration = started.elapsed();
        Ok(result)
    }
}

/// Run both checks for one target and record both outcomes regardless of
/// either failing. `test_duration` spans this target's checks only.
async fn probe_target(
    prober: &dyn Prober,
    source_addr: String,
    target_addr: String,
    port: u16,
) -> ConnectivityResult {
    let started = Instant::now();
    let observed_at = Utc::now();

    let ping = prober.ping(&target_addr).await;
    let open = prober.check_port(&target_addr, port).await;

    let mut port_status = BTreeMap::new();
    port_status.insert(port, if open { PortState::Open } else { PortState::Closed });

    let result = ConnectivityResult {
        source_addr,
        target_addr,
        ping_status: if ping.reachable { PingStatus::Reachable } else { PingStatus::Unreachable },
        port_status,
        latency: ping.latency,
        test_duration: started.elapsed(),
        observed_at,
    };

    debug!(
        target = %result.target_addr,
        ping = %result.ping_status,
        port,
        duration = ?result.test_duration,
        "target probed"
    );
    result
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::probe::prober::PingOutcome;

    /// Prober that records how many checks run simultaneously.
    struct CountingProber {
        current: AtomicUsize,
        peak: AtomicUsize,
        reachable: bool,
    }

    impl CountingProber {
        fn new(reachable: bool) -> Self {
            Self { current: AtomicUsize::new(0), peak: AtomicUsize::new(0), reachable }
        }

        async fn enter(&self) {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[async_trait::async_trait]
    impl Prober for CountingProber {
        async fn ping(&self, _target: &str) -> PingOutcome {
            self.enter().await;
            if self.reachable {
                PingOutcome { reachable: true, latency: Duration::from_millis(2) }
            } else {
                PingOutcome::unreachable()
            }
        }

        async fn check_port(&self, _target: &str, _port: u16) -> bool {
            self.reachable
        }
    }

    fn engine_with(prober: Arc<CountingProber>, max_concurrency: usize) -> ProbeEngine {
        let cfg = ProbeConfig { max_concurrency, ..ProbeConfig::default() };
        ProbeEngine::new("10.0.0.1", prober, &cfg)
    }

    #[tokio::test]
    async fn empty_target_list_yields_empty_results() {
        let engine = engine_with(Arc::new(CountingProber::new(true)), 4);
        assert!(engine.test_targets(&[], 22).await.is_empty());
    }

    #[tokio::test]
    async fn source_address_is_never_probed() {
        let engine = engine_with(Arc::new(CountingProber::new(true)), 4);
        let targets = vec!["10.0.0.1".to_string(), "10.0.0.2".to_string()];

        let results = engine.test_targets(&targets, 22).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].target_addr, "10.0.0.2");
        assert_eq!(results[0].source_addr, "10.0.0.1");
    }

    #[tokio::test]
    async fn concurrency_never_exceeds_budget() {
        let prober = Arc::new(CountingProber::new(true));
        let engine = engine_with(Arc::clone(&prober), 3);
        let targets: Vec<String> = (2..22).map(|i| format!("10.0.0.{i}")).collect();

        let results = engine.test_targets(&targets, 22).await;
        assert_eq!(results.len(), 20);
        assert!(prober.peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn failures_become_statuses() {
        let engine = engine_with(Arc::new(CountingProber::new(false)), 4);
        let results = engine.test_targets(&["10.0.0.9".to_string()], 22).await;

        assert_eq!(results[0].ping_status, PingStatus::Unreachable);
        assert_eq!(results[0].latency, Duration::ZERO);
        assert_eq!(results[0].port_status[&22], PortState::Closed);
    }

    #[tokio::test]
    async fn empty_service_name_is_rejected() {
        let engine = engine_with(Arc::new(CountingProber::new(true)), 4);
        assert!(matches!(engine.test_service("", 80).await, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn unresolvable_service_yields_unreachable_result() {
        let engine = engine_with(Arc::new(CountingProber::new(true)), 4);
        let result = engine
            .test_service("does-not-resolve.invalid", 80)
            .await
            .expect("resolution failure is not an error");

        assert_eq!(result.ping_status, PingStatus::Unreachable);
        assert_eq!(result.target_addr, "does-not-resolve.invalid");
        assert!(result.port_status.is_empty());
    }

    #[tokio::test]
    async fn resolvable_service_is_probed() {
        let engine = engine_with(Arc::new(CountingProber::new(true)), 4);
        let result = engine.test_service("localhost", 80).await.unwrap();

        assert_eq!(result.ping_status, PingStatus::Reachable);
        assert_eq!(result.port_status.len(), 1);
    }
}
