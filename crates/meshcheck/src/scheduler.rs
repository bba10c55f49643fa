//! Periodic probe scheduler: fetch targets, probe, report.
//!
//! Each cycle handles hosts, agents, and the optional named service
//! independently; a failure in one category degrades only that
//! category's freshness until the next cycle.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::api::ApiClient;
use crate::probe::ProbeEngine;

pub struct ProbeScheduler {
    api: Arc<dyn ApiClient>,
    engine: ProbeEngine,
    host_port: u16,
    agent_port: u16,
    service: Option<(String, u16)>,
}

impl ProbeScheduler {
    pub fn new(
        api: Arc<dyn ApiClient>,
        engine: ProbeEngine,
        host_port: u16,
        agent_port: u16,
        service: Option<(String, u16)>,
    ) -> Self {
        Self { api, engine, host_port, agent_port, service }
    }

    /// Run one cycle immediately, then one per interval until
    /// cancelled. Cancellation is observed at the timer; an in-flight
    /// cycle runs to completion bounded by its own probe timeouts.
    pub async fn run(self, interval: Duration, shutdown: CancellationToken) {
        info!(?interval, "probe scheduler started");
        let mut timer = tokio::time::interval(interval);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("probe scheduler stopping");
                    break;
                }
                _ = timer.tick() => self.run_cycle().await,
            }
        }
    }

    pub async fn run_cycle(&self) {
        debug!("starting connectivity cycle");
        self.probe_hosts().await;
        self.probe_agents().await;
        if let Some((name, port)) = &self.service {
            self.probe_service(name, *port).await;
        }
        debug!("connectivity cycle finished");
    }

    async fn probe_hosts(&self) {
        let targets = match self.api.host_addresses().await {
            Ok(targets) => targets,
            Err(err) => {
                error!(%err, "fetching host addresses failed, skipping hosts this cycle");
                return;
            }
        };

        let results = self.engine.test_targets(&targets, self.host_port).await;
        if results.is_empty() {
            return;
        }
        if let Err(err) = self.api.report_host_results(&results).await {
            error!(%err, "reporting host results failed");
        }
    }

    async fn probe_agents(&self) {
        let targets = match self.api.agent_addresses().await {
            Ok(targets) => targets,
            Err(err) => {
                error!(%err, "fetching agent addresses failed, skipping agents this cycle");
                return;
            }
        };

        let results = self.engine.test_targets(&targets, self.agent_port).await;
        if results.is_empty() {
            return;
        }
        if let Err(err) = self.api.report_agent_results(&results).await {
            error!(%err, "reporting agent results failed");
        }
    }

    async fn probe_service(&self, name: &str, port: u16) {
        let result = match self.engine.test_service(name, port).await {
            Ok(result) => result,
            Err(err) => {
                error!(%err, service = name, "service probe failed");
                return;
            }
        };

        info!(service = name, target = %result.target_addr, ping = %result.ping_status,
            "service probed");
        if let Err(err) = self.api.report_service_result(&result).await {
            error!(%err, "reporting service result failed");
        }
    }
}
