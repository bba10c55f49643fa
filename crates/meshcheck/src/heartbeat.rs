//! Periodic heartbeat loop run by every agent.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::collector::DescriptorSource;

pub struct HeartbeatReporter {
    source: Arc<dyn DescriptorSource>,
    api: Arc<dyn ApiClient>,
}

impl HeartbeatReporter {
    pub fn new(source: Arc<dyn DescriptorSource>, api: Arc<dyn ApiClient>) -> Self {
        Self { source, api }
    }

    /// Send one heartbeat per interval until cancelled. The first beat
    /// goes out immediately. Send failures are logged and the loop
    /// keeps going; liveness recovers on the next successful beat.
    pub async fn run(self, interval: Duration, shutdown: CancellationToken) {
        info!(?interval, "heartbeat loop started");
        let mut timer = tokio::time::interval(interval);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("heartbeat loop stopping");
                    break;
                }
                _ = timer.tick() => self.beat().await,
            }
        }
    }

    async fn beat(&self) {
        let descriptor = match self.source.collect() {
            Ok(descriptor) => descriptor,
            Err(err) => {
                warn!(%err, "could not collect agent descriptor");
                return;
            }
        };

        match self.api.send_heartbeat(&descriptor).await {
            Ok(()) => debug!(agent = %descriptor.agent_name, "heartbeat delivered"),
            Err(err) => warn!(%err, "heartbeat delivery failed"),
        }
    }
}
