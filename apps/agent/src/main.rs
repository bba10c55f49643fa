#![warn(clippy::all, clippy::pedantic)]

use std::sync::Arc;

use meshcheck::api::{ApiClient, HttpApiClient};
use meshcheck::collector::{DescriptorSource, EnvDescriptorSource};
use meshcheck::config::AgentConfig;
use meshcheck::heartbeat::HeartbeatReporter;
use meshcheck::probe::{ProbeEngine, SystemProber};
use meshcheck::scheduler::ProbeScheduler;
use tokio_util::sync::CancellationToken;
use tracing::info;

mod health;

use logger::init_tracing;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AgentConfig::from_env();
    info!(server_url = %config.server_url, "agent starting");

    let source: Arc<dyn DescriptorSource> = Arc::new(EnvDescriptorSource);
    let descriptor = source.collect()?;
    info!(
        agent = %descriptor.agent_name,
        node = %descriptor.node_addr,
        addr = %descriptor.agent_addr,
        namespace = %descriptor.namespace,
        "agent identity collected"
    );

    let api: Arc<dyn ApiClient> = Arc::new(HttpApiClient::new(
        &config.server_url,
        &descriptor.agent_addr,
        config.request_timeout,
    )?);
    let prober = Arc::new(SystemProber::new(
        config.probe.ping_attempts,
        config.probe.ping_deadline,
        config.probe.port_timeout,
    ));
    let engine = ProbeEngine::new(&descriptor.agent_addr, prober, &config.probe);

    let shutdown = CancellationToken::new();

    let heartbeat = HeartbeatReporter::new(Arc::clone(&source), Arc::clone(&api));
    tokio::spawn(heartbeat.run(config.heartbeat_interval, shutdown.clone()));

    let service = config.service_name.clone().map(|name| (name, config.service_port));
    let scheduler = ProbeScheduler::new(
        Arc::clone(&api),
        engine,
        config.host_port,
        config.agent_port,
        service,
    );
    tokio::spawn(scheduler.run(config.probe_interval, shutdown.clone()));

    // blocks until the process is signalled, then stops the loops
    health::serve(config.agent_port).await?;
    shutdown.cancel();
    info!("agent stopped");
    Ok(())
}
