//! Environment-driven configuration for both binaries.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::probe::ProbeConfig;

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "unparsable environment variable, using default");
            default
        }),
        Err(_) => default,
    }
}

fn env_secs_or(key: &str, default_secs: u64) -> Duration {
    Duration::from_secs(env_or(key, default_secs).max(1))
}

/// Agent-side configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Base URL of the observer API
    pub server_url: String,
    pub heartbeat_interval: Duration,
    pub probe_interval: Duration,
    /// TCP port checked on host targets
    pub host_port: u16,
    /// TCP port checked on agent targets, also the local health port
    pub agent_port: u16,
    /// Optional named service to probe each cycle
    pub service_name: Option<String>,
    pub service_port: u16,
    pub request_timeout: Duration,
    pub probe: ProbeConfig,
}

impl AgentConfig {
    pub fn from_env() -> Self {
        let service_name = env::var("SERVICE_NAME").ok().filter(|name| !name.is_empty());
        Self {
            server_url: env::var("SERVER_URL")
                .unwrap_or_else(|_| "http://meshcheck-server:8080".to_string()),
            heartbeat_interval: env_secs_or("HEARTBEAT_INTERVAL", 5),
            probe_interval: env_secs_or("PROBE_INTERVAL", 60),
            host_port: env_or("HOST_PORT", 22),
            agent_port: env_or("AGENT_PORT", 6100),
            service_name,
            service_port: env_or("SERVICE_PORT", 80),
            request_timeout: env_secs_or("REQUEST_TIMEOUT", 10),
            probe: ProbeConfig {
                max_concurrency: env_or("MAX_CONCURRENCY", 10),
                ..ProbeConfig::default()
            },
        }
    }
}

/// Observer-side configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
    /// TTL of a liveness record since its last heartbeat
    pub record_ttl: Duration,
    pub sweep_interval: Duration,
    pub report_interval: Duration,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            http_port: env_or("HTTP_PORT", 8080),
            record_ttl: env_secs_or("CACHE_TTL_SECONDS", 15),
            sweep_interval: env_secs_or("SWEEP_INTERVAL", 30),
            report_interval: env_secs_or("REPORT_INTERVAL", 300),
        }
    }
}
