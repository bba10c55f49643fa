//! Descriptor collection for the agent's own identity.

use chrono::Utc;

use crate::error::{Error, Result};
use crate::models::AgentDescriptor;

pub const ENV_NAMESPACE: &str = "NAMESPACE";
pub const ENV_NODE_ADDR: &str = "NODE_ADDR";
pub const ENV_AGENT_ADDR: &str = "AGENT_ADDR";
pub const ENV_AGENT_NAME: &str = "AGENT_NAME";

/// Source of the agent's self-descriptor, re-read before every
/// heartbeat.
pub trait DescriptorSource: Send + Sync {
    fn collect(&self) -> Result<AgentDescriptor>;
}

/// Reads the descriptor from the environment the way an orchestrator
/// injects it (downward-API style).
pub struct EnvDescriptorSource;

impl DescriptorSource for EnvDescriptorSource {
    fn collect(&self) -> Result<AgentDescriptor> {
        let read = |key: &str| std::env::var(key).unwrap_or_default();

        let namespace = read(ENV_NAMESPACE);
        let node_addr = read(ENV_NODE_ADDR);
        let agent_addr = read(ENV_AGENT_ADDR);
        let agent_name = read(ENV_AGENT_NAME);

        let mut missing = Vec::new();
        if node_addr.is_empty() {
            missing.push(ENV_NODE_ADDR);
        }
        if agent_addr.is_empty() {
            missing.push(ENV_AGENT_ADDR);
        }
        if agent_name.is_empty() {
            missing.push(ENV_AGENT_NAME);
        }
        if namespace.is_empty() {
            missing.push(ENV_NAMESPACE);
        }
        if !missing.is_empty() {
            return Err(Error::validation(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        Ok(AgentDescriptor { namespace, node_addr, agent_addr, agent_name, observed_at: Utc::now() })
    }
}
