//! Shared tracing initialization for the meshcheck binaries.

use std::env;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{Layer, filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber: INFO by default, overridable through
/// `RUST_LOG`, with `RUST_LOG_FORMAT=json` switching to JSON output for
/// log collectors.
pub fn init_tracing() {
    let env_filter =
        EnvFilter::builder().with_default_directive(LevelFilter::INFO.into()).from_env_lossy();

    let json = env::var("RUST_LOG_FORMAT").is_ok_and(|format| format == "json");
    let log_layer = if json {
        tracing_subscriber::fmt::layer().json().with_filter(env_filter).boxed()
    } else {
        tracing_subscriber::fmt::layer().compact().with_filter(env_filter).boxed()
    };

    tracing_subscriber::registry().with(log_layer).init();
}
