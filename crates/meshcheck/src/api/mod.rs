//! HTTP transport boundary between agents and the observer.

mod client;

pub use client::{ApiClient, HttpApiClient};
