use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{AgentDescriptor, ConnectivityResult};

pub const HEARTBEAT_URI: &str = "/api/v1/heartbeat";
pub const HOSTS_URI: &str = "/api/v1/hosts";
pub const AGENTS_URI: &str = "/api/v1/agents";
pub const HOST_RESULTS_URI: &str = "/api/v1/test-results/hosts";
pub const AGENT_RESULTS_URI: &str = "/api/v1/test-results/agents";
pub const SERVICE_RESULT_URI: &str = "/api/v1/test-results/service";

const MAX_ATTEMPTS: u32 = 5;
const BASE_DELAY: Duration = Duration::from_secs(1);

/// Everything an agent asks of the observer. Transient failures are
/// retried here, at the transport boundary, and nowhere else.
#[async_trait::async_trait]
pub trait ApiClient: Send + Sync {
    async fn send_heartbeat(&self, descriptor: &AgentDescriptor) -> Result<()>;
    async fn host_addresses(&self) -> Result<Vec<String>>;
    async fn agent_addresses(&self) -> Result<Vec<String>>;
    async fn report_host_results(&self, results: &[ConnectivityResult]) -> Result<()>;
    async fn report_agent_results(&self, results: &[ConnectivityResult]) -> Result<()>;
    async fn report_service_result(&self, result: &ConnectivityResult) -> Result<()>;
}

#[derive(Serialize)]
struct ResultsRequest<'a> {
    source_addr: &'a str,
    results: &'a [ConnectivityResult],
}

#[derive(Serialize)]
struct ServiceResultRequest<'a> {
    source_addr: &'a str,
    result: &'a ConnectivityResult,
}

#[derive(Deserialize)]
struct HostListResponse {
    host_addrs: Vec<String>,
}

#[derive(Deserialize)]
struct AgentListResponse {
    agent_addrs: Vec<String>,
}

#[derive(Deserialize)]
struct Ack {
    #[allow(dead_code)]
    status: String,
}

/// Exponential backoff: 1s, 2s, 4s, 8s, 16s.
fn backoff_delay(completed_attempts: u32) -> Duration {
    BASE_DELAY * (1 << (completed_attempts - 1))
}

pub struct HttpApiClient {
    base_url: String,
    source_addr: String,
    http: reqwest::Client,
}

impl HttpApiClient {
    pub fn new(
        base_url: impl Into<String>,
        source_addr: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            source_addr: source_addr.into(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn request_with_retry<T: DeserializeOwned>(
        &self,
        build: impl Fn() -> reqwest::RequestBuilder,
    ) -> Result<T> {
        let mut last_err = Error::Transport("request never attempted".into());

        for attempt in 1..=MAX_ATTEMPTS {
            if attempt > 1 {
                let delay = backoff_delay(attempt - 1);
                warn!(attempt, max = MAX_ATTEMPTS, ?delay, %last_err, "retrying request");
                tokio::time::sleep(delay).await;
            }

            match build().send().await.and_then(|response| response.error_for_status()) {
                Ok(response) => match response.json::<T>().await {
                    Ok(parsed) => return Ok(parsed),
                    Err(err) => last_err = err.into(),
                },
                Err(err) => last_err = err.into(),
            }
        }

        Err(Error::Transport(format!("request failed after {MAX_ATTEMPTS} attempts: {last_err}")))
    }

    async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<()> {
        let url = self.url(path);
        self.request_with_retry::<Ack>(|| self.http.post(&url).json(body)).await?;
        Ok(())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        self.request_with_retry(|| self.http.get(&url)).await
    }
}

#[async_trait::async_trait]
impl ApiClient for HttpApiClient {
    async fn send_heartbeat(&self, descriptor: &AgentDescriptor) -> Result<()> {
        self.post_json(HEARTBEAT_URI, descriptor).await?;
        debug!(agent = %descriptor.agent_name, "heartbeat sent");
        Ok(())
    }

    async fn host_addresses(&self) -> Result<Vec<String>> {
        let response: HostListResponse = self.get_json(HOSTS_URI).await?;
        debug!(count = response.host_addrs.len(), "fetched host addresses");
        Ok(response.host_addrs)
    }

    async fn agent_addresses(&self) -> Result<Vec<String>> {
        let response: AgentListResponse = self.get_json(AGENTS_URI).await?;
        debug!(count = response.agent_addrs.len(), "fetched agent addresses");
        Ok(response.agent_addrs)
    }

    async fn report_host_results(&self, results: &[ConnectivityResult]) -> Result<()> {
        let request = ResultsRequest { source_addr: &self.source_addr, results };
        self.post_json(HOST_RESULTS_URI, &request).await
    }

    async fn report_agent_results(&self, results: &[ConnectivityResult]) -> Result<()> {
        let request = ResultsRequest { source_addr: &self.source_addr, results };
        self.post_json(AGENT_RESULTS_URI, &request).await
    }

    async fn report_service_result(&self, result: &ConnectivityResult) -> Result<()> {
        let request = ServiceResultRequest { source_addr: &self.source_addr, result };
        self.post_json(SERVICE_RESULT_URI, &request).await
    }
}
