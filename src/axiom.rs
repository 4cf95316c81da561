use crate::record::LogEvent;
use crate::transport::IngestTransport;
use async_trait::async_trait;
use reqwest::Client;
use std::error::Error;
use std::time::Duration;

/// Configuration for [`AxiomTransport`].
///
/// The transport speaks the Axiom ingest API: one POST of
/// newline-delimited JSON per batch, authenticated with a bearer token.
#[derive(Clone, Debug)]
pub struct AxiomConfig {
    /// Base URL without path, e.g. "https://api.axiom.co". A trailing
    /// slash is tolerated.
    pub base_url: String,
    /// Target dataset name; also sent as the `X-Axiom-Dataset` header.
    pub dataset: String,
    /// API token used for the `Authorization: Bearer` header.
    pub api_key: String,
    /// Per-request timeout covering connect, send and response.
    pub timeout: Duration,
}

/// Axiom implementation of [`IngestTransport`] over HTTP.
#[derive(Clone)]
pub struct AxiomTransport {
    client: Client,
    endpoint: String,
    auth_header: String,
    dataset: String,
    timeout: Duration,
}

fn ingest_endpoint(base_url: &str, dataset: &str) -> String {
    format!(
        "{}/v1/datasets/{}/ingest",
        base_url.trim_end_matches('/'),
        dataset
    )
}

impl AxiomTransport {
    /// Construct a new transport from the provided configuration.
    ///
    /// The ingest endpoint and authorization header are computed once
    /// here; `send_batch` only serializes and posts.
    pub fn new(config: AxiomConfig) -> Self {
        let endpoint = ingest_endpoint(&config.base_url, &config.dataset);
        Self {
            client: Client::new(),
            endpoint,
            auth_header: format!("Bearer {}", config.api_key),
            dataset: config.dataset,
            timeout: config.timeout,
        }
    }
}

#[async_trait]
impl IngestTransport for AxiomTransport {
    async fn send_batch(&self, batch: &[LogEvent]) -> Result<(), Box<dyn Error + Send + Sync>> {
        if batch.is_empty() {
            return Ok(());
        }

        let lines: Vec<String> = batch
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<_, _>>()?;
        let body = lines.join("\n");

        let resp = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .header("Authorization", self.auth_header.as_str())
            .header("Content-Type", "application/x-ndjson")
            .header("X-Axiom-Dataset", self.dataset.as_str())
            .body(body)
            .send()
            .await?;

        if resp.status().is_success() {
            Ok(())
        } else {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_else(|_| "<no body>".to_string());
            Err(format!("Axiom ingest failed with status {}: {}", status, text).into())
        }
    }
}
