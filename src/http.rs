use crate::client::{GraphClient, GraphEdge, GraphRequest, GraphResponse, Params};
use crate::config::Config;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
struct GraphErrorEnvelope {
    error: GraphError,
}

#[derive(Debug, Deserialize)]
struct GraphError {
    message: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    code: Option<i64>,
}

/// [`GraphClient`] backed by `reqwest`.
///
/// Batch requests are sent one by one; a failed item comes back as an empty
/// response under its key.
#[derive(Debug, Clone)]
pub struct HttpGraphClient {
    client: Client,
    config: Config,
    access_token: Option<String>,
}

impl HttpGraphClient {
    pub fn new(config: Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: Config) -> Self {
        Self {
            client,
            config,
            access_token: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The default token if one was set, otherwise the app token.
    pub fn access_token(&self) -> String {
        self.access_token
            .clone()
            .unwrap_or_else(|| self.config.app_access_token())
    }

    fn url(&self, endpoint: &str) -> String {
        let separator = if endpoint.starts_with('/') { "" } else { "/" };
        format!(
            "{}/{}{}{}",
            self.config.base_url, self.config.graph_version, separator, endpoint
        )
    }

    // Request URLs carry the access token, so they are stripped from transport errors.
    async fn execute(&self, request: RequestBuilder) -> Result<GraphResponse> {
        let response = request.send().await.map_err(reqwest::Error::without_url)?;
        let status = response.status();
        let text = response.text().await.map_err(reqwest::Error::without_url)?;

        if !status.is_success() {
            let message = serde_json::from_str::<GraphErrorEnvelope>(&text)
                .map(|envelope| {
                    let error = envelope.error;
                    match (error.kind, error.code) {
                        (Some(kind), Some(code)) => format!("{kind} #{code}: {}", error.message),
                        _ => error.message,
                    }
                })
                .unwrap_or(text);
            bail!("Graph API request failed with {status}: {message}");
        }

        if text.trim().is_empty() {
            return Ok(GraphResponse::empty());
        }

        let body: Value = serde_json::from_str(&text).context("Graph API returned invalid JSON")?;
        Ok(GraphResponse::new(body))
    }
}

#[async_trait]
impl GraphClient for HttpGraphClient {
    async fn send_request(&self, method: &str, endpoint: &str, params: Params) -> Result<GraphResponse> {
        let method = Method::from_bytes(method.as_bytes())
            .with_context(|| format!("invalid HTTP method {method:?}"))?;
        debug!("{method} {endpoint} {params:?}");

        let request = self
            .client
            .request(method, self.url(endpoint))
            .query(&params)
            .query(&[("access_token", self.access_token())]);
        self.execute(request).await
    }

    async fn send_batch_request(
        &self,
        requests: BTreeMap<String, GraphRequest>,
    ) -> Result<Vec<(String, GraphResponse)>> {
        let mut responses = Vec::with_capacity(requests.len());
        for (key, request) in requests {
            let response = match self
                .send_request(&request.method, &request.endpoint, request.params)
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    warn!("batch item {key} failed: {e:#}");
                    GraphResponse::empty()
                }
            };
            responses.push((key, response));
        }
        Ok(responses)
    }

    async fn get(&self, path_with_query: &str) -> Result<GraphResponse> {
        debug!("GET {path_with_query}");
        let request = self
            .client
            .get(self.url(path_with_query))
            .query(&[("access_token", self.access_token())]);
        self.execute(request).await
    }

    async fn next(&self, edge: &GraphEdge) -> Result<Option<GraphEdge>> {
        let Some(next_page) = edge.next_page() else {
            return Ok(None);
        };

        let mut request = self.client.get(next_page);
        if !next_page.contains("access_token=") {
            request = request.query(&[("access_token", self.access_token())]);
        }
        Ok(self.execute(request).await?.graph_edge())
    }

    fn set_default_access_token(&mut self, token: &str) -> Result<()> {
        if token.is_empty() || token.chars().any(char::is_whitespace) {
            bail!("access token must be a non-empty string without whitespace");
        }
        self.access_token = Some(token.to_string());
        Ok(())
    }
}
