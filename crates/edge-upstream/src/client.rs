//! # Payment Service Client
//!
//! reqwest implementation of [`PaymentService`].
//! Each call sends exactly one request; there are no retries and no client
//! timeout, so the host's request lifetime bounds every call.

use crate::config::ServiceConfig;
use async_trait::async_trait;
use edge_core::{
    EdgeError, EdgeResult, PaymentService, PaymentSessionRequest, X402PaymentPayload,
};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

const SESSIONS_PATH: &str = "/sessions";
const X402_REQUIREMENTS_PATH: &str = "/x402/requirements";
const X402_PAYMENTS_PATH: &str = "/x402/payments";

/// HTTP client for the upstream payment service
#[derive(Clone)]
pub struct HttpPaymentService {
    config: ServiceConfig,
    client: Client,
}

impl HttpPaymentService {
    /// Create a new client for the given service
    pub fn new(config: ServiceConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    /// Create with an existing reqwest client
    pub fn with_client(config: ServiceConfig, client: Client) -> Self {
        Self { config, client }
    }

    /// Create from environment variables
    pub fn from_env() -> EdgeResult<Self> {
        let config = ServiceConfig::from_env()?;
        Ok(Self::new(config))
    }

    /// Service configuration
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> EdgeResult<Value> {
        let request = self.client.post(self.config.endpoint(path)).json(body);
        self.send(path, request).await
    }

    async fn get_json(&self, path: &str) -> EdgeResult<Value> {
        let request = self.client.get(self.config.endpoint(path));
        self.send(path, request).await
    }

    /// Send with the api key attached and parse the body as JSON, whatever the status
    async fn send(&self, path: &str, request: RequestBuilder) -> EdgeResult<Value> {
        let response = request
            .query(&[("apikey", self.config.api_key.as_str())])
            .send()
            .await
            .map_err(|e| EdgeError::Upstream(e.to_string()))?;

        let status = response.status();
        debug!("Upstream responded: path={}, status={}", path, status);

        response
            .json::<Value>()
            .await
            .map_err(|e| EdgeError::UpstreamResponse(e.to_string()))
    }
}

#[async_trait]
impl PaymentService for HttpPaymentService {
    #[instrument(skip(self, request), fields(amount = request.amount))]
    async fn create_session(&self, request: &PaymentSessionRequest) -> EdgeResult<Value> {
        self.post_json(SESSIONS_PATH, request).await
    }

    #[instrument(skip(self))]
    async fn fetch_session(&self, session_id: &str) -> EdgeResult<Value> {
        self.get_json(&format!("{}/{}", SESSIONS_PATH, session_id))
            .await
    }

    #[instrument(skip(self, request), fields(amount = request.amount))]
    async fn x402_requirements(&self, request: &PaymentSessionRequest) -> EdgeResult<Value> {
        self.post_json(X402_REQUIREMENTS_PATH, request).await
    }

    #[instrument(skip(self, payload))]
    async fn x402_payment(&self, payload: &X402PaymentPayload) -> EdgeResult<Value> {
        self.post_json(X402_PAYMENTS_PATH, payload).await
    }

    fn service_name(&self) -> &'static str {
        "zeropay"
    }
}
