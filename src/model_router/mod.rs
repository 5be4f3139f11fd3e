use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::routes::generate::model::GenerationRequest;

/// What the router hands back for an admitted, validated request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub content: String,
    pub model: String,
    pub provider: String,
    pub tokens_used: u64,
    pub latency_ms: u64,
}

/// Failure reported by the router, with a message fit to surface to callers.
#[derive(Debug)]
pub struct RouterError {
    message: String,
}

impl RouterError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for RouterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for RouterError {}

/// The routing collaborator that talks to model providers. Provider choice,
/// prompt templating and token accounting all live behind this seam; the
/// gateway only forwards a validated request and maps the outcome.
#[async_trait]
pub trait ModelRouter: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResult, RouterError>;
}

/// Production router: forwards the request as JSON to the routing service.
/// Timeouts and retries across providers are that service's concern.
pub struct HttpModelRouter {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpModelRouter {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl ModelRouter for HttpModelRouter {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResult, RouterError> {
        let response = self
            .client
            .post(self.endpoint.as_str())
            .json(&request)
            .send()
            .await
            .map_err(|e| RouterError::new(format!("model router unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
                .unwrap_or(body);
            return Err(RouterError::new(format!(
                "model router returned {status}: {detail}"
            )));
        }

        response
            .json::<GenerationResult>()
            .await
            .map_err(|e| RouterError::new(format!("invalid model router response: {e}")))
    }
}
