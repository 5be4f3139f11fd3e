use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GatewayError;
use crate::model_router::GenerationResult;

/// Wire names of the accepted content types, in the order error messages
/// list them.
pub const CONTENT_TYPES: [&str; 5] = ["blog", "social", "email", "creative", "technical"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Blog,
    Social,
    Email,
    Creative,
    Technical,
}

impl ContentType {
    fn from_wire(value: &str) -> Option<Self> {
        match value {
            "blog" => Some(ContentType::Blog),
            "social" => Some(ContentType::Social),
            "email" => Some(ContentType::Email),
            "creative" => Some(ContentType::Creative),
            "technical" => Some(ContentType::Technical),
            _ => None,
        }
    }
}

/// A validated, normalized generation request. Only `parse` constructs one,
/// so nothing unvalidated reaches the model router.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<ContentType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl GenerationRequest {
    /// Validates the raw body. `model` falls back to `default_model` when
    /// absent or empty; `temperature` and `maxTokens` pass through when
    /// numeric and are otherwise dropped, with range checks left to the
    /// model router.
    pub fn parse(body: &[u8], default_model: &str) -> Result<Self, GatewayError> {
        let value: Value =
            serde_json::from_slice(body).map_err(|_| GatewayError::MalformedBody)?;
        let object = value.as_object().ok_or(GatewayError::MalformedBody)?;

        let prompt = object
            .get("prompt")
            .and_then(Value::as_str)
            .filter(|p| !p.is_empty())
            .ok_or(GatewayError::MissingPrompt)?
            .to_string();

        let content_type = match object.get("contentType") {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                value
                    .as_str()
                    .and_then(ContentType::from_wire)
                    .ok_or(GatewayError::InvalidContentType)?,
            ),
        };

        let model = object
            .get("model")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .unwrap_or(default_model)
            .to_string();

        Ok(GenerationRequest {
            model,
            prompt,
            system_prompt: object
                .get("systemPrompt")
                .and_then(Value::as_str)
                .map(str::to_string),
            content_type,
            temperature: object.get("temperature").and_then(Value::as_f64),
            max_tokens: object
                .get("maxTokens")
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok()),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub content: String,
    pub metadata: GenerationMetadata,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationMetadata {
    pub model: String,
    pub provider: String,
    pub tokens_used: u64,
    pub latency_ms: u64,
}

impl From<GenerationResult> for GenerateResponse {
    fn from(result: GenerationResult) -> Self {
        GenerateResponse {
            content: result.content,
            metadata: GenerationMetadata {
                model: result.model,
                provider: result.provider,
                tokens_used: result.tokens_used,
                latency_ms: result.latency_ms,
            },
        }
    }
}
