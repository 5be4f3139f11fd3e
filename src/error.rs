use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::routes::generate::model::CONTENT_TYPES;

/// Every failure the gateway can hand back to a caller. Each variant maps to
/// exactly one status code and a JSON body of the shape `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    Unauthenticated,
    RateLimited {
        max_requests: u32,
        window_secs: u64,
    },
    MalformedBody,
    MissingPrompt,
    InvalidContentType,
    Upstream(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Unauthenticated => StatusCode::UNAUTHORIZED,
            GatewayError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::MalformedBody
            | GatewayError::MissingPrompt
            | GatewayError::InvalidContentType => StatusCode::BAD_REQUEST,
            GatewayError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn message(&self) -> String {
        match self {
            GatewayError::Unauthenticated => "Authentication required".to_string(),
            GatewayError::RateLimited {
                max_requests,
                window_secs,
            } => {
                if *window_secs == 60 {
                    format!("Rate limit exceeded. Max {max_requests} requests per minute.")
                } else {
                    format!(
                        "Rate limit exceeded. Max {max_requests} requests per {window_secs} seconds."
                    )
                }
            }
            GatewayError::MalformedBody => "Request body must be a valid JSON object".to_string(),
            GatewayError::MissingPrompt => {
                "Field 'prompt' is required and must be a non-empty string".to_string()
            }
            GatewayError::InvalidContentType => format!(
                "Invalid contentType. Must be one of: {}",
                CONTENT_TYPES.join(", ")
            ),
            GatewayError::Upstream(message) => message.clone(),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.message(),
        });
        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_message_names_the_limit() {
        let err = GatewayError::RateLimited {
            max_requests: 10,
            window_secs: 60,
        };
        assert_eq!(err.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            err.message(),
            "Rate limit exceeded. Max 10 requests per minute."
        );
    }

    #[test]
    fn invalid_content_type_lists_the_valid_set() {
        let msg = GatewayError::InvalidContentType.message();
        for kind in ["blog", "social", "email", "creative", "technical"] {
            assert!(msg.contains(kind), "message should mention {kind}: {msg}");
        }
    }
}
