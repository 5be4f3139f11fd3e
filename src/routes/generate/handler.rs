use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use super::model::{GenerateResponse, GenerationRequest};
use crate::AppState;
use crate::auth::resolve_identity;
use crate::error::GatewayError;

/// POST /api/generate. The body is taken raw so that identity resolution and
/// the rate-limit check run before any parsing: a malformed or upstream-failed
/// request still consumes one slot of the caller's quota, while a 401 never
/// touches the limiter.
#[axum::debug_handler]
pub async fn generate(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let identity = match resolve_identity(&headers, &state.config) {
        Ok(identity) => identity,
        Err(e) => return e.into_response(),
    };

    if !state.limiter.admit(identity.key()) {
        return GatewayError::RateLimited {
            max_requests: state.limiter.max_requests(),
            window_secs: state.limiter.window().as_secs(),
        }
        .into_response();
    }

    let request = match GenerationRequest::parse(&body, &state.config.default_model) {
        Ok(request) => request,
        Err(e) => return e.into_response(),
    };

    let request_id = Uuid::new_v4();
    tracing::debug!(
        %request_id,
        identity = identity.key(),
        model = %request.model,
        "dispatching generation request"
    );

    match state.model_router.generate(request).await {
        Ok(result) => (StatusCode::OK, axum::Json(GenerateResponse::from(result))).into_response(),
        Err(e) => {
            tracing::error!(
                %request_id,
                identity = identity.key(),
                error = %e,
                "model router call failed"
            );
            GatewayError::Upstream(e.message().to_string()).into_response()
        }
    }
}
