use std::sync::Arc;

use axum::{Router, routing::post};

use config::Config;
use model_router::ModelRouter;
use ratelimit::RateLimiter;

pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod model_router;
pub mod ratelimit;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub limiter: Arc<RateLimiter>,
    pub model_router: Arc<dyn ModelRouter>,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/generate", post(routes::generate::handler::generate))
        .layer(axum::middleware::from_fn(middleware::log_server_errors))
        .with_state(state)
}
