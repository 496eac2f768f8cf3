//! sevgate API /v1: gate service over HTTP
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod service;
pub mod source;

pub use error::ServiceError;
pub use service::{GateCheckResponse, GateRun, GateService, ViolationSummary};
pub use source::{parse_violations, JsonFileSource, StaticSource, ViolationSource};

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn create_app(service: Arc<GateService>) -> Router {
    Router::new()
        .route("/v1/health", get(handlers::health))
        .route("/v1/evaluate", post(handlers::evaluate))
        .route("/v1/gate/check", post(handlers::gate_check))
        .route("/v1/gate/status", get(handlers::gate_status))
        .route("/v1/preflight", post(handlers::preflight))
        .route("/v1/tests/register", post(handlers::register_test))
        .route("/v1/tests/reset", post(handlers::reset_tests))
        .route("/v1/trend", get(handlers::trend))
        .route("/metrics", get(handlers::metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(service)
}

pub async fn run(addr: &str, service: Arc<GateService>) -> std::io::Result<()> {
    let app = create_app(service);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("sevgate API listening on {}", addr);
    axum::serve(listener, app).await
}
