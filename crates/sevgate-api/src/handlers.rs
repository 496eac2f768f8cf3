//! API handlers
use crate::error::ServiceError;
use crate::service::GateService;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sevgate_core::{Violation, SEVGATE_VERSION};
use sevgate_session::PreflightRequest;
use std::sync::Arc;

pub type SharedService = Arc<GateService>;

type Reply = (StatusCode, Json<Value>);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateRequest {
    #[serde(default, alias = "findings")]
    pub violations: Vec<Violation>,
    /// Restrict the decision to these files
    #[serde(default)]
    pub staged_files: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterTestRequest {
    pub test_file_path: String,
}

#[derive(Debug, Deserialize)]
pub struct TrendQuery {
    #[serde(default = "default_trend_limit")]
    pub limit: usize,
}

fn default_trend_limit() -> usize {
    10
}

fn reply<T: Serialize>(status: StatusCode, body: &T) -> Reply {
    match serde_json::to_value(body) {
        Ok(value) => (status, Json(value)),
        Err(e) => internal(e.to_string()),
    }
}

fn internal(message: String) -> Reply {
    tracing::error!(%message, "request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": message })),
    )
}

fn service_error(e: ServiceError) -> Reply {
    if e.is_client_error() {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": e.to_string() })),
        )
    } else {
        internal(e.to_string())
    }
}

/// Run synchronous service work on the blocking pool
async fn blocking<T, F>(service: SharedService, work: F) -> Result<T, Reply>
where
    T: Send + 'static,
    F: FnOnce(&GateService) -> T + Send + 'static,
{
    tokio::task::spawn_blocking(move || work(&service))
        .await
        .map_err(|e| internal(format!("worker failed: {}", e)))
}

pub async fn health() -> Reply {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "version": SEVGATE_VERSION })),
    )
}

pub async fn evaluate(
    State(service): State<SharedService>,
    Json(request): Json<EvaluateRequest>,
) -> Reply {
    let result = blocking(service, move |svc| {
        svc.run(request.violations, request.staged_files.as_deref())
    })
    .await;
    match result {
        Ok(run) => reply(StatusCode::OK, &run),
        Err(failed) => failed,
    }
}

pub async fn gate_check(State(service): State<SharedService>) -> Reply {
    match blocking(service, |svc| svc.gate_check().map_err(service_error)).await {
        Ok(Ok(response)) => reply(StatusCode::OK, &response),
        Ok(Err(failed)) | Err(failed) => failed,
    }
}

pub async fn gate_status(State(service): State<SharedService>) -> Reply {
    let status = service.enforcement_status();
    let snapshot = service.session().snapshot();
    (
        StatusCode::OK,
        Json(json!({ "enforcement": status, "session": snapshot })),
    )
}

pub async fn preflight(
    State(service): State<SharedService>,
    Json(request): Json<PreflightRequest>,
) -> Reply {
    // a refusal is a normal answer, not a request failure
    reply(StatusCode::OK, &service.preflight(&request))
}

pub async fn register_test(
    State(service): State<SharedService>,
    Json(request): Json<RegisterTestRequest>,
) -> Reply {
    let registration = service.register_test(&request.test_file_path);
    let status = if registration.registered {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    reply(status, &registration)
}

pub async fn reset_tests(State(service): State<SharedService>) -> Reply {
    let cleared = service.reset_tdd();
    (StatusCode::OK, Json(json!({ "cleared": cleared })))
}

pub async fn trend(
    State(service): State<SharedService>,
    Query(query): Query<TrendQuery>,
) -> Reply {
    match blocking(service, move |svc| svc.trend(query.limit).map_err(service_error)).await {
        Ok(Ok(report)) => reply(StatusCode::OK, &report),
        Ok(Err(failed)) | Err(failed) => failed,
    }
}

pub async fn metrics(State(service): State<SharedService>) -> (StatusCode, String) {
    match service.metrics().encode() {
        Ok(text) => (StatusCode::OK, text),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}
