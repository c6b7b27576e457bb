//! Admin endpoints: health, good-to-go, ping and build info

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use tracing::error;

use super::buildinfo::get_build_info;
use crate::health::{
    check_stream_connectivity, check_writer_connectivity, CheckResult, HealthReport, STREAM_CHECK,
    WRITER_CHECK,
};
use crate::AppState;

/// Build admin routes
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/__health", get(health))
        .route("/__gtg", get(good_to_go))
        .route("/__ping", get(ping))
        .route("/__build-info", get(get_build_info))
}

/// GET /__health
///
/// Always 200; the report's `ok` flag carries the verdict.
pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    let writer = check_writer_connectivity(state.dispatcher.writer().as_ref()).await;
    let stream = check_stream_connectivity(state.stream_check.as_ref()).await;

    let checks = vec![
        CheckResult::from_outcome(&WRITER_CHECK, &writer),
        CheckResult::from_outcome(&STREAM_CHECK, &stream),
    ];

    Json(HealthReport::new(
        &state.service.system_code,
        &state.service.name,
        &state.service.description,
        checks,
    ))
}

/// GET /__gtg
pub async fn good_to_go(State(state): State<AppState>) -> Response {
    if let Err(e) = check_stream_connectivity(state.stream_check.as_ref()).await {
        error!("Message stream healthcheck failed; {}", e);
        return unavailable("Message stream healthcheck failed");
    }
    if let Err(e) = check_writer_connectivity(state.dispatcher.writer().as_ref()).await {
        error!("Concordance writer healthcheck failed; {}", e);
        return unavailable("Concordance writer healthcheck failed");
    }
    StatusCode::OK.into_response()
}

/// GET /__ping
pub async fn ping() -> &'static str {
    "pong"
}

fn unavailable(message: &'static str) -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, message).into_response()
}
