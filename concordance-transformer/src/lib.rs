//! concordance-transformer library
//!
//! Converts Smartlogic concept concordances into canonical concordance
//! records and forwards them to the concordance writer. Events arrive from a
//! Redis stream or over HTTP; both paths share the converter and dispatcher.

use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;
pub mod consumer;
pub mod converter;
pub mod dispatcher;
pub mod error;
pub mod health;
pub mod identifier;
pub mod model;
pub mod status;
pub mod writer;

pub use crate::converter::{convert_payload, Conversion};
pub use crate::dispatcher::Dispatcher;
pub use crate::model::ConcordanceRecord;
pub use crate::status::ResultStatus;

use crate::consumer::ConnectivityCheck;

/// Description of the running service, reported by the admin endpoints
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    pub system_code: String,
    pub name: String,
    pub description: String,
}

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    /// Message stream probe for the health endpoints
    pub stream_check: Arc<dyn ConnectivityCheck>,
    pub service: ServiceInfo,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher, stream_check: Arc<dyn ConnectivityCheck>, service: ServiceInfo) -> Self {
        Self {
            dispatcher,
            stream_check,
            service,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::transform_routes())
        .merge(api::admin_routes())
        .layer(TraceLayer::new_for_http().make_span_with(api::request_span))
        .with_state(state)
}
