//! Health check handler.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Always `ok` while the process serves requests.
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Store location the service was configured with.
    pub orders_table: String,
    /// Queue the service publishes order events to.
    pub order_queue: String,
}

/// Health check endpoint.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "order-flow",
        version: env!("CARGO_PKG_VERSION"),
        orders_table: state.config.orders_table.clone(),
        order_queue: state.config.order_queue_url.clone(),
    })
}
