//! Order handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use order_flow_core::{Order, OrderId};

use crate::error::ApiError;
use crate::intake::IntakeOutcome;
use crate::state::AppState;

/// Request header carrying the client idempotency key.
///
/// Header names are matched case-insensitively.
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Create an order.
///
/// Returns 201 with the new order, or 200 with the order previously created
/// under the same `Idempotency-Key`.
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let idempotency_key = headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    let outcome = state.intake.create_order(idempotency_key, &body).await?;

    let status = match &outcome {
        IntakeOutcome::Created(_) => StatusCode::CREATED,
        IntakeOutcome::Found(_) => StatusCode::OK,
    };

    Ok((status, Json(outcome.into_order())))
}

/// Fetch an order by ID.
pub async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let order_id: OrderId = order_id
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid order ID".into()))?;

    let order = state
        .store
        .get_order(&order_id)?
        .ok_or_else(|| ApiError::NotFound(format!("order not found: {order_id}")))?;

    Ok(Json(order))
}
