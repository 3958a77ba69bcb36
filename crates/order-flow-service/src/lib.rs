//! Order-flow HTTP API and settlement service.
//!
//! This crate wires the two halves of the order flow together:
//!
//! - **Order intake** (`POST /v1/orders`): idempotent creation keyed by the
//!   `Idempotency-Key` header, followed by an `OrderCreated` event
//! - **Payment settlement**: a worker that drains the order queue in batches
//!   and settles each order exactly once
//!
//! The store and queue are injected as trait objects; nothing here keeps
//! process-wide clients.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers are async for Axum

pub mod config;
pub mod error;
pub mod handlers;
pub mod intake;
pub mod queue;
pub mod routes;
pub mod settlement;
pub mod state;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use intake::{IntakeError, IntakeOutcome, OrderIntake};
pub use queue::{ChannelQueue, OrderCreated, OrderQueue, QueueError, QueueMessage, QueueReceiver};
pub use routes::create_router;
pub use settlement::{
    run_settlement_worker, BatchSummary, SettlementError, SettlementOutcome, SettlementProcessor,
};
pub use state::AppState;
