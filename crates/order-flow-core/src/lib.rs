//! Core types and utilities for order-flow.
//!
//! This crate provides the foundational types used throughout the workspace:
//!
//! - **Identifiers**: `OrderId`, `IdempotencyKey`
//! - **Orders**: `Order`, `OrderStatus`, `CreateOrderRequest`, `NewOrder`
//! - **Settlement policy**: `ApprovalPolicy`, `PaymentDecision`, `decide`
//!
//! # Order lifecycle
//!
//! `PENDING` → `APPROVED` | `REJECTED`
//!
//! Orders are created `PENDING` by intake and transition exactly once.
//! Stores enforce the transition with a conditional write on the current status.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod ids;
pub mod order;
pub mod policy;

pub use error::{OrderError, Result, Violation};
pub use ids::{IdError, IdempotencyKey, OrderId};
pub use order::{
    CreateOrderRequest, NewOrder, Order, OrderStatus, FIELD_CUSTOMER_NAME, FIELD_TOTAL_AMOUNT,
};
pub use policy::{decide, ApprovalPolicy, PaymentDecision, RANDOM_REJECTION_PROBABILITY};
