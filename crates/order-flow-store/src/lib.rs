//! Storage layer for order-flow.
//!
//! This crate provides persistent storage for orders together with the
//! secondary index used for idempotency lookups.
//!
//! # Backends
//!
//! - [`MemoryStore`]: in-process maps behind a lock (always available)
//! - `RocksStore`: `RocksDB` with column families (feature `rocksdb-backend`)
//!
//! # Conditional writes
//!
//! Both backends implement the two conditional writes the service relies on:
//!
//! - [`OrderStore::insert_order`] only succeeds if no order with the same
//!   identifier exists.
//! - [`OrderStore::transition_status`] only succeeds if the order is still
//!   `PENDING`.
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use order_flow_core::{IdempotencyKey, NewOrder, Order, PaymentDecision};
//! use order_flow_store::{MemoryStore, OrderStore, TransitionOutcome};
//!
//! let store = MemoryStore::new();
//!
//! let key = IdempotencyKey::new("abc").unwrap();
//! let order = Order::new(key.clone(), NewOrder { customer_name: "Alice".into(), total_amount: 100.0 });
//! store.insert_order(&order).unwrap();
//!
//! let found = store.find_by_idempotency_key(&key).unwrap();
//! assert_eq!(found.map(|o| o.order_id), Some(order.order_id));
//!
//! let outcome = store.transition_status(&order.order_id, PaymentDecision::Approve, Utc::now());
//! assert!(matches!(outcome, TransitionOutcome::Applied(_)));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod memory;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksStore;

use chrono::{DateTime, Utc};
use order_flow_core::{IdempotencyKey, Order, OrderId, PaymentDecision};

/// Result of a conditional status transition.
///
/// A lost race is an ordinary outcome here, not an error to be inspected.
#[derive(Debug)]
pub enum TransitionOutcome {
    /// The order was `PENDING` and now carries the decided status.
    Applied(Order),

    /// The order had already left `PENDING`; nothing was written.
    AlreadySettled(Order),

    /// The transition could not be attempted or written.
    Faulted(StoreError),
}

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, allowing for different implementations
/// (e.g., `RocksDB`, in-memory for testing).
pub trait OrderStore: Send + Sync {
    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_order(&self, order_id: &OrderId) -> Result<Option<Order>>;

    /// Look up the order created under an idempotency key.
    ///
    /// At most one order is expected per key. If concurrent intake created
    /// several, the earliest is returned. Backends that order by creation
    /// timestamp break ties within the same millisecond by order ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_by_idempotency_key(&self, key: &IdempotencyKey) -> Result<Option<Order>>;

    /// Insert a new order and its idempotency index entry.
    ///
    /// The insert is conditional on no order with the same ID existing. It
    /// does not check the idempotency key; callers look that up first.
    ///
    /// # Errors
    ///
    /// - `StoreError::AlreadyExists` if the ID is taken.
    /// - Any other error if the database operation fails.
    fn insert_order(&self, order: &Order) -> Result<()>;

    /// Move an order from `PENDING` to the status for `decision`, stamping
    /// `processed_at`, as a single compare-and-swap.
    fn transition_status(
        &self,
        order_id: &OrderId,
        decision: PaymentDecision,
        processed_at: DateTime<Utc>,
    ) -> TransitionOutcome;
}
