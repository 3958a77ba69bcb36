//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Primary order records, keyed by `order_id`.
    pub const ORDERS: &str = "orders";

    /// Index: orders by idempotency key, keyed by
    /// `len(key) || key || created_at_millis || order_id`.
    /// Value is empty (index only).
    pub const ORDERS_BY_IDEMPOTENCY_KEY: &str = "orders_by_idempotency_key";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![cf::ORDERS, cf::ORDERS_BY_IDEMPOTENCY_KEY]
}
