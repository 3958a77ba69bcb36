//! Error types for order-flow storage.

use order_flow_core::OrderId;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Order not found.
    #[error("order not found: {0}")]
    NotFound(OrderId),

    /// Conditional insert failed: an order with this identifier already exists.
    #[error("order already exists: {0}")]
    AlreadyExists(OrderId),
}
