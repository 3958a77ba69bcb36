//! Error types for order-flow.

use serde::Serialize;

/// Result type for order-flow domain operations.
pub type Result<T> = std::result::Result<T, OrderError>;

/// A single problem found while validating an order request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// The offending request field (wire name).
    pub field: String,
    /// Human-readable description of the problem.
    pub message: String,
}

impl Violation {
    /// Create a violation for `field`.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors that can occur in order-flow domain operations.
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    /// The request failed validation. Every violation found is listed.
    #[error("invalid order request: {}", join_messages(.0))]
    Validation(Vec<Violation>),
}

fn join_messages(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_lists_every_message() {
        let err = OrderError::Validation(vec![
            Violation::new("customerName", "customerName must be a non-empty string"),
            Violation::new("totalAmount", "totalAmount must be a positive number"),
        ]);
        assert_eq!(
            err.to_string(),
            "invalid order request: customerName must be a non-empty string; \
             totalAmount must be a positive number"
        );
    }
}
