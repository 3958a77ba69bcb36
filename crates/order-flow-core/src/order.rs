//! Order types for order-flow.
//!
//! An [`Order`] is created `PENDING` by intake and moved exactly once to a
//! terminal status by settlement. Apart from that transition it is immutable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{OrderError, Result, Violation};
use crate::ids::{IdempotencyKey, OrderId};
use crate::policy::PaymentDecision;

/// Wire name of the customer name field.
pub const FIELD_CUSTOMER_NAME: &str = "customerName";

/// Wire name of the total amount field.
pub const FIELD_TOTAL_AMOUNT: &str = "totalAmount";

/// A customer order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Primary key, generated at creation.
    pub order_id: OrderId,

    /// The client token this order was created under.
    pub idempotency_key: IdempotencyKey,

    /// Name of the ordering customer. Never empty.
    pub customer_name: String,

    /// Order total. Always positive.
    pub total_amount: f64,

    /// Payment status.
    pub status: OrderStatus,

    /// When the order was created.
    pub created_at: DateTime<Utc>,

    /// When settlement moved the order to a terminal status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_processed_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Create a new `PENDING` order with a freshly generated identifier.
    #[must_use]
    pub fn new(idempotency_key: IdempotencyKey, request: NewOrder) -> Self {
        Self {
            order_id: OrderId::generate(),
            idempotency_key,
            customer_name: request.customer_name,
            total_amount: request.total_amount,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            payment_processed_at: None,
        }
    }

    /// Whether the order is still awaiting settlement.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }

    /// Return the order with the terminal status for `decision` applied.
    ///
    /// This does not check the current status; stores guard the transition.
    #[must_use]
    pub fn settled(mut self, decision: PaymentDecision, at: DateTime<Utc>) -> Self {
        self.status = decision.status();
        self.payment_processed_at = Some(at);
        self
    }
}

/// Payment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Awaiting settlement.
    Pending,

    /// Payment approved (terminal).
    Approved,

    /// Payment rejected (terminal).
    Rejected,
}

impl OrderStatus {
    /// Whether no further transition is allowed from this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    /// The wire representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An order creation request as received from a client.
///
/// Fields are kept as raw JSON so that validation can report every problem,
/// including wrong types, instead of failing on the first one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    /// Requested customer name.
    #[serde(default)]
    pub customer_name: Option<serde_json::Value>,

    /// Requested order total.
    #[serde(default)]
    pub total_amount: Option<serde_json::Value>,
}

/// A validated order creation request.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    /// Non-empty customer name.
    pub customer_name: String,
    /// Positive, finite total.
    pub total_amount: f64,
}

impl CreateOrderRequest {
    /// Parse a request body.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Validation` if the body is not a JSON object.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let not_an_object = || {
            OrderError::Validation(vec![Violation::new(
                "body",
                "request body must be a JSON object",
            )])
        };

        let value: serde_json::Value = serde_json::from_slice(body).map_err(|_| not_an_object())?;
        if !value.is_object() {
            return Err(not_an_object());
        }
        serde_json::from_value(value).map_err(|_| not_an_object())
    }

    /// Validate the request, collecting every violation.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Validation` listing all problems found.
    pub fn validate(&self) -> Result<NewOrder> {
        let mut violations = Vec::new();

        let customer_name = match self.customer_name.as_ref().and_then(|v| v.as_str()) {
            Some(name) if !name.trim().is_empty() => Some(name.to_string()),
            _ => {
                violations.push(Violation::new(
                    FIELD_CUSTOMER_NAME,
                    "customerName must be a non-empty string",
                ));
                None
            }
        };

        let total_amount = match self.total_amount.as_ref().and_then(serde_json::Value::as_f64) {
            Some(amount) if amount.is_finite() && amount > 0.0 => Some(amount),
            _ => {
                violations.push(Violation::new(
                    FIELD_TOTAL_AMOUNT,
                    "totalAmount must be a positive number",
                ));
                None
            }
        };

        match (customer_name, total_amount) {
            (Some(customer_name), Some(total_amount)) => Ok(NewOrder {
                customer_name,
                total_amount,
            }),
            _ => Err(OrderError::Validation(violations)),
        }
    }
}
