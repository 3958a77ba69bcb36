//! Payment approval policy.
//!
//! Settlement decides each payment with [`decide`], a pure function of the
//! configured [`ApprovalPolicy`] and a random source. Production passes an
//! entropy-seeded RNG; tests pass a seeded one.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::order::OrderStatus;

/// Probability that the randomized policy rejects a payment.
pub const RANDOM_REJECTION_PROBABILITY: f64 = 0.3;

/// How settlement decides whether to approve a payment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalPolicy {
    /// Approve every payment.
    Always,

    /// Reject every payment.
    Never,

    /// Reject with [`RANDOM_REJECTION_PROBABILITY`], approve otherwise.
    #[default]
    Random,
}

impl ApprovalPolicy {
    /// Parse the configuration switch.
    ///
    /// `ALWAYS` and `NEVER` (any case) select the forced policies; any other
    /// value selects the randomized default.
    #[must_use]
    pub fn from_setting(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "ALWAYS" => Self::Always,
            "NEVER" => Self::Never,
            _ => Self::Random,
        }
    }
}

/// The outcome of a payment decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentDecision {
    /// Payment accepted.
    Approve,
    /// Payment declined.
    Reject,
}

impl PaymentDecision {
    /// The terminal order status this decision leads to.
    #[must_use]
    pub const fn status(self) -> OrderStatus {
        match self {
            Self::Approve => OrderStatus::Approved,
            Self::Reject => OrderStatus::Rejected,
        }
    }
}

/// Decide a payment under `policy`, drawing from `rng` only when randomized.
#[must_use]
pub fn decide<R: Rng + ?Sized>(policy: ApprovalPolicy, rng: &mut R) -> PaymentDecision {
    match policy {
        ApprovalPolicy::Always => PaymentDecision::Approve,
        ApprovalPolicy::Never => PaymentDecision::Reject,
        ApprovalPolicy::Random => {
            if rng.gen_bool(RANDOM_REJECTION_PROBABILITY) {
                PaymentDecision::Reject
            } else {
                PaymentDecision::Approve
            }
        }
    }
}
