//! Payment settlement.
//!
//! Consumes `OrderCreated` messages in batches and moves each referenced
//! order from `PENDING` to a terminal status through the store's conditional
//! update. Redelivered or duplicated messages find the order already settled
//! and are skipped.
//!
//! Each message is handled on its own: a malformed body or a store fault is
//! logged and the rest of the batch continues. Nothing is retried here;
//! redelivery belongs to the queue.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;

use order_flow_core::{decide, ApprovalPolicy, Order};
use order_flow_store::{OrderStore, StoreError, TransitionOutcome};

use crate::queue::{OrderCreated, QueueMessage, QueueReceiver};

/// Why a message could not be settled.
#[derive(Debug, thiserror::Error)]
pub enum SettlementError {
    /// The message body is not an `OrderCreated` event.
    #[error("malformed message body: {0}")]
    MalformedMessage(String),

    /// The store could not apply the transition.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of settling one message.
#[derive(Debug)]
pub enum SettlementOutcome {
    /// The order moved to a terminal status.
    Applied(Order),

    /// The order was already settled; the message was a duplicate.
    AlreadySettled(Order),

    /// The message was abandoned.
    Faulted(SettlementError),
}

/// Counts for one processed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Orders moved to a terminal status.
    pub applied: usize,
    /// Duplicate deliveries for already-settled orders.
    pub already_settled: usize,
    /// Messages abandoned after a fault.
    pub faulted: usize,
}

impl BatchSummary {
    fn record(&mut self, outcome: &SettlementOutcome) {
        match outcome {
            SettlementOutcome::Applied(_) => self.applied += 1,
            SettlementOutcome::AlreadySettled(_) => self.already_settled += 1,
            SettlementOutcome::Faulted(_) => self.faulted += 1,
        }
    }

    /// Total messages in the batch.
    #[must_use]
    pub fn total(&self) -> usize {
        self.applied + self.already_settled + self.faulted
    }
}

/// Settles queued orders against an injected store.
pub struct SettlementProcessor {
    store: Arc<dyn OrderStore>,
    policy: ApprovalPolicy,
    rng: Mutex<StdRng>,
}

impl SettlementProcessor {
    /// Create a processor drawing randomness from OS entropy.
    #[must_use]
    pub fn new(store: Arc<dyn OrderStore>, policy: ApprovalPolicy) -> Self {
        Self::with_rng(store, policy, StdRng::from_entropy())
    }

    /// Create a processor with a caller-supplied random source.
    #[must_use]
    pub fn with_rng(store: Arc<dyn OrderStore>, policy: ApprovalPolicy, rng: StdRng) -> Self {
        Self {
            store,
            policy,
            rng: Mutex::new(rng),
        }
    }

    /// The configured approval policy.
    #[must_use]
    pub fn policy(&self) -> ApprovalPolicy {
        self.policy
    }

    /// Settle every message in `messages`, independently.
    #[must_use]
    pub fn process_batch(&self, messages: &[QueueMessage]) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for message in messages {
            let outcome = self.process_message(message);
            summary.record(&outcome);
        }
        summary
    }

    /// Settle a single message.
    #[must_use]
    pub fn process_message(&self, message: &QueueMessage) -> SettlementOutcome {
        let event: OrderCreated = match serde_json::from_str(&message.body) {
            Ok(event) => event,
            Err(e) => {
                tracing::error!(
                    message_id = %message.message_id,
                    error = %e,
                    "Dropping malformed order message"
                );
                return SettlementOutcome::Faulted(SettlementError::MalformedMessage(
                    e.to_string(),
                ));
            }
        };

        let decision = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            decide(self.policy, &mut *rng)
        };

        match self
            .store
            .transition_status(&event.order_id, decision, Utc::now())
        {
            TransitionOutcome::Applied(order) => {
                tracing::info!(
                    order_id = %order.order_id,
                    status = %order.status,
                    "Payment processed"
                );
                SettlementOutcome::Applied(order)
            }
            TransitionOutcome::AlreadySettled(order) => {
                tracing::info!(
                    order_id = %order.order_id,
                    status = %order.status,
                    message_id = %message.message_id,
                    "Order already settled, skipping duplicate delivery"
                );
                SettlementOutcome::AlreadySettled(order)
            }
            TransitionOutcome::Faulted(e) => {
                tracing::error!(
                    order_id = %event.order_id,
                    message_id = %message.message_id,
                    error = %e,
                    "Failed to settle order"
                );
                SettlementOutcome::Faulted(SettlementError::Store(e))
            }
        }
    }
}

/// Drain `receiver` in batches of up to `batch_size` until the queue closes.
pub async fn run_settlement_worker(
    processor: Arc<SettlementProcessor>,
    mut receiver: QueueReceiver,
    batch_size: usize,
) {
    tracing::info!(
        batch_size,
        policy = ?processor.policy(),
        "Settlement worker started"
    );

    while let Some(batch) = receiver.next_batch(batch_size).await {
        let summary = processor.process_batch(&batch);
        tracing::debug!(
            total = summary.total(),
            applied = summary.applied,
            already_settled = summary.already_settled,
            faulted = summary.faulted,
            "Settlement batch processed"
        );
    }

    tracing::info!("Order queue closed, settlement worker stopping");
}
