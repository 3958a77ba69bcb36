//! Order intake.
//!
//! Creation is idempotent per client key: a known key returns the stored
//! order untouched, a new key validates, inserts and publishes.
//!
//! A known key whose order is still `PENDING` publishes its `OrderCreated`
//! event again. The insert may have succeeded while the publish failed, and
//! the retry is the only chance to hand the order to settlement. Settlement
//! skips orders that are already settled, so extra events are harmless.
//!
//! The key lookup and the insert are separate store calls. Two concurrent
//! requests carrying the same new key can both pass the lookup and both
//! insert; the store then returns the earliest order for that key on later
//! replays.

use std::sync::Arc;

use order_flow_core::{CreateOrderRequest, IdempotencyKey, Order, OrderError};
use order_flow_store::{OrderStore, StoreError};

use crate::queue::{OrderCreated, OrderQueue, QueueError};

/// Successful result of a creation request.
#[derive(Debug, Clone, PartialEq)]
pub enum IntakeOutcome {
    /// A new order was persisted and published.
    Created(Order),

    /// The key was seen before; this is the order it created.
    Found(Order),
}

impl IntakeOutcome {
    /// The order carried by either outcome.
    #[must_use]
    pub fn order(&self) -> &Order {
        match self {
            Self::Created(order) | Self::Found(order) => order,
        }
    }

    /// Consume the outcome, returning its order.
    #[must_use]
    pub fn into_order(self) -> Order {
        match self {
            Self::Created(order) | Self::Found(order) => order,
        }
    }
}

/// Errors returned by [`OrderIntake::create_order`].
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    /// No usable idempotency key was supplied.
    #[error("missing idempotency key")]
    MissingIdempotencyKey,

    /// The request body failed validation.
    #[error(transparent)]
    Invalid(#[from] OrderError),

    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The order was stored but its event could not be published.
    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// Idempotent order creation over an injected store and queue.
#[derive(Clone)]
pub struct OrderIntake {
    store: Arc<dyn OrderStore>,
    queue: Arc<dyn OrderQueue>,
}

impl OrderIntake {
    /// Create an intake service.
    #[must_use]
    pub fn new(store: Arc<dyn OrderStore>, queue: Arc<dyn OrderQueue>) -> Self {
        Self { store, queue }
    }

    /// Create an order, or return the one already created under `idempotency_key`.
    ///
    /// `body` is only parsed and validated when the key is new.
    ///
    /// # Errors
    ///
    /// - `IntakeError::MissingIdempotencyKey` if the key is absent or blank.
    /// - `IntakeError::Invalid` listing every validation problem.
    /// - `IntakeError::Store` / `IntakeError::Queue` on infrastructure faults.
    ///   A queue fault leaves the order persisted; retrying with the same key
    ///   publishes it again and returns it as `Found`.
    pub async fn create_order(
        &self,
        idempotency_key: Option<&str>,
        body: &[u8],
    ) -> Result<IntakeOutcome, IntakeError> {
        let key = idempotency_key
            .and_then(|raw| IdempotencyKey::new(raw).ok())
            .ok_or(IntakeError::MissingIdempotencyKey)?;

        if let Some(existing) = self.store.find_by_idempotency_key(&key)? {
            tracing::info!(
                idempotency_key = %key,
                order_id = %existing.order_id,
                "Idempotency key replayed, returning existing order"
            );
            if existing.is_pending() {
                self.publish(&existing).await?;
            }
            return Ok(IntakeOutcome::Found(existing));
        }

        let request = CreateOrderRequest::from_slice(body)?.validate()?;
        let order = Order::new(key, request);

        self.store.insert_order(&order)?;

        tracing::info!(
            order_id = %order.order_id,
            idempotency_key = %order.idempotency_key,
            total_amount = order.total_amount,
            "Order created"
        );

        self.publish(&order).await?;

        Ok(IntakeOutcome::Created(order))
    }

    async fn publish(&self, order: &Order) -> Result<(), QueueError> {
        self.queue
            .send(&OrderCreated {
                order_id: order.order_id,
            })
            .await
    }
}
