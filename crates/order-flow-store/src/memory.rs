//! In-memory storage implementation.
//!
//! This module provides the `MemoryStore` implementation of the `OrderStore` trait.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use order_flow_core::{IdempotencyKey, Order, OrderId, PaymentDecision};

use crate::error::{Result, StoreError};
use crate::{OrderStore, TransitionOutcome};

#[derive(Default)]
struct Tables {
    orders: HashMap<OrderId, Order>,
    /// Order IDs per idempotency key, in insertion order.
    by_idempotency_key: HashMap<IdempotencyKey, Vec<OrderId>>,
}

/// A thread-safe in-memory order store.
///
/// Every conditional write happens under a single write guard, so checks and
/// writes cannot interleave.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Creates a new, empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Database("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Database("memory store lock poisoned".into()))
    }

    fn try_transition(
        &self,
        order_id: &OrderId,
        decision: PaymentDecision,
        processed_at: DateTime<Utc>,
    ) -> Result<TransitionOutcome> {
        let mut tables = self.write()?;
        let order = tables
            .orders
            .get_mut(order_id)
            .ok_or(StoreError::NotFound(*order_id))?;

        if !order.is_pending() {
            return Ok(TransitionOutcome::AlreadySettled(order.clone()));
        }

        *order = order.clone().settled(decision, processed_at);
        Ok(TransitionOutcome::Applied(order.clone()))
    }
}

impl OrderStore for MemoryStore {
    fn get_order(&self, order_id: &OrderId) -> Result<Option<Order>> {
        Ok(self.read()?.orders.get(order_id).cloned())
    }

    fn find_by_idempotency_key(&self, key: &IdempotencyKey) -> Result<Option<Order>> {
        let tables = self.read()?;
        let Some(ids) = tables.by_idempotency_key.get(key) else {
            return Ok(None);
        };

        if ids.len() > 1 {
            tracing::warn!(
                idempotency_key = %key,
                count = ids.len(),
                "Multiple orders share an idempotency key, returning the earliest"
            );
        }

        Ok(ids.first().and_then(|id| tables.orders.get(id)).cloned())
    }

    fn insert_order(&self, order: &Order) -> Result<()> {
        let mut tables = self.write()?;
        if tables.orders.contains_key(&order.order_id) {
            return Err(StoreError::AlreadyExists(order.order_id));
        }

        tables.orders.insert(order.order_id, order.clone());
        tables
            .by_idempotency_key
            .entry(order.idempotency_key.clone())
            .or_default()
            .push(order.order_id);

        Ok(())
    }

    fn transition_status(
        &self,
        order_id: &OrderId,
        decision: PaymentDecision,
        processed_at: DateTime<Utc>,
    ) -> TransitionOutcome {
        self.try_transition(order_id, decision, processed_at)
            .unwrap_or_else(TransitionOutcome::Faulted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use order_flow_core::{NewOrder, OrderStatus};
    use std::sync::Arc;

    fn order(key: &str) -> Order {
        Order::new(
            IdempotencyKey::new(key).unwrap(),
            NewOrder {
                customer_name: "Alice".into(),
                total_amount: 42.0,
            },
        )
    }

    #[test]
    fn insert_and_get() {
        let store = MemoryStore::new();
        let order = order("k1");
        store.insert_order(&order).unwrap();

        assert_eq!(store.get_order(&order.order_id).unwrap(), Some(order));
        assert!(store.get_order(&OrderId::generate()).unwrap().is_none());
    }

    #[test]
    fn insert_is_conditional_on_id() {
        let store = MemoryStore::new();
        let order = order("k1");
        store.insert_order(&order).unwrap();

        let err = store.insert_order(&order).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(id) if id == order.order_id));
    }

    #[test]
    fn lookup_by_idempotency_key() {
        let store = MemoryStore::new();
        let first = order("same");
        store.insert_order(&first).unwrap();

        let found = store
            .find_by_idempotency_key(&first.idempotency_key)
            .unwrap()
            .unwrap();
        assert_eq!(found.order_id, first.order_id);

        let missing = IdempotencyKey::new("other").unwrap();
        assert!(store.find_by_idempotency_key(&missing).unwrap().is_none());
    }

    #[test]
    fn duplicate_keys_return_earliest() {
        let store = MemoryStore::new();
        let first = order("dup");
        let second = order("dup");
        store.insert_order(&first).unwrap();
        store.insert_order(&second).unwrap();

        let found = store
            .find_by_idempotency_key(&first.idempotency_key)
            .unwrap()
            .unwrap();
        assert_eq!(found.order_id, first.order_id);
    }

    #[test]
    fn transition_applies_once() {
        let store = MemoryStore::new();
        let order = order("k1");
        store.insert_order(&order).unwrap();

        let at = Utc::now();
        let applied = store.transition_status(&order.order_id, PaymentDecision::Approve, at);
        let TransitionOutcome::Applied(settled) = applied else {
            panic!("expected Applied");
        };
        assert_eq!(settled.status, OrderStatus::Approved);
        assert_eq!(settled.payment_processed_at, Some(at));

        let again = store.transition_status(&order.order_id, PaymentDecision::Reject, Utc::now());
        let TransitionOutcome::AlreadySettled(current) = again else {
            panic!("expected AlreadySettled");
        };
        assert_eq!(current.status, OrderStatus::Approved);
        assert_eq!(current.payment_processed_at, Some(at));
    }

    #[test]
    fn transition_of_missing_order_faults() {
        let store = MemoryStore::new();
        let outcome =
            store.transition_status(&OrderId::generate(), PaymentDecision::Approve, Utc::now());
        assert!(matches!(
            outcome,
            TransitionOutcome::Faulted(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn concurrent_transitions_apply_exactly_once() {
        let store = Arc::new(MemoryStore::new());
        let order = order("race");
        store.insert_order(&order).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                let id = order.order_id;
                std::thread::spawn(move || {
                    let decision = if i % 2 == 0 {
                        PaymentDecision::Approve
                    } else {
                        PaymentDecision::Reject
                    };
                    store.transition_status(&id, decision, Utc::now())
                })
            })
            .collect();

        let applied = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|o| matches!(o, TransitionOutcome::Applied(_)))
            .count();
        assert_eq!(applied, 1);
    }
}
