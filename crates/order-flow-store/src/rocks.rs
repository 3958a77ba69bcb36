//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `OrderStore` trait.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options, WriteBatch,
};

use order_flow_core::{IdempotencyKey, Order, OrderId, PaymentDecision};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::{OrderStore, TransitionOutcome};

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    /// Serializes read-check-write sequences for conditional writes.
    write_lock: Mutex<()>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Mutex::new(()),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    fn lock_writes(&self) -> Result<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| StoreError::Database("write lock poisoned".into()))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn put_order(&self, order: &Order) -> Result<()> {
        let cf = self.cf(cf::ORDERS)?;
        let value = Self::serialize(order)?;

        self.db
            .put_cf(&cf, keys::order_key(&order.order_id), value)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn try_transition(
        &self,
        order_id: &OrderId,
        decision: PaymentDecision,
        processed_at: DateTime<Utc>,
    ) -> Result<TransitionOutcome> {
        let _guard = self.lock_writes()?;

        let order = self
            .get_order(order_id)?
            .ok_or(StoreError::NotFound(*order_id))?;

        if !order.is_pending() {
            return Ok(TransitionOutcome::AlreadySettled(order));
        }

        let settled = order.settled(decision, processed_at);
        self.put_order(&settled)?;

        Ok(TransitionOutcome::Applied(settled))
    }
}

impl OrderStore for RocksStore {
    fn get_order(&self, order_id: &OrderId) -> Result<Option<Order>> {
        let cf = self.cf(cf::ORDERS)?;
        let key = keys::order_key(order_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn find_by_idempotency_key(&self, key: &IdempotencyKey) -> Result<Option<Order>> {
        let cf_index = self.cf(cf::ORDERS_BY_IDEMPOTENCY_KEY)?;
        let prefix = keys::idempotency_prefix(key);

        let iter = self
            .db
            .iterator_cf(&cf_index, IteratorMode::From(&prefix, Direction::Forward));

        let mut order_ids = Vec::new();
        for item in iter {
            let (index_key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            if !index_key.starts_with(&prefix) {
                break;
            }

            if let Some(order_id) = keys::extract_order_id_from_index_key(&index_key) {
                order_ids.push(order_id);
            }
        }

        if order_ids.len() > 1 {
            tracing::warn!(
                idempotency_key = %key,
                count = order_ids.len(),
                "Multiple orders share an idempotency key, returning the earliest"
            );
        }

        match order_ids.first() {
            Some(order_id) => self.get_order(order_id),
            None => Ok(None),
        }
    }

    fn insert_order(&self, order: &Order) -> Result<()> {
        let _guard = self.lock_writes()?;

        if self.get_order(&order.order_id)?.is_some() {
            return Err(StoreError::AlreadyExists(order.order_id));
        }

        let cf_orders = self.cf(cf::ORDERS)?;
        let cf_index = self.cf(cf::ORDERS_BY_IDEMPOTENCY_KEY)?;

        let order_key = keys::order_key(&order.order_id);
        let index_key = keys::idempotency_index_key(order);
        let value = Self::serialize(order)?;

        // Write atomically
        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_orders, &order_key, &value);
        batch.put_cf(&cf_index, &index_key, b"");

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

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
    use tempfile::TempDir;

    fn create_test_store() -> (RocksStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        (store, dir)
    }

    fn order(key: &str) -> Order {
        Order::new(
            IdempotencyKey::new(key).unwrap(),
            NewOrder {
                customer_name: "Alice".into(),
                total_amount: 100.0,
            },
        )
    }

    #[test]
    fn order_insert_and_lookup() {
        let (store, _dir) = create_test_store();
        let order = order("abc");

        store.insert_order(&order).unwrap();

        let by_id = store.get_order(&order.order_id).unwrap().unwrap();
        assert_eq!(by_id, order);

        let by_key = store
            .find_by_idempotency_key(&order.idempotency_key)
            .unwrap()
            .unwrap();
        assert_eq!(by_key.order_id, order.order_id);

        let other = IdempotencyKey::new("ab").unwrap();
        assert!(store.find_by_idempotency_key(&other).unwrap().is_none());
    }

    #[test]
    fn insert_rejects_existing_id() {
        let (store, _dir) = create_test_store();
        let order = order("abc");

        store.insert_order(&order).unwrap();
        assert!(matches!(
            store.insert_order(&order),
            Err(StoreError::AlreadyExists(_))
        ));
    }

    #[test]
    fn transition_is_conditional() {
        let (store, _dir) = create_test_store();
        let order = order("abc");
        store.insert_order(&order).unwrap();

        let first = store.transition_status(&order.order_id, PaymentDecision::Reject, Utc::now());
        assert!(matches!(first, TransitionOutcome::Applied(_)));

        let second = store.transition_status(&order.order_id, PaymentDecision::Approve, Utc::now());
        assert!(matches!(second, TransitionOutcome::AlreadySettled(_)));

        let stored = store.get_order(&order.order_id).unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Rejected);
    }

    #[test]
    fn duplicate_keys_return_earliest_created() {
        let (store, _dir) = create_test_store();
        let earlier = order("dup");
        let mut later = order("dup");
        later.created_at = earlier.created_at + chrono::Duration::milliseconds(5);

        // Insertion order does not matter; creation time does.
        store.insert_order(&later).unwrap();
        store.insert_order(&earlier).unwrap();

        let found = store
            .find_by_idempotency_key(&earlier.idempotency_key)
            .unwrap()
            .unwrap();
        assert_eq!(found.order_id, earlier.order_id);
    }

    #[test]
    fn same_millisecond_duplicates_break_ties_by_id() {
        let (store, _dir) = create_test_store();
        let first = order("tie");
        let mut second = order("tie");
        second.created_at = first.created_at;

        store.insert_order(&first).unwrap();
        store.insert_order(&second).unwrap();

        let expected = first.order_id.min(second.order_id);
        let found = store
            .find_by_idempotency_key(&first.idempotency_key)
            .unwrap()
            .unwrap();
        assert_eq!(found.order_id, expected);
    }

    #[test]
    fn data_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let order = order("persist");

        {
            let store = RocksStore::open(dir.path()).unwrap();
            store.insert_order(&order).unwrap();
        }

        let store = RocksStore::open(dir.path()).unwrap();
        let found = store
            .find_by_idempotency_key(&order.idempotency_key)
            .unwrap()
            .unwrap();
        assert_eq!(found.order_id, order.order_id);
    }
}
