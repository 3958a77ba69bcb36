//! Key encoding utilities for `RocksDB`.
//!
//! This module provides functions for encoding and decoding keys used in column families.

use order_flow_core::{IdempotencyKey, Order, OrderId};

/// Create an order key from an order ID.
#[must_use]
pub fn order_key(order_id: &OrderId) -> Vec<u8> {
    order_id.as_bytes().to_vec()
}

/// Create the prefix shared by every index entry for an idempotency key.
///
/// Format: `len(key) (4 bytes, BE) || key`
///
/// The length prefix keeps keys that are prefixes of one another apart.
#[must_use]
pub fn idempotency_prefix(key: &IdempotencyKey) -> Vec<u8> {
    let bytes = key.as_str().as_bytes();
    let len = u32::try_from(bytes.len()).unwrap_or(u32::MAX);
    let mut prefix = Vec::with_capacity(4 + bytes.len());
    prefix.extend_from_slice(&len.to_be_bytes());
    prefix.extend_from_slice(bytes);
    prefix
}

/// Create an idempotency index key for an order.
///
/// Format: `prefix || created_at_millis (8 bytes, BE) || order_id (16 bytes)`
///
/// Entries for one key therefore sort by creation time. Orders created in
/// the same millisecond fall back to order ID byte order, so "earliest" is
/// only exact to the millisecond.
#[must_use]
pub fn idempotency_index_key(order: &Order) -> Vec<u8> {
    let millis = u64::try_from(order.created_at.timestamp_millis()).unwrap_or(0);
    let mut key = idempotency_prefix(&order.idempotency_key);
    key.reserve(24);
    key.extend_from_slice(&millis.to_be_bytes());
    key.extend_from_slice(order.order_id.as_bytes());
    key
}

/// Extract the order ID from the last 16 bytes of an index key.
///
/// Returns `None` if the key is too short.
#[must_use]
pub fn extract_order_id_from_index_key(key: &[u8]) -> Option<OrderId> {
    let start = key.len().checked_sub(16)?;
    let bytes: [u8; 16] = key.get(start..)?.try_into().ok()?;
    Some(OrderId::from_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use order_flow_core::NewOrder;

    fn order(key: &str) -> Order {
        Order::new(
            IdempotencyKey::new(key).unwrap(),
            NewOrder {
                customer_name: "Alice".into(),
                total_amount: 10.0,
            },
        )
    }

    #[test]
    fn order_key_length() {
        assert_eq!(order_key(&OrderId::generate()).len(), 16);
    }

    #[test]
    fn index_key_starts_with_prefix() {
        let order = order("abc");
        let key = idempotency_index_key(&order);
        assert!(key.starts_with(&idempotency_prefix(&order.idempotency_key)));
        assert_eq!(key.len(), 4 + 3 + 8 + 16);
    }

    #[test]
    fn prefixes_of_related_keys_do_not_overlap() {
        let short = idempotency_prefix(&IdempotencyKey::new("ab").unwrap());
        let long = idempotency_index_key(&order("abc"));
        assert!(!long.starts_with(&short));
    }

    #[test]
    fn extract_order_id_roundtrip() {
        let order = order("k");
        let key = idempotency_index_key(&order);
        assert_eq!(extract_order_id_from_index_key(&key), Some(order.order_id));
        assert_eq!(extract_order_id_from_index_key(&[1, 2, 3]), None);
    }
}
