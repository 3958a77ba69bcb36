//! Order event queue.
//!
//! Intake publishes an [`OrderCreated`] event per new order; settlement
//! consumes them in batches. Delivery is at-least-once and unordered, so
//! consumers must tolerate duplicates.
//!
//! [`ChannelQueue`] is the in-process implementation, a bounded
//! `tokio::sync::mpsc` channel. Sends never wait for capacity: a full queue
//! is reported as an error so the caller can retry the whole request.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use order_flow_core::OrderId;

/// Errors that can occur when publishing to the queue.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// The consumer side has shut down.
    #[error("queue {0} is closed")]
    Closed(String),

    /// The queue is at capacity.
    #[error("queue {0} is full")]
    Full(String),

    /// The event could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Event published after an order is persisted.
///
/// Carries only the order reference; consumers read the order from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreated {
    /// The new order.
    pub order_id: OrderId,
}

/// A message as delivered to consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    /// Unique per delivery attempt.
    pub message_id: String,
    /// Raw JSON body.
    pub body: String,
}

impl QueueMessage {
    /// Wrap a raw body in a message with a fresh ID.
    #[must_use]
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            message_id: uuid::Uuid::new_v4().to_string(),
            body: body.into(),
        }
    }

    /// Encode an `OrderCreated` event.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::Serialization` if encoding fails.
    pub fn order_created(event: &OrderCreated) -> Result<Self, QueueError> {
        let body =
            serde_json::to_string(event).map_err(|e| QueueError::Serialization(e.to_string()))?;
        Ok(Self::new(body))
    }
}

/// Send side of the order queue.
#[async_trait]
pub trait OrderQueue: Send + Sync {
    /// Publish an order-created event.
    ///
    /// # Errors
    ///
    /// Returns an error if the event could not be enqueued.
    async fn send(&self, event: &OrderCreated) -> Result<(), QueueError>;
}

/// In-process bounded queue.
pub struct ChannelQueue {
    name: String,
    sender: mpsc::Sender<QueueMessage>,
}

impl ChannelQueue {
    /// Create a queue and its receiving end.
    ///
    /// A `capacity` of zero is raised to one.
    #[must_use]
    pub fn new(name: impl Into<String>, capacity: usize) -> (Self, QueueReceiver) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let queue = Self {
            name: name.into(),
            sender,
        };
        (queue, QueueReceiver { receiver })
    }

    /// Enqueue a raw message.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::Full` or `QueueError::Closed`.
    pub fn send_message(&self, message: QueueMessage) -> Result<(), QueueError> {
        self.sender.try_send(message).map_err(|e| match e {
            TrySendError::Full(_) => QueueError::Full(self.name.clone()),
            TrySendError::Closed(_) => QueueError::Closed(self.name.clone()),
        })
    }
}

#[async_trait]
impl OrderQueue for ChannelQueue {
    async fn send(&self, event: &OrderCreated) -> Result<(), QueueError> {
        let message = QueueMessage::order_created(event)?;
        let message_id = message.message_id.clone();
        self.send_message(message)?;

        tracing::debug!(
            queue = %self.name,
            message_id = %message_id,
            order_id = %event.order_id,
            "Order event enqueued"
        );
        Ok(())
    }
}

/// Receive side of a [`ChannelQueue`].
pub struct QueueReceiver {
    receiver: mpsc::Receiver<QueueMessage>,
}

impl QueueReceiver {
    /// Wait for at least one message and return up to `max` of them.
    ///
    /// Returns `None` once every sender is dropped and the queue is drained.
    pub async fn next_batch(&mut self, max: usize) -> Option<Vec<QueueMessage>> {
        let max = max.max(1);
        let mut batch = Vec::with_capacity(max);
        if self.receiver.recv_many(&mut batch, max).await == 0 {
            return None;
        }
        Some(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_and_receive_batch() {
        let (queue, mut receiver) = ChannelQueue::new("test-queue", 8);
        let first = OrderCreated {
            order_id: OrderId::generate(),
        };
        let second = OrderCreated {
            order_id: OrderId::generate(),
        };

        queue.send(&first).await.unwrap();
        queue.send(&second).await.unwrap();

        let batch = receiver.next_batch(10).await.unwrap();
        assert_eq!(batch.len(), 2);

        let decoded: OrderCreated = serde_json::from_str(&batch[0].body).unwrap();
        assert_eq!(decoded, first);
        assert!(batch[0].body.contains("\"orderId\""));
    }

    #[tokio::test]
    async fn batch_respects_max() {
        let (queue, mut receiver) = ChannelQueue::new("test-queue", 8);
        for _ in 0..5 {
            queue
                .send(&OrderCreated {
                    order_id: OrderId::generate(),
                })
                .await
                .unwrap();
        }

        assert_eq!(receiver.next_batch(3).await.unwrap().len(), 3);
        assert_eq!(receiver.next_batch(3).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn full_queue_is_an_error() {
        let (queue, _receiver) = ChannelQueue::new("tiny", 1);
        let event = OrderCreated {
            order_id: OrderId::generate(),
        };

        queue.send(&event).await.unwrap();
        assert!(matches!(
            queue.send(&event).await,
            Err(QueueError::Full(name)) if name == "tiny"
        ));
    }

    #[tokio::test]
    async fn closed_queue_is_an_error() {
        let (queue, receiver) = ChannelQueue::new("gone", 4);
        drop(receiver);

        let event = OrderCreated {
            order_id: OrderId::generate(),
        };
        assert!(matches!(queue.send(&event).await, Err(QueueError::Closed(_))));
    }

    #[tokio::test]
    async fn receiver_ends_when_senders_drop() {
        let (queue, mut receiver) = ChannelQueue::new("done", 4);
        drop(queue);
        assert!(receiver.next_batch(10).await.is_none());
    }
}
