//! Application state.

use std::sync::Arc;

use order_flow_store::OrderStore;

use crate::config::ServiceConfig;
use crate::intake::OrderIntake;
use crate::queue::OrderQueue;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<dyn OrderStore>,

    /// Order intake over the same store and the order queue.
    pub intake: OrderIntake,

    /// Service configuration.
    pub config: ServiceConfig,
}

impl AppState {
    /// Create a new application state from injected store and queue clients.
    #[must_use]
    pub fn new(
        store: Arc<dyn OrderStore>,
        queue: Arc<dyn OrderQueue>,
        config: ServiceConfig,
    ) -> Self {
        tracing::info!(
            orders_table = %config.orders_table,
            order_queue = %config.order_queue_url,
            "Order intake configured"
        );

        let intake = OrderIntake::new(store.clone(), queue);

        Self {
            store,
            intake,
            config,
        }
    }
}
