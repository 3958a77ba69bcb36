//! Order-flow service - order intake API with background payment settlement.
//!
//! This is the main entry point for the order-flow service.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use order_flow_service::{
    create_router, run_settlement_worker, AppState, ChannelQueue, ServiceConfig,
    SettlementProcessor,
};
use order_flow_store::OrderStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,order_flow=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting order-flow service");

    // Load configuration from environment
    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        orders_table = %config.orders_table,
        order_queue = %config.order_queue_url,
        approval_policy = ?config.approval_policy,
        "Service configuration loaded"
    );

    let store = open_store(&config)?;

    // Queue and settlement worker
    let (queue, receiver) = ChannelQueue::new(config.order_queue_url.clone(), config.queue_capacity);
    let processor = Arc::new(SettlementProcessor::new(
        store.clone(),
        config.approval_policy,
    ));
    tokio::spawn(run_settlement_worker(
        processor,
        receiver,
        config.settlement_batch_size,
    ));

    // Build app state
    let state = AppState::new(store, Arc::new(queue), config.clone());

    // Create the router
    let app = create_router(state);

    // Start HTTP server
    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(feature = "rocksdb-backend")]
fn open_store(config: &ServiceConfig) -> Result<Arc<dyn OrderStore>, Box<dyn std::error::Error>> {
    tracing::info!(path = %config.orders_table, "Opening RocksDB store");
    let store = order_flow_store::RocksStore::open(&config.orders_table)?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "rocksdb-backend"))]
#[allow(clippy::unnecessary_wraps)] // Matches the fallible RocksDB variant
fn open_store(config: &ServiceConfig) -> Result<Arc<dyn OrderStore>, Box<dyn std::error::Error>> {
    tracing::warn!(
        orders_table = %config.orders_table,
        "RocksDB backend not enabled - orders are kept in memory"
    );
    Ok(Arc::new(order_flow_store::MemoryStore::new()))
}
