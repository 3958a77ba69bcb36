//! Common test utilities for order-flow integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use axum_test::TestServer;
use rand::rngs::StdRng;
use rand::SeedableRng;

use order_flow_core::ApprovalPolicy;
use order_flow_service::{
    create_router, AppState, ChannelQueue, OrderCreated, OrderQueue, QueueError, QueueReceiver,
    ServiceConfig, SettlementProcessor,
};
use order_flow_store::MemoryStore;

/// Header used by every creation request.
pub fn idempotency_header() -> HeaderName {
    HeaderName::from_static("idempotency-key")
}

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// The store behind the server.
    pub store: Arc<MemoryStore>,
    /// Receiving end of the order queue.
    pub receiver: QueueReceiver,
}

impl TestHarness {
    /// Create a new test harness with a fresh store and queue.
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let (queue, receiver) = ChannelQueue::new("test-queue", 64);
        let server = build_server(store.clone(), Arc::new(queue));

        Self {
            server,
            store,
            receiver,
        }
    }

    /// A settlement processor over this harness's store.
    pub fn processor(&self, policy: ApprovalPolicy) -> SettlementProcessor {
        SettlementProcessor::with_rng(self.store.clone(), policy, StdRng::seed_from_u64(7))
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a test server over the given store and queue.
pub fn build_server(store: Arc<MemoryStore>, queue: Arc<dyn OrderQueue>) -> TestServer {
    let state = AppState::new(store, queue, ServiceConfig::default());
    let router: Router = create_router(state);
    TestServer::new(router).expect("Failed to create test server")
}

/// Header value for an idempotency key.
pub fn key(value: &'static str) -> HeaderValue {
    HeaderValue::from_static(value)
}

/// A queue whose every send fails, to simulate a publish outage.
pub struct FailingQueue;

#[async_trait]
impl OrderQueue for FailingQueue {
    async fn send(&self, _event: &OrderCreated) -> Result<(), QueueError> {
        Err(QueueError::Closed("failing-queue".into()))
    }
}

/// A queue that fails its first send, then forwards to an in-process queue.
pub struct FlakyQueue {
    failed: AtomicBool,
    inner: ChannelQueue,
}

impl FlakyQueue {
    /// Create a flaky queue and the receiving end of its inner queue.
    pub fn new() -> (Self, QueueReceiver) {
        let (inner, receiver) = ChannelQueue::new("flaky-queue", 64);
        let queue = Self {
            failed: AtomicBool::new(false),
            inner,
        };
        (queue, receiver)
    }
}

#[async_trait]
impl OrderQueue for FlakyQueue {
    async fn send(&self, event: &OrderCreated) -> Result<(), QueueError> {
        if !self.failed.swap(true, Ordering::SeqCst) {
            return Err(QueueError::Closed("flaky-queue".into()));
        }
        self.inner.send(event).await
    }
}
