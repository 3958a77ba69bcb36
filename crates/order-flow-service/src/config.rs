//! Service configuration.

use order_flow_core::ApprovalPolicy;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Order store location (default: "orders").
    ///
    /// With the `rocksdb-backend` feature this is the database directory;
    /// otherwise it only names the in-memory store in logs.
    pub orders_table: String,

    /// Order queue location identifier (default: "order-queue").
    pub order_queue_url: String,

    /// Payment approval policy (`ALWAYS`, `NEVER`, otherwise randomized).
    pub approval_policy: ApprovalPolicy,

    /// Capacity of the in-process order queue.
    pub queue_capacity: usize,

    /// Maximum number of messages settled per batch.
    pub settlement_batch_size: usize,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            orders_table: std::env::var("ORDERS_TABLE").unwrap_or(defaults.orders_table),
            order_queue_url: std::env::var("ORDER_QUEUE_URL").unwrap_or(defaults.order_queue_url),
            approval_policy: std::env::var("PAYMENT_APPROVAL")
                .map(|v| ApprovalPolicy::from_setting(&v))
                .unwrap_or_default(),
            queue_capacity: parse_env("QUEUE_CAPACITY").unwrap_or(defaults.queue_capacity),
            settlement_batch_size: parse_env("SETTLEMENT_BATCH_SIZE")
                .filter(|n| *n > 0)
                .unwrap_or(defaults.settlement_batch_size),
            cors_origins: std::env::var("CORS_ORIGINS").map_or(defaults.cors_origins, |s| {
                s.split(',').map(|s| s.trim().to_string()).collect()
            }),
            max_body_bytes: parse_env("MAX_BODY_BYTES").unwrap_or(defaults.max_body_bytes),
            request_timeout_seconds: parse_env("REQUEST_TIMEOUT_SECONDS")
                .unwrap_or(defaults.request_timeout_seconds),
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            orders_table: "orders".into(),
            order_queue_url: "order-queue".into(),
            approval_policy: ApprovalPolicy::Random,
            queue_capacity: 1024,
            settlement_batch_size: 10,
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024, // 1MB
            request_timeout_seconds: 30,
        }
    }
}
