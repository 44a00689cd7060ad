//! # Stock Live
//!
//! Live-data coordination for a stock dashboard: a single WebSocket channel to
//! the quote server with bounded exponential-backoff reconnection, push-driven
//! cache invalidation, and a tier-aware polling fallback while the channel is
//! down.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use stock_live::{
//!     FreshnessPolicy, InvalidationBus, LiveClient, LiveClientOptions, RefreshLoop,
//!     SubscriptionContext,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bus = InvalidationBus::default();
//!     let client = LiveClient::new(LiveClientOptions::from_env()?, Arc::new(bus.clone()))?;
//!     let subscription = SubscriptionContext::default();
//!
//!     let (_refresh, decisions) = RefreshLoop::spawn(
//!         FreshnessPolicy::default(),
//!         client.watch_status(),
//!         subscription.subscribe(),
//!         Arc::new(bus.clone()),
//!     );
//!
//!     client.connect();
//!     println!("polling: {}", decisions.borrow().polling_enabled);
//!
//!     client.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod fetcher;
pub mod freshness;
pub mod infrastructure;
pub mod messaging;
pub mod subscription;
pub mod types;
pub mod websocket;

pub use client::{
    ConnectionState, ConnectionStatus, LiveClient, LiveClientBuilder, LiveClientOptions,
};
pub use fetcher::{
    CacheScope, DataFetcher, Invalidate, InvalidationBus, Page, PageRequest, RowLimits,
    SortDirection, SortSpec,
};
pub use freshness::{FreshnessDecision, FreshnessPolicy, RefreshLoop, Tier, decide};
pub use messaging::{MessageRouter, UpdateKind};
pub use subscription::SubscriptionContext;
pub use types::{LiveError, LiveMessage, Result};
pub use websocket::{Connector, Frame, Link, WebSocketFactory};
