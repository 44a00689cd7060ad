use std::sync::Arc;
use std::time::Duration;
use stock_live::{
    CacheScope, FreshnessPolicy, InvalidationBus, LiveClient, LiveClientOptions, RefreshLoop,
    SubscriptionContext, Tier, UpdateKind,
};

/// Wire the live client, refresh loop and subscription tier together the way a
/// dashboard would, printing every invalidation and policy change.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stock_live=info".into()),
        )
        .init();

    println!("📈 Live dashboard\n");

    let bus = InvalidationBus::default();
    let client = LiveClient::new(LiveClientOptions::from_env()?, Arc::new(bus.clone()))?;

    let tier = std::env::var("LIVE_TIER")
        .ok()
        .map(|raw| raw.parse::<Tier>())
        .transpose()?
        .unwrap_or_default();
    let subscription = SubscriptionContext::new(tier);
    println!("👤 Subscription tier: {}", subscription.tier());

    let (refresh, mut decisions) = RefreshLoop::spawn(
        FreshnessPolicy::default(),
        client.watch_status(),
        subscription.subscribe(),
        Arc::new(bus.clone()),
    );

    let mut invalidations = bus.subscribe();
    tokio::spawn(async move {
        while let Ok(scope) = invalidations.recv().await {
            match scope {
                CacheScope::Stocks => println!("🔄 Stock lists invalidated, refetching"),
                CacheScope::All => println!("🔄 Everything invalidated, refetching"),
            }
        }
    });

    let mut messages = client.watch_messages();
    tokio::spawn(async move {
        while messages.changed().await.is_ok() {
            let Some(message) = messages.borrow_and_update().clone() else {
                continue;
            };
            match message.kind {
                UpdateKind::StockUpdate => println!("💹 Stock update: {}", message.data),
                UpdateKind::MarketStatus => println!("🏛  Market status: {}", message.data),
                UpdateKind::News => println!("📰 News: {}", message.data),
                UpdateKind::Other(kind) => println!("❔ Unhandled message type {}", kind),
            }
        }
    });

    let mut status = client.watch_status();
    tokio::spawn(async move {
        while status.changed().await.is_ok() {
            let current = status.borrow_and_update().clone();
            match current.error {
                Some(error) => println!("🔌 {} - {}", current.state, error),
                None => println!("🔌 {} (attempts: {})", current.state, current.attempts),
            }
        }
    });

    tokio::spawn(async move {
        while decisions.changed().await.is_ok() {
            let decision = *decisions.borrow_and_update();
            match decision.interval_ms() {
                Some(ms) if decision.polling_enabled => println!("⏲  Polling every {}ms", ms),
                _ => println!("⚡ Push-driven, polling off"),
            }
        }
    });

    client.connect();

    // Upgrading mid-session tightens the polling interval while disconnected
    tokio::time::sleep(Duration::from_secs(20)).await;
    if subscription.upgrade_to_premium() {
        println!("⭐ Upgraded to premium");
    }

    println!("⏳ Running until Ctrl-C...\n");
    tokio::signal::ctrl_c().await?;

    client.shutdown().await;
    refresh.await?;
    println!("👋 Bye");
    Ok(())
}
