use std::sync::Arc;
use std::time::Duration;
use stock_live::{ConnectionState, InvalidationBus, LiveClient, LiveClientOptions};

/// Exercise reconnection behavior against a running quote server
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stock_live=debug".into()),
        )
        .init();

    println!("🦀 Testing Reconnection\n");

    let options = LiveClientOptions::from_env()?;
    let bus = InvalidationBus::default();
    let client = LiveClient::new(options, Arc::new(bus))?;

    if !client.is_enabled() {
        println!("⚠️  LIVE_WS_URL is unset or a placeholder; nothing to test");
        return Ok(());
    }

    let mut status = client.watch_status();

    // Test 1: Connect and verify
    println!("✅ Test 1: Initial connection...");
    client.connect();
    let reached = tokio::time::timeout(
        Duration::from_secs(15),
        status.wait_for(|s| s.state == ConnectionState::Connected),
    )
    .await;
    if !matches!(reached, Ok(Ok(_))) {
        return Err(format!("Could not connect: {:?}", client.status()).into());
    }
    println!("✅ Connected successfully!\n");

    tokio::time::sleep(Duration::from_secs(2)).await;

    // Test 2: Manual disconnect should NOT trigger reconnection
    println!("✅ Test 2: Manual disconnect (should NOT auto-reconnect)...");
    client.disconnect().await;
    assert!(!client.is_connected(), "Should be disconnected");

    println!("⏳ Waiting 5 seconds to verify no auto-reconnect...");
    tokio::time::sleep(Duration::from_secs(5)).await;
    if client.state() != ConnectionState::Disconnected {
        return Err("Should NOT reconnect after manual disconnect".into());
    }
    println!("✅ Correctly stayed disconnected after manual disconnect!\n");

    // Test 3: Reconnect and watch the server side drop
    println!("✅ Test 3: Testing automatic reconnection...");
    client.reconnect();
    println!("💡 Restart the quote server or interrupt the network now.");
    println!("   Backoff runs 1s, 2s, 4s, 8s, 16s and then gives up.\n");

    for i in 1..=60 {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let current = client.status();
        print!(
            "\r⏱  Second {}/60 - {} (attempts: {})",
            i, current.state, current.attempts
        );
        std::io::Write::flush(&mut std::io::stdout())?;
    }
    println!("\n");

    let current = client.status();
    match current.state {
        ConnectionState::Connected => println!("✅ Final status: Connected"),
        ConnectionState::Errored => println!(
            "❌ Final status: Errored ({})",
            current.error.unwrap_or_default()
        ),
        other => println!("⚠️  Final status: {}", other),
    }

    client.shutdown().await;
    println!("\n🎉 Reconnection tests completed!");
    Ok(())
}
