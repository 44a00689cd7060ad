/// Update-kind tags carried in the `type` field of inbound envelopes
pub mod update_kinds {
    pub const STOCK_UPDATE: &str = "STOCK_UPDATE";
    pub const MARKET_STATUS: &str = "MARKET_STATUS";
    pub const NEWS: &str = "NEWS";
}

/// Environment variables read by `LiveClientOptions::from_env`
pub mod env_vars {
    pub const WS_URL: &str = "LIVE_WS_URL";
    pub const CONNECT_TIMEOUT_MS: &str = "LIVE_CONNECT_TIMEOUT_MS";
    pub const RECONNECT_BASE_MS: &str = "LIVE_RECONNECT_BASE_MS";
    pub const RECONNECT_CAP_MS: &str = "LIVE_RECONNECT_CAP_MS";
    pub const RECONNECT_MAX_ATTEMPTS: &str = "LIVE_RECONNECT_MAX_ATTEMPTS";
}

/// Default handshake timeout (milliseconds)
pub const DEFAULT_TIMEOUT: u64 = 10000;

/// Reconnect backoff: `min(BASE * 2^attempts, CAP)` (milliseconds)
pub const RECONNECT_BASE_MS: u64 = 1000;
pub const RECONNECT_CAP_MS: u64 = 30000;

/// Automatic reconnects allowed before the client gives up
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Polling intervals used while no push channel is open (milliseconds)
pub const FREE_REFRESH_INTERVAL_MS: u64 = 30000;
pub const PREMIUM_REFRESH_INTERVAL_MS: u64 = 5000;

/// Rows per stock-list page
pub const FREE_ROW_LIMIT: u32 = 25;
pub const PREMIUM_ROW_LIMIT: u32 = 50;

/// Endpoints containing one of these are development placeholders, not servers
pub const PLACEHOLDER_ENDPOINTS: [&str; 1] = ["localhost:8080"];

/// Reported once the retry budget runs out
pub const RETRY_EXHAUSTED_MESSAGE: &str = "Failed to connect after multiple attempts";

/// WebSocket close codes
pub const WS_CLOSE_NORMAL: u16 = 1000;
