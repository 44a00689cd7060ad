use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Errors produced inside the live-data layer.
///
/// These never cross the [`LiveClient`](crate::LiveClient) boundary as return
/// values of its lifecycle methods; the client folds them into
/// [`ConnectionStatus`](crate::ConnectionStatus) instead. They do surface from
/// construction, configuration and [`Connector`](crate::Connector) implementations.
#[derive(Error, Debug)]
pub enum LiveError {
    /// WebSocket protocol error (handshake failed, invalid frame, etc.)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// General channel error with descriptive message
    #[error("Connection error: {0}")]
    Connection(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing error (malformed endpoint URL)
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Handshake did not complete within the configured timeout
    #[error("Timeout error")]
    Timeout,
}

/// Convenience type alias for `Result<T, LiveError>`.
pub type Result<T> = std::result::Result<T, LiveError>;
