use super::driver::Command;
use super::{ConnectionState, ConnectionStatus, LiveClientBuilder, LiveClientOptions};
use crate::fetcher::Invalidate;
use crate::infrastructure::TaskManager;
use crate::types::{LiveMessage, Result};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc, oneshot, watch};

/// Handle to the live-data connection.
///
/// `LiveClient` owns one logical WebSocket channel to the quote server. It
/// reconnects with exponential backoff after abnormal closes, gives up after a
/// bounded number of attempts, and signals cache invalidation when the server
/// pushes stock updates. Clones share the same connection.
///
/// Failures never surface as errors from these methods. They are reported
/// through [`status()`](Self::status) and [`watch_status()`](Self::watch_status).
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use stock_live::{InvalidationBus, LiveClient, LiveClientOptions};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let bus = InvalidationBus::default();
/// let client = LiveClient::new(
///     LiveClientOptions::with_endpoint("wss://quotes.example.com/live"),
///     Arc::new(bus.clone()),
/// )?;
///
/// client.connect();
/// // ...
/// client.shutdown().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LiveClient {
    pub(crate) enabled: bool,
    pub(crate) commands: mpsc::UnboundedSender<Command>,
    pub(crate) status: watch::Receiver<ConnectionStatus>,
    pub(crate) messages: watch::Receiver<Option<LiveMessage>>,
    pub(crate) tasks: Arc<Mutex<TaskManager>>,
}

impl LiveClient {
    /// Creates a client and spawns its driver task. Must be called inside a
    /// tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`LiveError::UrlParse`](crate::LiveError::UrlParse) or
    /// [`LiveError::Config`](crate::LiveError::Config) if the endpoint is set
    /// but malformed. An absent or placeholder endpoint is not an error; the
    /// client is then disabled and stays disconnected.
    pub fn new(options: LiveClientOptions, invalidator: Arc<dyn Invalidate>) -> Result<Self> {
        LiveClientBuilder::new(options, invalidator).map(|builder| builder.build())
    }

    /// Starts connecting. No-op when disabled, when a channel is already open
    /// or opening, when a retry is already scheduled, or after retries have
    /// been exhausted (use [`reconnect()`](Self::reconnect) then).
    pub fn connect(&self) {
        self.dispatch(Command::Connect);
    }

    /// Cancels any scheduled retry, closes the current channel, resets the
    /// retry budget and error, then connects again.
    pub fn reconnect(&self) {
        self.dispatch(Command::Reconnect);
    }

    /// Closes the channel deliberately. Nothing is retried afterwards until
    /// [`connect()`](Self::connect) is called again.
    pub async fn disconnect(&self) {
        let (done, rx) = oneshot::channel();
        if self.dispatch(Command::Disconnect { done }) {
            let _ = rx.await;
        }
    }

    /// Serializes `message` as JSON and sends it. Returns `false` when not
    /// connected, when the write fails or times out, or when a disconnect
    /// overtakes it; nothing is queued.
    pub async fn send<T: Serialize>(&self, message: &T) -> bool {
        match serde_json::to_string(message) {
            Ok(text) => self.send_text(text).await,
            Err(e) => {
                tracing::error!("Failed to serialize outbound message: {}", e);
                false
            }
        }
    }

    pub async fn send_text(&self, text: impl Into<String>) -> bool {
        let (reply, rx) = oneshot::channel();
        let command = Command::Send {
            text: text.into(),
            reply,
        };
        if !self.dispatch(command) {
            return false;
        }
        rx.await.unwrap_or(false)
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status.borrow().clone()
    }

    pub fn state(&self) -> ConnectionState {
        self.status.borrow().state
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Whether an operational endpoint is configured
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    /// Most recent successfully parsed inbound message
    pub fn last_message(&self) -> Option<LiveMessage> {
        self.messages.borrow().clone()
    }

    pub fn watch_messages(&self) -> watch::Receiver<Option<LiveMessage>> {
        self.messages.clone()
    }

    /// Closes the channel, cancels any scheduled retry and stops the driver
    /// task, waiting for it to finish.
    pub async fn shutdown(&self) {
        self.dispatch(Command::Shutdown);
        self.tasks.lock().await.join_all().await;
    }

    fn dispatch(&self, command: Command) -> bool {
        if self.commands.send(command).is_err() {
            tracing::debug!("Live client driver has stopped, command dropped");
            return false;
        }
        true
    }
}
