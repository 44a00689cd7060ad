use super::{ConnectionState, ConnectionStatus};
use crate::infrastructure::Timer;
use crate::types::Result;
use crate::websocket::Link;
use futures::future::BoxFuture;
use std::pin::Pin;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Sleep;

/// Everything the driver owns. Nothing outside the driver task touches it.
pub(crate) struct ClientState {
    /// Resolved endpoint; `None` means live data is disabled
    pub endpoint: Option<String>,
    pub timer: Timer,
    pub connect_timeout: Duration,

    /// Open channel. Present exactly while the state is Connected.
    pub link: Option<Link>,

    /// Handshake in flight
    pub opening: Option<BoxFuture<'static, Result<Link>>>,

    /// Pending automatic reconnect
    pub retry_at: Option<Pin<Box<Sleep>>>,

    status_tx: watch::Sender<ConnectionStatus>,
}

impl ClientState {
    pub fn new(
        endpoint: Option<String>,
        timer: Timer,
        connect_timeout: Duration,
        status_tx: watch::Sender<ConnectionStatus>,
    ) -> Self {
        Self {
            endpoint,
            timer,
            connect_timeout,
            link: None,
            opening: None,
            retry_at: None,
            status_tx,
        }
    }

    pub fn current(&self) -> ConnectionState {
        self.status_tx.borrow().state
    }

    /// Whether a channel is open, opening, or about to be retried
    pub fn is_busy(&self) -> bool {
        self.link.is_some() || self.opening.is_some() || self.retry_at.is_some()
    }

    /// Drop the pending retry timer and any in-flight handshake
    pub fn cancel_pending(&mut self) {
        if self.retry_at.take().is_some() {
            tracing::debug!("Cancelled pending reconnect");
        }
        if self.opening.take().is_some() {
            tracing::debug!("Abandoned in-flight connection attempt");
        }
    }

    /// Publish a status, notifying watchers only if something changed
    pub fn publish(&self, state: ConnectionState, error: Option<String>) {
        let next = ConnectionStatus {
            state,
            error,
            attempts: self.timer.budget().attempts(),
        };
        self.status_tx.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            if current.state != next.state {
                tracing::info!("Connection state {} -> {}", current.state, next.state);
            }
            *current = next;
            true
        });
    }
}
