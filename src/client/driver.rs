use super::ConnectionState;
use super::state::ClientState;
use crate::messaging::MessageRouter;
use crate::types::constants::{RETRY_EXHAUSTED_MESSAGE, WS_CLOSE_NORMAL};
use crate::types::{LiveError, Result};
use crate::websocket::{Connector, Frame, Link};
use futures::future::BoxFuture;
use futures::{FutureExt, SinkExt, StreamExt};
use std::collections::VecDeque;
use std::ops::ControlFlow;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Sleep;

/// Requests from [`LiveClient`](super::LiveClient) handles
pub(crate) enum Command {
    Connect,
    Reconnect,
    Disconnect { done: oneshot::Sender<()> },
    Send { text: String, reply: oneshot::Sender<bool> },
    Shutdown,
}

impl Command {
    /// Commands that abandon a write in progress
    fn preempts_write(&self) -> bool {
        matches!(
            self,
            Command::Reconnect | Command::Disconnect { .. } | Command::Shutdown
        )
    }
}

/// Single task that owns the channel, the handshake, the retry timer and the
/// retry budget. Commands, handshake completion, inbound frames and the retry
/// timer are multiplexed in one loop, so at most one of them runs at a time.
pub(crate) struct Driver {
    state: ClientState,
    connector: Arc<dyn Connector>,
    router: MessageRouter,
    commands: mpsc::UnboundedReceiver<Command>,
    /// Commands received while a write was in progress; `None` marks a closed
    /// command channel
    deferred: VecDeque<Option<Command>>,
}

impl Driver {
    pub fn new(
        state: ClientState,
        connector: Arc<dyn Connector>,
        router: MessageRouter,
        commands: mpsc::UnboundedReceiver<Command>,
    ) -> Self {
        Self {
            state,
            connector,
            router,
            commands,
            deferred: VecDeque::new(),
        }
    }

    pub async fn run(mut self) {
        tracing::debug!("Starting live client driver");
        loop {
            if let Some(command) = self.deferred.pop_front() {
                if self.handle_command(command).await.is_break() {
                    break;
                }
                continue;
            }

            tokio::select! {
                command = self.commands.recv() => {
                    if self.handle_command(command).await.is_break() {
                        break;
                    }
                }
                opened = handshake(&mut self.state.opening) => self.on_opened(opened),
                frame = next_frame(&mut self.state.link) => self.on_frame(frame),
                () = retry_elapsed(&mut self.state.retry_at) => self.on_retry_elapsed(),
            }
        }

        self.teardown("Client shutting down").await;
        tracing::info!("Live client driver finished");
    }

    /// `Break` on shutdown or once every handle is gone
    async fn handle_command(&mut self, command: Option<Command>) -> ControlFlow<()> {
        match command {
            None | Some(Command::Shutdown) => return ControlFlow::Break(()),
            Some(Command::Connect) => self.connect(),
            Some(Command::Reconnect) => self.reconnect().await,
            Some(Command::Disconnect { done }) => {
                self.teardown("Client disconnect").await;
                let _ = done.send(());
            }
            Some(Command::Send { text, reply }) => {
                let sent = self.send(text).await;
                let _ = reply.send(sent);
            }
        }
        ControlFlow::Continue(())
    }

    fn connect(&mut self) {
        let Some(endpoint) = self.state.endpoint.clone() else {
            tracing::debug!("No live endpoint configured, staying disconnected");
            return;
        };
        if self.state.is_busy() {
            tracing::debug!("Channel already open, opening or scheduled; ignoring connect");
            return;
        }
        if self.state.current() == ConnectionState::Errored {
            tracing::warn!("Reconnection attempts exhausted; call reconnect() to try again");
            return;
        }
        self.open(endpoint);
    }

    async fn reconnect(&mut self) {
        if self.state.endpoint.is_none() {
            tracing::debug!("No live endpoint configured, ignoring reconnect");
            return;
        }
        tracing::info!("Manual reconnect requested");
        self.state.cancel_pending();
        self.close_link("Manual reconnect").await;
        self.state.timer.reset();
        self.state.publish(ConnectionState::Disconnected, None);
        self.connect();
    }

    fn open(&mut self, endpoint: String) {
        tracing::info!("Connecting to {}", endpoint);
        let attempt = self.connector.connect(&endpoint);
        let timeout = self.state.connect_timeout;
        self.state.opening = Some(
            async move {
                tokio::time::timeout(timeout, attempt)
                    .await
                    .unwrap_or(Err(LiveError::Timeout))
            }
            .boxed(),
        );
        self.state.publish(ConnectionState::Connecting, None);
    }

    fn on_opened(&mut self, result: Result<Link>) {
        self.state.opening = None;
        match result {
            Ok(link) => {
                self.state.link = Some(link);
                self.state.timer.reset();
                self.state.publish(ConnectionState::Connected, None);
                tracing::info!("Connected to live-data server");
            }
            Err(e) => {
                tracing::error!("Connection attempt failed: {}", e);
                self.on_channel_lost(e.to_string());
            }
        }
    }

    fn on_frame(&mut self, frame: Option<Result<Frame>>) {
        match frame {
            Some(Ok(Frame::Text(text))) => {
                self.router.route(&text);
            }
            Some(Ok(Frame::Close { code, reason })) => {
                tracing::warn!(
                    "Server closed connection: code={}, reason='{}'",
                    code,
                    reason
                );
                self.on_channel_lost(format!("closed by server with code {}", code));
            }
            Some(Err(e)) => {
                tracing::error!("WebSocket read error: {}", e);
                self.on_channel_lost(e.to_string());
            }
            None => {
                tracing::warn!("Live stream ended without close frame");
                self.on_channel_lost("stream ended".to_string());
            }
        }
    }

    /// Abnormal close: schedule a retry while budget remains, otherwise give up
    fn on_channel_lost(&mut self, reason: String) {
        self.state.link = None;
        match self.state.timer.next_delay() {
            Some(delay) => {
                let budget = self.state.timer.budget();
                tracing::info!(
                    "Reconnecting in {}ms (attempt {}/{})",
                    delay.as_millis(),
                    budget.attempts(),
                    budget.max()
                );
                self.state.retry_at = Some(Box::pin(tokio::time::sleep(delay)));
                self.state.publish(ConnectionState::Disconnected, None);
            }
            None => {
                tracing::warn!("Max reconnection attempts reached, last error: {}", reason);
                self.state.publish(
                    ConnectionState::Errored,
                    Some(format!("{}: {}", RETRY_EXHAUSTED_MESSAGE, reason)),
                );
            }
        }
    }

    fn on_retry_elapsed(&mut self) {
        self.state.retry_at = None;
        if let Some(endpoint) = self.state.endpoint.clone() {
            self.open(endpoint);
        }
    }

    /// Write one text frame. The write is bounded by the connect timeout and
    /// abandoned as soon as a reconnect, disconnect or shutdown arrives.
    async fn send(&mut self, text: String) -> bool {
        let Some(link) = self.state.link.as_mut() else {
            tracing::warn!("Cannot send message, connection not open");
            return false;
        };

        let written = {
            let write = tokio::time::timeout(
                self.state.connect_timeout,
                link.sink.send(Frame::Text(text)),
            );
            tokio::pin!(write);
            loop {
                tokio::select! {
                    written = &mut write => break Some(written),
                    command = self.commands.recv() => {
                        let preempts = command.as_ref().is_none_or(Command::preempts_write);
                        self.deferred.push_back(command);
                        if preempts {
                            break None;
                        }
                    }
                }
            }
        };

        match written {
            Some(Ok(Ok(()))) => true,
            Some(Ok(Err(e))) => {
                tracing::error!("Failed to send message: {}", e);
                self.on_channel_lost(e.to_string());
                false
            }
            Some(Err(_)) => {
                tracing::error!("Timed out writing to live channel");
                self.on_channel_lost("write timed out".to_string());
                false
            }
            None => {
                // a half-written frame leaves the link unusable, so it is not closed
                tracing::debug!("Write abandoned for pending teardown");
                self.state.link = None;
                false
            }
        }
    }

    /// Deliberate close: nothing is retried afterwards
    async fn teardown(&mut self, reason: &str) {
        self.state.cancel_pending();
        self.close_link(reason).await;
        self.state.timer.reset();
        self.state.publish(ConnectionState::Disconnected, None);
    }

    async fn close_link(&mut self, reason: &str) {
        let Some(mut link) = self.state.link.take() else {
            return;
        };
        tracing::info!("Closing live channel: {}", reason);
        let frame = Frame::Close {
            code: WS_CLOSE_NORMAL,
            reason: reason.to_string(),
        };
        match tokio::time::timeout(self.state.connect_timeout, link.sink.send(frame)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::debug!("Close frame not delivered: {}", e),
            Err(_) => tracing::debug!("Timed out sending close frame"),
        }
    }
}

async fn handshake(opening: &mut Option<BoxFuture<'static, Result<Link>>>) -> Result<Link> {
    match opening {
        Some(attempt) => attempt.await,
        None => std::future::pending().await,
    }
}

async fn next_frame(link: &mut Option<Link>) -> Option<Result<Frame>> {
    match link {
        Some(link) => link.stream.next().await,
        None => std::future::pending().await,
    }
}

async fn retry_elapsed(retry_at: &mut Option<Pin<Box<Sleep>>>) {
    match retry_at {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}
