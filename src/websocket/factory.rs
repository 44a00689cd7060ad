use super::{Connector, Frame, Link};
use crate::types::{LiveError, Result};
use futures::future::{self, BoxFuture};
use futures::{FutureExt, SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{
    self, Message,
    protocol::{CloseFrame, frame::coding::CloseCode},
};

/// Close code reported when the server closes without a close frame
const CLOSE_NO_STATUS: u16 = 1005;

/// WebSocket factory for creating WebSocket connections
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketFactory;

impl WebSocketFactory {
    /// Open a WebSocket connection and wrap it as a [`Link`]
    pub async fn create(url: &str) -> Result<Link> {
        tracing::debug!("Creating WebSocket connection to: {}", url);
        let (ws_stream, response) = connect_async(url).await?;
        tracing::debug!("WebSocket handshake completed: {}", response.status());

        let (write_half, read_half) = ws_stream.split();
        let sink = write_half
            .sink_map_err(LiveError::from)
            .with(|frame: Frame| future::ready(Ok::<_, LiveError>(into_message(frame))));
        let stream = read_half.filter_map(|msg| future::ready(from_message(msg)));

        Ok(Link::new(Box::pin(sink), Box::pin(stream)))
    }
}

impl Connector for WebSocketFactory {
    fn connect(&self, endpoint: &str) -> BoxFuture<'static, Result<Link>> {
        let url = endpoint.to_string();
        async move { Self::create(&url).await }.boxed()
    }
}

fn into_message(frame: Frame) -> Message {
    match frame {
        Frame::Text(text) => Message::Text(text.into()),
        Frame::Close { code, reason } => Message::Close(Some(CloseFrame {
            code: CloseCode::from(code),
            reason: reason.into(),
        })),
    }
}

fn from_message(msg: std::result::Result<Message, tungstenite::Error>) -> Option<Result<Frame>> {
    match msg {
        Ok(Message::Text(text)) => Some(Ok(Frame::Text(text.as_str().to_owned()))),
        Ok(Message::Close(frame)) => {
            let (code, reason) = match frame {
                Some(close_frame) => (
                    u16::from(close_frame.code),
                    close_frame.reason.as_str().to_owned(),
                ),
                None => (CLOSE_NO_STATUS, String::new()),
            };
            Some(Ok(Frame::Close { code, reason }))
        }
        Ok(Message::Binary(data)) => {
            tracing::warn!("Received unexpected binary message ({} bytes)", data.len());
            None
        }
        Ok(Message::Ping(data)) => {
            tracing::debug!("Received ping ({} bytes)", data.len());
            None
        }
        Ok(Message::Pong(data)) => {
            tracing::debug!("Received pong ({} bytes)", data.len());
            None
        }
        Ok(Message::Frame(_)) => None,
        Err(e) => Some(Err(e.into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_frame_round_trip_through_message() {
        let message = into_message(Frame::Close {
            code: 1000,
            reason: "bye".to_string(),
        });
        assert_eq!(
            from_message(Ok(message)).unwrap().unwrap(),
            Frame::Close {
                code: 1000,
                reason: "bye".to_string()
            }
        );
    }

    #[test]
    fn test_close_without_frame_reports_no_status() {
        assert_eq!(
            from_message(Ok(Message::Close(None))).unwrap().unwrap(),
            Frame::Close {
                code: CLOSE_NO_STATUS,
                reason: String::new()
            }
        );
    }

    #[test]
    fn test_control_frames_are_skipped() {
        assert!(from_message(Ok(Message::Ping(Vec::<u8>::new().into()))).is_none());
        assert!(from_message(Ok(Message::Pong(Vec::<u8>::new().into()))).is_none());
        assert!(from_message(Ok(Message::Binary(vec![1u8, 2, 3].into()))).is_none());
    }

    #[test]
    fn test_read_errors_surface() {
        let result = from_message(Err(tungstenite::Error::ConnectionClosed)).unwrap();
        assert!(matches!(result, Err(LiveError::WebSocket(_))));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_fails() {
        let result = WebSocketFactory.connect("ws://127.0.0.1:1/").await;
        assert!(result.is_err());
    }
}
