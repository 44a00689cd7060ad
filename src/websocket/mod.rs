//! Transport seam between the client and the wire.
//!
//! The client never touches tungstenite types directly; it drives a [`Link`]
//! produced by a [`Connector`]. [`WebSocketFactory`] is the production
//! connector, tests plug in their own.

mod factory;

pub use factory::WebSocketFactory;

use crate::types::Result;
use futures::future::BoxFuture;
use futures::{Sink, Stream};
use std::pin::Pin;

/// Frame as seen by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Close { code: u16, reason: String },
}

pub type FrameSink = Pin<Box<dyn Sink<Frame, Error = crate::LiveError> + Send>>;
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<Frame>> + Send>>;

/// An open channel: write half and read half
pub struct Link {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

impl Link {
    pub fn new(sink: FrameSink, stream: FrameStream) -> Self {
        Self { sink, stream }
    }
}

/// Opens channels to an endpoint
pub trait Connector: Send + Sync + 'static {
    fn connect(&self, endpoint: &str) -> BoxFuture<'static, Result<Link>>;
}
