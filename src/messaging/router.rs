use super::UpdateKind;
use crate::fetcher::Invalidate;
use crate::types::message::LiveMessage;
use std::sync::Arc;
use tokio::sync::watch;

/// Routes inbound text frames to the invalidation collaborator
pub struct MessageRouter {
    invalidator: Arc<dyn Invalidate>,
    last_message_tx: watch::Sender<Option<LiveMessage>>,
}

impl MessageRouter {
    pub fn new(
        invalidator: Arc<dyn Invalidate>,
        last_message_tx: watch::Sender<Option<LiveMessage>>,
    ) -> Self {
        Self {
            invalidator,
            last_message_tx,
        }
    }

    /// Parses and dispatches a frame. Returns the parsed kind, or `None` when
    /// the frame was dropped.
    pub fn route(&self, text: &str) -> Option<UpdateKind> {
        let message = match LiveMessage::parse(text) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("Dropping unparseable message: {} - Raw: {}", e, text);
                return None;
            }
        };

        tracing::debug!(
            "Routing message: type={}, data={}",
            message.kind,
            message.data
        );

        let kind = message.kind.clone();
        if let Some(scope) = kind.invalidates() {
            self.invalidator.invalidate(scope);
        } else if !kind.is_known() {
            tracing::debug!("Ignoring unrecognized update type {}", kind);
        }

        self.last_message_tx.send_replace(Some(message));
        Some(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::CacheScope;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<CacheScope>>);

    impl Invalidate for Recorder {
        fn invalidate(&self, scope: CacheScope) {
            self.0.lock().unwrap().push(scope);
        }
    }

    fn router() -> (
        MessageRouter,
        Arc<Recorder>,
        watch::Receiver<Option<LiveMessage>>,
    ) {
        let recorder = Arc::new(Recorder::default());
        let (tx, rx) = watch::channel(None);
        (MessageRouter::new(recorder.clone(), tx), recorder, rx)
    }

    #[test]
    fn test_stock_update_invalidates_stocks() {
        let (router, recorder, rx) = router();

        let kind = router.route(r#"{"type":"STOCK_UPDATE","data":{"symbol":"NVDA"}}"#);

        assert_eq!(kind, Some(UpdateKind::StockUpdate));
        assert_eq!(*recorder.0.lock().unwrap(), vec![CacheScope::Stocks]);
        assert_eq!(
            rx.borrow().as_ref().map(|m| m.kind.clone()),
            Some(UpdateKind::StockUpdate)
        );
    }

    #[test]
    fn test_other_kinds_do_not_invalidate() {
        let (router, recorder, rx) = router();

        router.route(r#"{"type":"NEWS","data":"headline"}"#);
        router.route(r#"{"type":"DIVIDEND","data":null}"#);

        assert!(recorder.0.lock().unwrap().is_empty());
        assert_eq!(
            rx.borrow().as_ref().map(|m| m.kind.clone()),
            Some(UpdateKind::Other("DIVIDEND".to_string()))
        );
    }

    #[test]
    fn test_malformed_message_is_dropped() {
        let (router, recorder, rx) = router();

        assert_eq!(router.route("{oops"), None);
        assert!(recorder.0.lock().unwrap().is_empty());
        assert!(rx.borrow().is_none());
    }
}
