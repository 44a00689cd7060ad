use super::{FreshnessDecision, FreshnessPolicy, Tier};
use crate::ConnectionStatus;
use crate::fetcher::{CacheScope, Invalidate};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Applies the freshness policy: recomputes the decision whenever the
/// connection status or tier changes, and while polling is enabled
/// invalidates stock lists once per interval.
pub struct RefreshLoop {
    policy: FreshnessPolicy,
    status: watch::Receiver<ConnectionStatus>,
    tier: watch::Receiver<Tier>,
    invalidator: Arc<dyn Invalidate>,
    decision_tx: watch::Sender<FreshnessDecision>,
}

impl RefreshLoop {
    /// Spawn the loop. It stops when either input channel closes.
    pub fn spawn(
        policy: FreshnessPolicy,
        mut status: watch::Receiver<ConnectionStatus>,
        mut tier: watch::Receiver<Tier>,
        invalidator: Arc<dyn Invalidate>,
    ) -> (JoinHandle<()>, watch::Receiver<FreshnessDecision>) {
        let state = status.borrow_and_update().state;
        let initial = policy.decide(state, *tier.borrow_and_update());
        let (decision_tx, decision_rx) = watch::channel(initial);

        let refresh = Self {
            policy,
            status,
            tier,
            invalidator,
            decision_tx,
        };
        (tokio::spawn(refresh.run()), decision_rx)
    }

    async fn run(mut self) {
        let mut current = *self.decision_tx.borrow();
        let mut next_poll = schedule(&current);
        tracing::debug!("Refresh loop started: {:?}", current);

        loop {
            tokio::select! {
                () = poll_due(next_poll) => {
                    tracing::debug!("Polling interval elapsed, invalidating stock lists");
                    self.invalidator.invalidate(CacheScope::Stocks);
                    next_poll = schedule(&current);
                }
                changed = self.status.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                changed = self.tier.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }

            let state = self.status.borrow_and_update().state;
            let next = self.policy.decide(state, *self.tier.borrow_and_update());
            if next != current {
                tracing::info!(
                    "Refresh policy changed: polling={} interval={:?}",
                    next.polling_enabled,
                    next.interval
                );
                current = next;
                next_poll = schedule(&current);
                self.decision_tx.send_replace(current);
            }
        }
        tracing::debug!("Refresh loop finished");
    }
}

fn schedule(decision: &FreshnessDecision) -> Option<Instant> {
    if !decision.polling_enabled {
        return None;
    }
    decision.interval.map(|interval| Instant::now() + interval)
}

async fn poll_due(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
