use crate::freshness::Tier;
use tokio::sync::watch;

/// Current user's subscription tier, shared between the UI layer and the
/// refresh loop. Clones observe the same value.
#[derive(Clone)]
pub struct SubscriptionContext {
    tier: watch::Sender<Tier>,
}

impl SubscriptionContext {
    pub fn new(tier: Tier) -> Self {
        let (tier, _) = watch::channel(tier);
        Self { tier }
    }

    pub fn tier(&self) -> Tier {
        *self.tier.borrow()
    }

    /// Returns `true` if the tier actually changed
    pub fn set_tier(&self, tier: Tier) -> bool {
        let changed = self.tier.send_if_modified(|current| {
            if *current == tier {
                return false;
            }
            *current = tier;
            true
        });
        if changed {
            tracing::info!("Subscription tier changed to {}", tier);
        }
        changed
    }

    /// Moves a free account to premium. Premium and enterprise are unchanged.
    pub fn upgrade_to_premium(&self) -> bool {
        if self.is_premium() {
            return false;
        }
        self.set_tier(Tier::Premium)
    }

    pub fn is_premium(&self) -> bool {
        self.tier().is_premium()
    }

    /// Receiver for [`RefreshLoop::spawn`](crate::RefreshLoop::spawn)
    pub fn subscribe(&self) -> watch::Receiver<Tier> {
        self.tier.subscribe()
    }
}

impl Default for SubscriptionContext {
    fn default() -> Self {
        Self::new(Tier::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_free() {
        let context = SubscriptionContext::default();
        assert_eq!(context.tier(), Tier::Free);
        assert!(!context.is_premium());
    }

    #[test]
    fn test_upgrade_to_premium() {
        let context = SubscriptionContext::default();
        let mut rx = context.subscribe();

        assert!(context.upgrade_to_premium());
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), Tier::Premium);

        assert!(!context.upgrade_to_premium());
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_enterprise_is_not_downgraded() {
        let context = SubscriptionContext::new(Tier::Enterprise);
        assert!(!context.upgrade_to_premium());
        assert_eq!(context.tier(), Tier::Enterprise);
    }

    #[test]
    fn test_clones_share_tier() {
        let context = SubscriptionContext::default();
        let other = context.clone();
        assert!(other.set_tier(Tier::Enterprise));
        assert!(!other.set_tier(Tier::Enterprise));
        assert_eq!(context.tier(), Tier::Enterprise);
    }
}
