use crate::ConnectionState;
use crate::types::LiveError;
use crate::types::constants::{FREE_REFRESH_INTERVAL_MS, PREMIUM_REFRESH_INTERVAL_MS};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Account subscription level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Premium,
    Enterprise,
}

impl Tier {
    pub fn is_premium(self) -> bool {
        matches!(self, Self::Premium | Self::Enterprise)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Premium => "premium",
            Self::Enterprise => "enterprise",
        }
    }
}

impl FromStr for Tier {
    type Err = LiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "premium" => Ok(Self::Premium),
            "enterprise" => Ok(Self::Enterprise),
            other => Err(LiveError::Config(format!("unknown tier '{}'", other))),
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether and how often list data should be re-pulled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FreshnessDecision {
    pub polling_enabled: bool,
    pub interval: Option<Duration>,
}

impl FreshnessDecision {
    /// Data arrives over the push channel; never poll, never stale
    pub fn push_driven() -> Self {
        Self {
            polling_enabled: false,
            interval: None,
        }
    }

    pub fn polling(interval: Duration) -> Self {
        Self {
            polling_enabled: true,
            interval: Some(interval),
        }
    }

    pub fn interval_ms(&self) -> Option<u64> {
        self.interval.map(|interval| interval.as_millis() as u64)
    }

    /// How long fetched data may be trusted; `None` means indefinitely
    pub fn stale_after(&self) -> Option<Duration> {
        self.interval
    }
}

/// Refresh cadence per tier while no push channel is connected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessPolicy {
    pub free_interval: Duration,
    pub premium_interval: Duration,
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self {
            free_interval: Duration::from_millis(FREE_REFRESH_INTERVAL_MS),
            premium_interval: Duration::from_millis(PREMIUM_REFRESH_INTERVAL_MS),
        }
    }
}

impl FreshnessPolicy {
    pub fn decide(&self, state: ConnectionState, tier: Tier) -> FreshnessDecision {
        if state.is_connected() {
            FreshnessDecision::push_driven()
        } else {
            FreshnessDecision::polling(self.tier_interval(tier))
        }
    }

    pub fn tier_interval(&self, tier: Tier) -> Duration {
        if tier.is_premium() {
            self.premium_interval
        } else {
            self.free_interval
        }
    }
}

/// [`FreshnessPolicy::decide`] with the default intervals
pub fn decide(state: ConnectionState, tier: Tier) -> FreshnessDecision {
    FreshnessPolicy::default().decide(state, tier)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_TIERS: [Tier; 3] = [Tier::Free, Tier::Premium, Tier::Enterprise];
    const NOT_CONNECTED: [ConnectionState; 3] = [
        ConnectionState::Disconnected,
        ConnectionState::Connecting,
        ConnectionState::Errored,
    ];

    #[test]
    fn test_connected_never_polls() {
        for tier in ALL_TIERS {
            let decision = decide(ConnectionState::Connected, tier);
            assert!(!decision.polling_enabled);
            assert_eq!(decision.interval_ms(), None);
            assert_eq!(decision.stale_after(), None);
        }
    }

    #[test]
    fn test_polling_iff_not_connected() {
        for state in NOT_CONNECTED {
            for tier in ALL_TIERS {
                assert!(decide(state, tier).polling_enabled, "{} / {}", state, tier);
            }
        }
    }

    #[test]
    fn test_tier_intervals() {
        assert_eq!(
            decide(ConnectionState::Disconnected, Tier::Free).interval_ms(),
            Some(30000)
        );
        assert_eq!(
            decide(ConnectionState::Errored, Tier::Premium).interval_ms(),
            Some(5000)
        );
        assert_eq!(
            decide(ConnectionState::Connecting, Tier::Enterprise).interval_ms(),
            Some(5000)
        );
    }

    #[test]
    fn test_custom_policy() {
        let policy = FreshnessPolicy {
            free_interval: Duration::from_secs(60),
            premium_interval: Duration::from_secs(1),
        };
        assert_eq!(
            policy.decide(ConnectionState::Errored, Tier::Free),
            FreshnessDecision::polling(Duration::from_secs(60))
        );
        assert_eq!(
            policy.decide(ConnectionState::Connected, Tier::Premium),
            FreshnessDecision::push_driven()
        );
    }

    #[test]
    fn test_tier_parse() {
        assert_eq!("Premium".parse::<Tier>().unwrap(), Tier::Premium);
        assert_eq!(" enterprise ".parse::<Tier>().unwrap(), Tier::Enterprise);
        assert!("gold".parse::<Tier>().is_err());
        assert!(!Tier::Free.is_premium());
        assert_eq!(Tier::default(), Tier::Free);
    }
}
