use serde::Serialize;

/// Lifecycle of the single live-data channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    /// Retry budget exhausted; only an explicit reconnect leaves this state
    Errored,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Errored => "errored",
        };
        f.write_str(label)
    }
}

/// Snapshot published to observers on every transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    /// Human-readable description, set only once retries are exhausted
    pub error: Option<String>,
    /// Automatic reconnects spent since the last successful open
    pub attempts: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_disconnected() {
        let status = ConnectionStatus::default();
        assert_eq!(status.state, ConnectionState::Disconnected);
        assert_eq!(status.error, None);
        assert_eq!(status.attempts, 0);
    }

    #[test]
    fn test_only_connected_is_connected() {
        assert!(ConnectionState::Connected.is_connected());
        assert!(!ConnectionState::Connecting.is_connected());
        assert!(!ConnectionState::Errored.is_connected());
        assert_eq!(ConnectionState::Errored.to_string(), "errored");
    }
}
