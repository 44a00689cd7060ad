use super::driver::Driver;
use super::state::ClientState;
use super::{ConnectionStatus, LiveClient};
use crate::fetcher::Invalidate;
use crate::infrastructure::{Backoff, RetryBudget, TaskManager, Timer};
use crate::messaging::MessageRouter;
use crate::types::constants::{
    DEFAULT_TIMEOUT, MAX_RECONNECT_ATTEMPTS, PLACEHOLDER_ENDPOINTS, RECONNECT_BASE_MS,
    RECONNECT_CAP_MS, env_vars,
};
use crate::types::{LiveError, Result};
use crate::websocket::{Connector, WebSocketFactory};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc, watch};
use url::Url;

#[derive(Debug, Clone)]
pub struct LiveClientOptions {
    /// `ws://` or `wss://` address; `None` runs the dashboard on static data
    pub endpoint: Option<String>,
    pub timeout: Option<u64>,
    pub reconnect_base_ms: Option<u64>,
    pub reconnect_cap_ms: Option<u64>,
    pub max_reconnect_attempts: Option<u32>,
    /// Endpoints containing any of these are treated as unset
    pub placeholder_endpoints: Vec<String>,
}

impl Default for LiveClientOptions {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout: None,
            reconnect_base_ms: None,
            reconnect_cap_ms: None,
            max_reconnect_attempts: None,
            placeholder_endpoints: PLACEHOLDER_ENDPOINTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl LiveClientOptions {
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            ..Default::default()
        }
    }

    /// Read options from the process environment (see [`env_vars`])
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read options through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            endpoint: lookup(env_vars::WS_URL).filter(|s| !s.trim().is_empty()),
            timeout: parse_var(&lookup, env_vars::CONNECT_TIMEOUT_MS)?,
            reconnect_base_ms: parse_var(&lookup, env_vars::RECONNECT_BASE_MS)?,
            reconnect_cap_ms: parse_var(&lookup, env_vars::RECONNECT_CAP_MS)?,
            max_reconnect_attempts: parse_var(&lookup, env_vars::RECONNECT_MAX_ATTEMPTS)?,
            ..Default::default()
        })
    }

    pub(crate) fn timer(&self) -> Timer {
        let backoff = Backoff::new(
            Duration::from_millis(self.reconnect_base_ms.unwrap_or(RECONNECT_BASE_MS)),
            Duration::from_millis(self.reconnect_cap_ms.unwrap_or(RECONNECT_CAP_MS)),
        );
        let budget = RetryBudget::new(self.max_reconnect_attempts.unwrap_or(MAX_RECONNECT_ATTEMPTS));
        Timer::new(backoff, budget)
    }

    pub(crate) fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
    }

    /// Normalized endpoint, or `None` when live data is disabled
    pub fn resolve_endpoint(&self) -> Result<Option<String>> {
        let Some(raw) = self.endpoint.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(None);
        };

        if self
            .placeholder_endpoints
            .iter()
            .any(|placeholder| raw.contains(placeholder.as_str()))
        {
            tracing::info!("Live endpoint {} is a placeholder, running on static data", raw);
            return Ok(None);
        }

        let url = Url::parse(raw)?;
        match url.scheme() {
            "ws" | "wss" => Ok(Some(url.to_string())),
            other => Err(LiveError::Config(format!(
                "live endpoint must use ws:// or wss://, got {}://",
                other
            ))),
        }
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| LiveError::Config(format!("{}={:?}: {}", key, raw, e))),
    }
}

/// Builder for LiveClient that handles initialization
pub struct LiveClientBuilder {
    endpoint: Option<String>,
    options: LiveClientOptions,
    invalidator: Arc<dyn Invalidate>,
    connector: Arc<dyn Connector>,
}

impl LiveClientBuilder {
    /// Create a new builder. Fails on a malformed endpoint; an absent or
    /// placeholder endpoint is valid and disables the client.
    pub fn new(options: LiveClientOptions, invalidator: Arc<dyn Invalidate>) -> Result<Self> {
        let endpoint = options.resolve_endpoint()?;
        Ok(Self {
            endpoint,
            options,
            invalidator,
            connector: Arc::new(WebSocketFactory),
        })
    }

    /// Replace the transport used to open channels
    pub fn connector(mut self, connector: impl Connector) -> Self {
        self.connector = Arc::new(connector);
        self
    }

    /// Build the client and spawn its driver task
    pub fn build(self) -> LiveClient {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::default());
        let (message_tx, message_rx) = watch::channel(None);

        let enabled = self.endpoint.is_some();
        let state = ClientState::new(
            self.endpoint,
            self.options.timer(),
            self.options.connect_timeout(),
            status_tx,
        );
        let router = MessageRouter::new(self.invalidator, message_tx);
        let driver = Driver::new(state, self.connector, router, command_rx);

        let mut tasks = TaskManager::new();
        tasks.spawn(driver.run());

        LiveClient {
            enabled,
            commands: command_tx,
            status: status_rx,
            messages: message_rx,
            tasks: Arc::new(Mutex::new(tasks)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_absent_endpoint_disables_client() {
        assert_eq!(LiveClientOptions::default().resolve_endpoint().unwrap(), None);
        assert_eq!(
            LiveClientOptions::with_endpoint("   ").resolve_endpoint().unwrap(),
            None
        );
    }

    #[test]
    fn test_placeholder_endpoint_disables_client() {
        let options = LiveClientOptions::with_endpoint("ws://localhost:8080/stream");
        assert_eq!(options.resolve_endpoint().unwrap(), None);
    }

    #[test]
    fn test_endpoint_is_normalized() {
        let options = LiveClientOptions::with_endpoint("wss://quotes.example.com");
        assert_eq!(
            options.resolve_endpoint().unwrap().as_deref(),
            Some("wss://quotes.example.com/")
        );
    }

    #[test]
    fn test_malformed_endpoint_is_rejected() {
        let options = LiveClientOptions::with_endpoint("not a url");
        assert!(matches!(
            options.resolve_endpoint(),
            Err(LiveError::UrlParse(_))
        ));

        let options = LiveClientOptions::with_endpoint("https://quotes.example.com");
        assert!(matches!(options.resolve_endpoint(), Err(LiveError::Config(_))));
    }

    #[test]
    fn test_options_from_lookup() {
        let options = LiveClientOptions::from_lookup(lookup(&[
            (env_vars::WS_URL, "wss://quotes.example.com/live"),
            (env_vars::CONNECT_TIMEOUT_MS, "2500"),
            (env_vars::RECONNECT_MAX_ATTEMPTS, "3"),
        ]))
        .unwrap();

        assert_eq!(
            options.endpoint.as_deref(),
            Some("wss://quotes.example.com/live")
        );
        assert_eq!(options.connect_timeout(), Duration::from_millis(2500));
        assert_eq!(options.timer().budget().max(), 3);
        assert_eq!(options.reconnect_base_ms, None);
    }

    #[test]
    fn test_invalid_number_is_a_config_error() {
        let result =
            LiveClientOptions::from_lookup(lookup(&[(env_vars::RECONNECT_CAP_MS, "soon")]));
        assert!(matches!(result, Err(LiveError::Config(_))));
    }

    #[test]
    fn test_default_timer_matches_reconnect_policy() {
        let mut timer = LiveClientOptions::default().timer();
        assert_eq!(timer.budget().max(), 5);
        assert_eq!(timer.next_delay(), Some(Duration::from_millis(1000)));
        assert_eq!(timer.next_delay(), Some(Duration::from_millis(2000)));
    }
}
