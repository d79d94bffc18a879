//! Configuration consumed by [`PercyClient`](super::PercyClient).

use std::time::Duration;

use crate::bridge::BridgeConfig;

/// Environment variable overriding the CLI API address.
pub const ADDRESS_VAR: &str = "PERCY_SERVER_ADDRESS";
/// Address of a locally running Percy CLI.
pub const DEFAULT_ADDRESS: &str = "http://localhost:5338";
/// Default timeout for a whole HTTP request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Default base delay between idle polls after a dropped connection.
pub const DEFAULT_RETRY_BASE: Duration = Duration::from_millis(100);
/// Default maximum delay between idle polls.
pub const DEFAULT_RETRY_CAP: Duration = Duration::from_secs(5);
/// Default time after which idle polling gives up.
pub const DEFAULT_RETRY_DEADLINE: Duration = Duration::from_secs(60);

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub address: String,
    pub request_timeout: Duration,
    pub idle_retry: BackoffPolicy,
    pub bridge: BridgeConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            idle_retry: BackoffPolicy::default(),
            bridge: BridgeConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Defaults with the address taken from `PERCY_SERVER_ADDRESS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(address) = lookup(ADDRESS_VAR).filter(|a| !a.trim().is_empty()) {
            config.address = address;
        }
        config
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_idle_retry(mut self, policy: BackoffPolicy) -> Self {
        self.idle_retry = policy;
        self
    }

    pub fn with_bridge(mut self, bridge: BridgeConfig) -> Self {
        self.bridge = bridge;
        self
    }
}

/// Exponential backoff policy for retried requests.
#[derive(Clone, Debug)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub cap: Duration,
    pub deadline: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: DEFAULT_RETRY_BASE,
            cap: DEFAULT_RETRY_CAP,
            deadline: DEFAULT_RETRY_DEADLINE,
        }
    }
}
