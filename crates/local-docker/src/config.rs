use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECONDS: u64 = 120;

/// How to reach the Docker daemon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Unix socket of the daemon. `None` falls back to bollard's local defaults.
    pub socket_path: Option<String>,
    pub timeout_seconds: u64,
    /// Pinned API version such as `"1.43"`. `None` negotiates the default.
    pub api_version: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            socket_path: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            api_version: None,
        }
    }
}

impl EngineConfig {
    /// Create configuration for a specific unix socket
    pub fn unix(socket_path: &str) -> Self {
        Self {
            socket_path: Some(socket_path.to_owned()),
            ..Default::default()
        }
    }

    /// Build configuration from `DOCKER_HOST` and `DOCKER_CLIENT_TIMEOUT`
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var("DOCKER_HOST").ok().as_deref(),
            std::env::var("DOCKER_CLIENT_TIMEOUT").ok().as_deref(),
        )
    }

    fn from_vars(docker_host: Option<&str>, timeout: Option<&str>) -> Self {
        let socket_path = docker_host
            .and_then(|host| host.strip_prefix("unix://"))
            .map(str::to_owned);

        let timeout_seconds = timeout
            .and_then(|t| t.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECONDS);

        Self {
            socket_path,
            timeout_seconds,
            api_version: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_seconds = timeout.as_secs();
        self
    }

    pub fn with_api_version(mut self, version: &str) -> Self {
        self.api_version = Some(version.to_owned());
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}
