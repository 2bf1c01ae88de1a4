//! # Client Configuration
//!
//! Purpose: Hold the immutable settings a `BloomdClient` is built from.
//!
//! ## Design Principles
//! 1. **Plain Data**: Public fields with documented defaults, no hidden state.
//! 2. **Builder Friendly**: `ClientConfig::builder` for named-argument style.
//! 3. **Embeddable**: `serde(default)` lets an application config file carry
//!    only the fields it overrides.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use bloomd_common::DEFAULT_PORT;

use crate::error::{ClientError, ClientResult};

pub const DEFAULT_INITIAL_CONNECTIONS: usize = 5;
pub const DEFAULT_MAX_CONNECTIONS: usize = 10;
pub const DEFAULT_MAX_SEND_ATTEMPTS: usize = 3;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for the client and its pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Daemon address, e.g. "127.0.0.1:8673".
    pub addr: String,
    /// Send a hex digest of each key instead of the key itself.
    pub hash_keys: bool,
    /// Connections dialed when the client is built.
    pub initial_connections: usize,
    /// Upper bound on live connections (idle + in use).
    pub max_connections: usize,
    /// Write attempts per command before the error surfaces.
    pub max_send_attempts: usize,
    /// Per-call deadline. Sockets use twice this as their read/write timeout.
    pub timeout: Duration,
    /// TCP connect timeout; falls back to `timeout` when unset.
    pub connect_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            addr: format!("127.0.0.1:{}", DEFAULT_PORT),
            hash_keys: false,
            initial_connections: DEFAULT_INITIAL_CONNECTIONS,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            max_send_attempts: DEFAULT_MAX_SEND_ATTEMPTS,
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Starts a builder for the given daemon address.
    pub fn builder(addr: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: ClientConfig {
                addr: addr.into(),
                ..ClientConfig::default()
            },
        }
    }

    /// Rejects settings the pool cannot honor.
    pub fn validate(&self) -> ClientResult<()> {
        if self.max_connections == 0 {
            return Err(ClientError::InvalidConfig(
                "max_connections must be at least 1".to_string(),
            ));
        }
        if self.initial_connections > self.max_connections {
            return Err(ClientError::InvalidConfig(format!(
                "initial_connections ({}) exceeds max_connections ({})",
                self.initial_connections, self.max_connections
            )));
        }
        if self.timeout.is_zero() {
            return Err(ClientError::InvalidConfig("timeout must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Effective connect timeout.
    pub fn dial_timeout(&self) -> Duration {
        self.connect_timeout.unwrap_or(self.timeout)
    }

    /// Socket read/write timeout. Longer than the call deadline so the
    /// deadline always fires first, short enough that abandoned I/O ends.
    pub fn io_timeout(&self) -> Duration {
        self.timeout.saturating_mul(2)
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn hash_keys(mut self, hash_keys: bool) -> Self {
        self.config.hash_keys = hash_keys;
        self
    }

    pub fn initial_connections(mut self, count: usize) -> Self {
        self.config.initial_connections = count;
        self
    }

    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    pub fn max_send_attempts(mut self, attempts: usize) -> Self {
        self.config.max_send_attempts = attempts;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = Some(timeout);
        self
    }

    /// Validates and returns the finished configuration.
    pub fn build(self) -> ClientResult<ClientConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_protocol_client() {
        let config = ClientConfig::default();
        assert_eq!(config.addr, "127.0.0.1:8673");
        assert!(!config.hash_keys);
        assert_eq!(config.initial_connections, 5);
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.max_send_attempts, 3);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.dial_timeout(), Duration::from_secs(10));
        assert_eq!(config.io_timeout(), Duration::from_secs(20));
    }

    #[test]
    fn builder_overrides() {
        let config = ClientConfig::builder("10.0.0.1:9000")
            .hash_keys(true)
            .initial_connections(1)
            .max_connections(2)
            .max_send_attempts(5)
            .timeout(Duration::from_millis(250))
            .connect_timeout(Duration::from_millis(50))
            .build()
            .unwrap();
        assert_eq!(config.addr, "10.0.0.1:9000");
        assert!(config.hash_keys);
        assert_eq!(config.max_connections, 2);
        assert_eq!(config.max_send_attempts, 5);
        assert_eq!(config.dial_timeout(), Duration::from_millis(50));
    }

    #[test]
    fn rejects_inconsistent_pool_sizes() {
        let err = ClientConfig::builder("127.0.0.1:1")
            .initial_connections(4)
            .max_connections(2)
            .build()
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidConfig(_)));

        let err = ClientConfig::builder("127.0.0.1:1")
            .initial_connections(0)
            .max_connections(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_zero_timeout() {
        let err = ClientConfig::builder("127.0.0.1:1")
            .timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidConfig(_)));
    }

    #[test]
    fn deserializes_partial_document() {
        let config: ClientConfig = serde_json::from_str(
            r#"{"addr": "bloomd.internal:8673", "hash_keys": true, "max_connections": 20}"#,
        )
        .unwrap();
        assert_eq!(config.addr, "bloomd.internal:8673");
        assert!(config.hash_keys);
        assert_eq!(config.max_connections, 20);
        assert_eq!(config.initial_connections, DEFAULT_INITIAL_CONNECTIONS);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }
}
