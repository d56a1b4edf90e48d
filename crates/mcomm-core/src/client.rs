//! HTTP client settings.
//!
//! This module provides the HTTP client configuration used for every request to the
//! MCommunity gateway, and builds the underlying `reqwest` client from it.

use std::path::Path;
use std::time::Duration;

use reqwest::{Client, ClientBuilder};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Default timeout for gateway requests (seconds)
pub const GATEWAY_DEFAULT_TIMEOUT: u64 = 30;

/// Default connect timeout (seconds)
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 10;

// Connection pool settings

/// Default idle timeout for connection pools
pub const DEFAULT_POOL_IDLE_TIMEOUT: u64 = 90;

/// Default maximum idle connections per host
pub const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 10;

/// HTTP client configuration.
///
/// Configures timeouts and connection pooling. There is deliberately no retry policy:
/// every gateway call is attempted exactly once.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout
    pub timeout: Duration,

    /// Connect timeout
    pub connect_timeout: Duration,

    /// Connection pool idle timeout
    pub pool_idle_timeout: Duration,

    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,
}

impl ClientConfig {
    /// Create a new client configuration with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout: Duration::from_secs(GATEWAY_DEFAULT_TIMEOUT),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT),
            pool_idle_timeout: Duration::from_secs(DEFAULT_POOL_IDLE_TIMEOUT),
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
        }
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set connection pool idle timeout.
    #[must_use]
    pub const fn with_pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }

    /// Set maximum idle connections per host.
    #[must_use]
    pub const fn with_pool_max_idle(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Build a `reqwest` client from these settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the CA certificate cannot be read or parsed, or if
    /// the client cannot be constructed.
    pub fn build_http_client(
        &self,
        user_agent: &str,
        tls_verify: bool,
        tls_ca_cert: Option<&Path>,
    ) -> Result<Client> {
        let mut builder = ClientBuilder::new()
            .user_agent(user_agent)
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .pool_idle_timeout(self.pool_idle_timeout)
            .pool_max_idle_per_host(self.pool_max_idle_per_host);

        if !tls_verify {
            warn!("TLS verification disabled for gateway client");
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(ca_cert) = tls_ca_cert {
            debug!("loading gateway CA certificate from {}", ca_cert.display());
            let bytes = std::fs::read(ca_cert).map_err(|err| {
                Error::ConfigError(format!(
                    "Failed to read gateway CA certificate {}: {err}",
                    ca_cert.display()
                ))
            })?;
            let cert = reqwest::Certificate::from_pem(&bytes).map_err(|err| {
                Error::ConfigError(format!("Invalid gateway CA certificate: {err}"))
            })?;
            builder = builder.add_root_certificate(cert);
        }

        builder
            .build()
            .map_err(|err| Error::ConfigError(format!("Failed to build HTTP client: {err}")))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}
