//! Configuration structures for gateway sessions.
//!
//! This module provides the configuration used to authenticate against the MCommunity
//! gateway, including the directory layout used to build entry references.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;
use validator::Validate;

use crate::client::GATEWAY_DEFAULT_TIMEOUT;
use crate::Error;

/// Default suffix for user references.
pub const DEFAULT_PEOPLE_BASE: &str = "ou=People,dc=umich,dc=edu";

/// Default suffix for group references.
pub const DEFAULT_GROUP_BASE: &str = "ou=User Groups,ou=Groups,dc=umich,dc=edu";

/// Configuration for a gateway session.
///
/// Carries the login used for the token exchange plus the identity written into groups
/// reserved through the session.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GatewayConfig {
    /// Gateway base URL
    #[validate(url)]
    pub url: String,

    /// Login used for the token exchange
    #[validate(length(min = 1))]
    pub username: String,

    /// Password used for the token exchange
    #[serde(skip_serializing)]
    pub password: SecretString,

    /// Application group that owns reserved groups
    #[validate(length(min = 1))]
    pub app_id: String,

    /// Display name given to reserved groups
    pub full_name: String,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Whether to verify TLS certificates
    #[serde(default = "default_tls_verify")]
    pub tls_verify: bool,

    /// Optional path to custom CA certificate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls_ca_cert: Option<PathBuf>,

    /// Directory suffixes for entry references
    #[validate(nested)]
    #[serde(default)]
    pub layout: DirectoryLayout,
}

const fn default_tls_verify() -> bool {
    true
}

const fn default_request_timeout_secs() -> u64 {
    GATEWAY_DEFAULT_TIMEOUT
}

impl GatewayConfig {
    /// Create a new gateway configuration with required parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or validation fails.
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        app_id: impl Into<String>,
        full_name: impl Into<String>,
    ) -> Result<Self, Error> {
        let config = Self {
            url: url.into(),
            username: username.into(),
            password: SecretString::from(password.into()),
            app_id: app_id.into(),
            full_name: full_name.into(),
            request_timeout_secs: default_request_timeout_secs(),
            tls_verify: default_tls_verify(),
            tls_ca_cert: None,
            layout: DirectoryLayout::default(),
        };

        config
            .validate()
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {e}")))?;

        Ok(config)
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Set custom CA certificate path.
    #[must_use]
    pub fn with_ca_cert(mut self, path: PathBuf) -> Self {
        self.tls_ca_cert = Some(path);
        self
    }

    /// Override the directory layout.
    #[must_use]
    pub fn with_layout(mut self, layout: DirectoryLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Parse the gateway URL.
    ///
    /// The returned URL always ends with `/` so relative endpoint paths resolve beneath it.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn parse_url(&self) -> Result<Url, Error> {
        let mut url = Url::parse(&self.url)
            .map_err(|e| Error::ConfigError(format!("Invalid gateway URL: {e}")))?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }
}

/// Organizational suffixes appended to bare identifiers on write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct DirectoryLayout {
    /// Suffix for user references (`uid=<id>,<people_base>`)
    #[validate(length(min = 1))]
    #[serde(default = "default_people_base")]
    pub people_base: String,

    /// Suffix for group references (`cn=<id>,<group_base>`)
    #[validate(length(min = 1))]
    #[serde(default = "default_group_base")]
    pub group_base: String,
}

fn default_people_base() -> String {
    DEFAULT_PEOPLE_BASE.to_string()
}

fn default_group_base() -> String {
    DEFAULT_GROUP_BASE.to_string()
}

impl DirectoryLayout {
    /// Create a layout with explicit suffixes.
    #[must_use]
    pub fn new(people_base: impl Into<String>, group_base: impl Into<String>) -> Self {
        Self {
            people_base: people_base.into(),
            group_base: group_base.into(),
        }
    }
}

impl Default for DirectoryLayout {
    fn default() -> Self {
        Self::new(DEFAULT_PEOPLE_BASE, DEFAULT_GROUP_BASE)
    }
}
