//! Authenticated gateway session.

use mcomm_core::client::ClientConfig;
use mcomm_core::config::{DirectoryLayout, GatewayConfig};
use mcomm_core::Error;
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};
use url::Url;

use crate::group::GroupHandle;
use crate::models::{TokenRequest, TokenResponse};
use crate::Result;

const USER_AGENT: &str = concat!("mcomm-groups/", env!("CARGO_PKG_VERSION"));

/// Bearer-authenticated connection to the gateway.
///
/// The token is obtained once in [`Session::authenticate`] and attached to every later
/// request. It is never refreshed; once it expires, calls fail with whatever status the
/// gateway returns.
#[derive(Debug)]
pub struct Session {
    http: Client,
    base_url: Url,
    token: SecretString,
    app_id: String,
    full_name: String,
    layout: DirectoryLayout,
}

impl Session {
    /// Exchanges the configured credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AuthError`] if the token endpoint answers with a non-success status or
    /// without an `access` token, and a transport error if the endpoint cannot be reached.
    pub async fn authenticate(config: &GatewayConfig) -> Result<Self> {
        let http_config = ClientConfig::new().with_timeout(config.timeout());
        Self::authenticate_with(config, &http_config).await
    }

    /// Same as [`Session::authenticate`] with explicit HTTP client settings.
    ///
    /// # Errors
    ///
    /// See [`Session::authenticate`]; configuration problems surface as
    /// [`Error::ConfigError`].
    pub async fn authenticate_with(
        config: &GatewayConfig,
        http_config: &ClientConfig,
    ) -> Result<Self> {
        let base_url = config.parse_url()?;
        let http = http_config.build_http_client(
            USER_AGENT,
            config.tls_verify,
            config.tls_ca_cert.as_deref(),
        )?;

        let token = request_token(
            &http,
            &base_url,
            &config.username,
            config.password.expose_secret(),
        )
        .await?;

        Ok(Self {
            http,
            base_url,
            token,
            app_id: config.app_id.clone(),
            full_name: config.full_name.clone(),
            layout: config.layout.clone(),
        })
    }

    /// Opens a handle on the named group, reading its current attributes.
    ///
    /// # Errors
    ///
    /// See [`GroupHandle::open`].
    pub async fn group(&self, name: impl Into<String>) -> Result<GroupHandle<'_>> {
        GroupHandle::open(self, name).await
    }

    /// Gateway base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Application group written as the owner of reserved groups.
    #[must_use]
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Display name given to reserved groups.
    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Directory suffixes used to build entry references.
    #[must_use]
    pub fn layout(&self) -> &DirectoryLayout {
        &self.layout
    }

    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                Error::InvalidEndpoint(format!("gateway URL `{}` cannot be a base", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments)
            .push("");
        Ok(url)
    }

    pub(crate) fn get(&self, url: Url) -> RequestBuilder {
        self.http
            .get(url)
            .bearer_auth(self.token.expose_secret())
            .header("Accept", "application/json")
    }

    pub(crate) fn post(&self, url: Url) -> RequestBuilder {
        self.http
            .post(url)
            .bearer_auth(self.token.expose_secret())
    }
}

async fn request_token(
    http: &Client,
    base_url: &Url,
    username: &str,
    password: &str,
) -> Result<SecretString> {
    let url = base_url
        .join("token/")
        .map_err(|err| Error::InvalidEndpoint(format!("Invalid token path: {err}")))?;

    info!(%url, username, "Requesting gateway access token");

    let response = http
        .post(url)
        .form(&TokenRequest { username, password })
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(Error::AuthError(format!(
            "token endpoint returned {status}: {message}"
        )));
    }

    let body = response
        .json::<TokenResponse>()
        .await
        .map_err(|err| Error::AuthError(format!("invalid token response: {err}")))?;

    let access = body
        .access
        .ok_or_else(|| Error::AuthError("token response has no access token".to_string()))?;

    debug!("gateway access token obtained");
    Ok(SecretString::from(access))
}
