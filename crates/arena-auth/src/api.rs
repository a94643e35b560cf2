//! HTTP endpoints behind the session lifecycle.
//!
//! [`SessionApi`] is the seam the [`SessionManager`](crate::SessionManager)
//! talks through; [`HttpSessionApi`] is the reqwest implementation.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::errors::{Result, SessionError};
use crate::session::TokenPair;

/// Identity used to authenticate a new session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credential {
    /// A device identifier.
    Device(String),
    /// A custom identifier from an external identity system.
    Custom(String),
}

impl Credential {
    fn path(&self) -> &'static str {
        match self {
            Self::Device(_) => "device",
            Self::Custom(_) => "custom",
        }
    }

    fn id(&self) -> &str {
        match self {
            Self::Device(id) | Self::Custom(id) => id,
        }
    }
}

/// Server calls the session lifecycle depends on.
#[async_trait]
pub trait SessionApi: Send + Sync {
    /// Exchange a refresh token for a new token pair.
    async fn refresh(
        &self,
        refresh_token: &str,
        vars: &HashMap<String, String>,
    ) -> Result<TokenPair>;

    /// Invalidate both tokens server-side.
    async fn logout(&self, access_token: &str, refresh_token: &str) -> Result<()>;

    /// Authenticate, optionally creating the account.
    async fn authenticate(
        &self,
        credential: &Credential,
        create: bool,
        username: Option<&str>,
    ) -> Result<TokenPair>;
}

/// [`SessionApi`] over HTTP.
#[derive(Clone, Debug)]
pub struct HttpSessionApi {
    client: reqwest::Client,
    base_url: String,
    server_key: String,
}

impl HttpSessionApi {
    /// Create a client with default HTTP settings.
    pub fn new(base_url: impl Into<String>, server_key: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, server_key)
    }

    /// Create a client with a per-request timeout.
    pub fn with_timeout(
        base_url: impl Into<String>,
        server_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url, server_key))
    }

    /// Create a client around an existing `reqwest::Client`.
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        server_key: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            server_key: server_key.into(),
        }
    }

    /// Base HTTP address.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Map a non-success response to [`SessionError::Api`].
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_default();
    Err(SessionError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl SessionApi for HttpSessionApi {
    #[tracing::instrument(skip_all)]
    async fn refresh(
        &self,
        refresh_token: &str,
        vars: &HashMap<String, String>,
    ) -> Result<TokenPair> {
        let resp = self
            .client
            .post(self.url("/v2/account/session/refresh"))
            .basic_auth(&self.server_key, Some(""))
            .json(&json!({ "token": refresh_token, "vars": vars }))
            .send()
            .await?;
        Ok(check_status(resp).await?.json().await?)
    }

    #[tracing::instrument(skip_all)]
    async fn logout(&self, access_token: &str, refresh_token: &str) -> Result<()> {
        let resp = self
            .client
            .post(self.url("/v2/session/logout"))
            .bearer_auth(access_token)
            .json(&json!({ "token": access_token, "refresh_token": refresh_token }))
            .send()
            .await?;
        let _ = check_status(resp).await?;
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(kind = credential.path()))]
    async fn authenticate(
        &self,
        credential: &Credential,
        create: bool,
        username: Option<&str>,
    ) -> Result<TokenPair> {
        let mut query = vec![("create", create.to_string())];
        if let Some(username) = username {
            query.push(("username", username.to_string()));
        }
        let resp = self
            .client
            .post(self.url(&format!("/v2/account/authenticate/{}", credential.path())))
            .basic_auth(&self.server_key, Some(""))
            .query(&query)
            .json(&json!({ "id": credential.id() }))
            .send()
            .await?;
        Ok(check_status(resp).await?.json().await?)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
