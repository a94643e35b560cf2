//! Where the connection gets its token and server address.

use arena_auth::{SessionError, SessionManager};
use async_trait::async_trait;

/// Session collaborator consumed by the connection.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Access token to dial with.
    async fn current_token(&self) -> Result<String, SessionError>;

    /// Refresh the session if it is about to expire.
    async fn refresh_session(&self) -> Result<(), SessionError>;

    /// Base HTTP(S) address of the backend.
    fn base_socket_url(&self) -> String;

    /// Forget the session locally. Called on a definitive close.
    fn clear_session(&self) {}
}

#[async_trait]
impl TokenSource for SessionManager {
    async fn current_token(&self) -> Result<String, SessionError> {
        SessionManager::current_token(self).await
    }

    async fn refresh_session(&self) -> Result<(), SessionError> {
        self.refresh().await
    }

    fn base_socket_url(&self) -> String {
        self.base_url().to_string()
    }

    fn clear_session(&self) {
        self.clear();
    }
}

/// A fixed token and address, for tests and server-issued tokens.
#[derive(Clone, Debug)]
pub struct StaticTokenSource {
    token: String,
    base_url: String,
}

impl StaticTokenSource {
    /// Create a source that always returns `token`.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn current_token(&self) -> Result<String, SessionError> {
        Ok(self.token.clone())
    }

    async fn refresh_session(&self) -> Result<(), SessionError> {
        Ok(())
    }

    fn base_socket_url(&self) -> String {
        self.base_url.clone()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
