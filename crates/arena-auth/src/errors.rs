//! Session error types.

/// Errors raised by the session lifecycle and the session HTTP API.
///
/// `Clone` so the realtime layer can hand the same failure to several
/// waiters; transport errors are therefore carried as strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// A token is empty, malformed, undecodable or has no usable `exp` claim,
    /// or no session is stored.
    #[error("invalid session: {0}")]
    InvalidSession(String),

    /// A token was already expired when the session was offered.
    #[error("session expired")]
    ExpiredSession,

    /// The refresh token is expired; a new login is required.
    #[error("refresh token expired")]
    RefreshExpired,

    /// The server answered with a non-success status.
    #[error("session API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },

    /// The HTTP request itself failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A request or response body could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(String),
}

impl From<reqwest::Error> for SessionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Json(err.to_string())
        } else {
            Self::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, SessionError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display() {
        let err = SessionError::Api {
            status: 401,
            message: "bad key".to_string(),
        };
        assert_eq!(err.to_string(), "session API error (401): bad key");
    }

    #[test]
    fn json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(SessionError::from(json_err), SessionError::Json(_)));
    }

    #[test]
    fn invalid_session_display() {
        let err = SessionError::InvalidSession("token has 2 parts".into());
        assert!(err.to_string().contains("2 parts"));
    }
}
