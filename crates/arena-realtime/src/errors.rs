//! Realtime error type.

use std::collections::HashMap;

use arena_auth::SessionError;
use arena_protocol::CodecError;
use arena_protocol::payloads::ServerError;

/// Errors surfaced by the realtime connection.
///
/// `Clone` because teardown hands the same failure to every waiter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RealtimeError {
    /// Obtaining or refreshing the session failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The socket could not be opened.
    #[error("dial failed: {0}")]
    Dial(String),

    /// Writing a frame failed; the connection is torn down.
    #[error("write failed: {0}")]
    Write(String),

    /// Reading failed or the peer closed; the connection is torn down.
    #[error("read failed: {0}")]
    Read(String),

    /// The server answered with an error envelope.
    #[error("server error {code}: {message}")]
    Protocol {
        /// Numeric error code.
        code: i32,
        /// Error message.
        message: String,
        /// Additional context.
        context: HashMap<String, String>,
    },

    /// A reply arrived for a correlation id with no pending call.
    #[error("no pending call for correlation id {0}")]
    UnknownCorrelationId(String),

    /// The caller cancelled the call.
    #[error("call cancelled")]
    Cancelled,

    /// No reply within the request timeout.
    #[error("no reply within {0}ms")]
    Timeout(u64),

    /// The connection closed while the call was pending.
    #[error("connection closed")]
    ConnectionClosed,

    /// No live connection.
    #[error("not connected")]
    NotConnected,

    /// An envelope could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(String),

    /// The reply carried a different kind than the request expects.
    #[error("unexpected reply: expected {expected}, got {actual}")]
    UnexpectedReply {
        /// What the request expects.
        expected: String,
        /// What arrived.
        actual: String,
    },

    /// The envelope is not something the client can send as a request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The socket address could not be built.
    #[error("invalid socket URL: {0}")]
    InvalidUrl(String),
}

impl From<CodecError> for RealtimeError {
    fn from(err: CodecError) -> Self {
        Self::Codec(err.to_string())
    }
}

impl From<ServerError> for RealtimeError {
    fn from(err: ServerError) -> Self {
        Self::Protocol {
            code: err.code,
            message: err.message,
            context: err.context,
        }
    }
}

impl RealtimeError {
    /// Whether a persist-mode supervisor should redial after this failure.
    ///
    /// Only transport failures qualify: the dial itself, or the HTTP request
    /// behind a session refresh. Anything else needs caller action.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Dial(_) | Self::Session(SessionError::Http(_)))
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, RealtimeError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
