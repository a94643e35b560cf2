//! Codec error type.

/// Errors raised while encoding or decoding an envelope.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// Malformed protobuf frame.
    #[error("binary decode failed: {0}")]
    Binary(String),

    /// Malformed JSON frame, or a known kind with a malformed payload.
    #[error("text codec failed: {0}")]
    Text(String),

    /// A wire name that names no message kind.
    #[error("unknown payload kind: {0}")]
    UnknownPayload(String),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, CodecError>;
