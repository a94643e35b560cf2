//! Payloads shared across domains: presences, errors, notifications, RPC,
//! ping/pong.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A user session participating in a channel, match, party or stream.
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPresence {
    /// User id.
    #[prost(string, tag = "1")]
    pub user_id: String,
    /// Session id of the connection this presence belongs to.
    #[prost(string, tag = "2")]
    pub session_id: String,
    /// Username at the time the presence was created.
    #[prost(string, tag = "3")]
    pub username: String,
    /// Whether messages from this presence are persisted.
    #[prost(bool, tag = "4")]
    pub persistence: bool,
    /// Status message, only set for status presences.
    #[prost(string, optional, tag = "5")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Application error codes reported by the server.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ErrorCode {
    /// An unexpected result from the server.
    RuntimeException = 0,
    /// The server received a message it could not recognize.
    UnrecognizedPayload = 1,
    /// A message was expected but contained no content.
    MissingPayload = 2,
    /// Fields in the message have an invalid format.
    BadInput = 3,
    /// The match id was not found.
    MatchNotFound = 4,
    /// The match join was rejected.
    MatchJoinRejected = 5,
    /// The runtime function does not exist on the server.
    RuntimeFunctionNotFound = 6,
    /// The runtime function executed with an error.
    RuntimeFunctionException = 7,
}

/// An application error, either as the reply to a request or pushed.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerError {
    /// Numeric [`ErrorCode`].
    #[prost(enumeration = "ErrorCode", tag = "1")]
    pub code: i32,
    /// Human-readable message.
    #[prost(string, tag = "2")]
    pub message: String,
    /// Additional key/value context.
    #[prost(map = "string, string", tag = "3")]
    pub context: HashMap<String, String>,
}

/// A single in-app notification.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct Notification {
    /// Notification id.
    #[prost(string, tag = "1")]
    pub id: String,
    /// Short subject line.
    #[prost(string, tag = "2")]
    pub subject: String,
    /// JSON content.
    #[prost(string, tag = "3")]
    pub content: String,
    /// Category code; negative values are reserved by the server.
    #[prost(int32, tag = "4")]
    pub code: i32,
    /// Sender user id, empty for system notifications.
    #[prost(string, tag = "5")]
    pub sender_id: String,
    /// Creation time in unix seconds.
    #[prost(int64, tag = "6")]
    pub create_time: i64,
    /// Whether the notification is stored for later listing.
    #[prost(bool, tag = "7")]
    pub persistent: bool,
}

/// A batch of notifications pushed to the client.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct Notifications {
    /// The notifications, oldest first.
    #[prost(message, repeated, tag = "1")]
    pub notifications: Vec<Notification>,
}

/// Execute a server-side function by id, or its reply.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct Rpc {
    /// Function identifier.
    #[prost(string, tag = "1")]
    pub id: String,
    /// Opaque payload (usually JSON).
    #[prost(string, tag = "2")]
    pub payload: String,
    /// HTTP key, only for server-to-server calls.
    #[prost(string, tag = "3")]
    pub http_key: String,
}

/// Application-level ping.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
pub struct Ping {}

/// Reply to [`Ping`].
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
pub struct Pong {}
