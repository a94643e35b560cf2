//! Server-driven stream payloads.

use serde::{Deserialize, Serialize};

use super::common::UserPresence;

/// Identifies a stream.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct Stream {
    /// Stream mode.
    #[prost(int32, tag = "1")]
    pub mode: i32,
    /// Subject, usually a user id.
    #[prost(string, tag = "2")]
    pub subject: String,
    /// Subcontext.
    #[prost(string, tag = "3")]
    pub subcontext: String,
    /// Label.
    #[prost(string, tag = "4")]
    pub label: String,
}

/// Data pushed on a stream.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamData {
    /// Source stream.
    #[prost(message, optional, tag = "1")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<Stream>,
    /// Sender, absent for server-originated data.
    #[prost(message, optional, tag = "2")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<UserPresence>,
    /// Data string.
    #[prost(string, tag = "3")]
    pub data: String,
    /// Whether the data was sent reliably.
    #[prost(bool, tag = "4")]
    pub reliable: bool,
}

/// Presences joining and leaving a stream.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamPresenceEvent {
    /// Source stream.
    #[prost(message, optional, tag = "1")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<Stream>,
    /// Presences that joined.
    #[prost(message, repeated, tag = "2")]
    pub joins: Vec<UserPresence>,
    /// Presences that left.
    #[prost(message, repeated, tag = "3")]
    pub leaves: Vec<UserPresence>,
}
