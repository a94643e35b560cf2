//! Realtime match payloads.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::common::UserPresence;
use crate::serde_helpers::base64_bytes;

/// A realtime match.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct Match {
    /// Match id.
    #[prost(string, tag = "1")]
    pub match_id: String,
    /// Whether the match is run by server-side logic.
    #[prost(bool, tag = "2")]
    pub authoritative: bool,
    /// Match label, authoritative matches only.
    #[prost(string, optional, tag = "3")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Current number of participants.
    #[prost(int32, tag = "4")]
    pub size: i32,
    /// Other participants.
    #[prost(message, repeated, tag = "5")]
    pub presences: Vec<UserPresence>,
    /// This client's own presence.
    #[prost(message, optional, tag = "6")]
    #[serde(rename = "self", skip_serializing_if = "Option::is_none")]
    pub self_presence: Option<UserPresence>,
}

/// Create a relayed match. Replied to with [`Match`].
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchCreate {
    /// Optional name; matches created with the same name share an id.
    #[prost(string, tag = "1")]
    pub name: String,
}

/// Join a match by id or by matchmaker token. Replied to with [`Match`].
///
/// Exactly one of `match_id` and `token` is set.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchJoin {
    /// Match id.
    #[prost(string, tag = "1")]
    pub match_id: String,
    /// Matchmaker token.
    #[prost(string, tag = "2")]
    pub token: String,
    /// Metadata handed to the match's join hook.
    #[prost(map = "string, string", tag = "3")]
    pub metadata: HashMap<String, String>,
}

/// Leave a match. Replied to with an empty envelope.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchLeave {
    /// Match id.
    #[prost(string, tag = "1")]
    pub match_id: String,
}

/// Match state pushed from another participant or the match handler.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchData {
    /// Match id.
    #[prost(string, tag = "1")]
    pub match_id: String,
    /// Sender, absent for data sent by the match handler.
    #[prost(message, optional, tag = "2")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence: Option<UserPresence>,
    /// Application-defined op code.
    #[prost(int64, tag = "3")]
    pub op_code: i64,
    /// Opaque data.
    #[prost(bytes = "vec", tag = "4")]
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    /// Whether the data was sent reliably.
    #[prost(bool, tag = "5")]
    pub reliable: bool,
}

/// Send match state. Fire-and-forget: the server sends no reply.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchDataSend {
    /// Match id.
    #[prost(string, tag = "1")]
    pub match_id: String,
    /// Application-defined op code.
    #[prost(int64, tag = "2")]
    pub op_code: i64,
    /// Opaque data.
    #[prost(bytes = "vec", tag = "3")]
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    /// Recipients; empty means everyone in the match.
    #[prost(message, repeated, tag = "4")]
    pub presences: Vec<UserPresence>,
    /// Send reliably.
    #[prost(bool, tag = "5")]
    pub reliable: bool,
}

/// Participants joining and leaving a match.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchPresenceEvent {
    /// Match id.
    #[prost(string, tag = "1")]
    pub match_id: String,
    /// Presences that joined.
    #[prost(message, repeated, tag = "2")]
    pub joins: Vec<UserPresence>,
    /// Presences that left.
    #[prost(message, repeated, tag = "3")]
    pub leaves: Vec<UserPresence>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_data_bytes_are_base64_in_json() {
        let data = MatchData {
            match_id: "m1".into(),
            op_code: 7,
            data: b"hi".to_vec(),
            ..Default::default()
        };
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value["data"], "aGk=");
        let back: MatchData = serde_json::from_value(value).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn missing_fields_default() {
        let join: MatchJoin = serde_json::from_str(r#"{"token": "t"}"#).unwrap();
        assert_eq!(join.token, "t");
        assert!(join.match_id.is_empty());
        assert!(join.metadata.is_empty());
    }
}
