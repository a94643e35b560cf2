//! Status presence payloads.

use serde::{Deserialize, Serialize};

use super::common::UserPresence;

/// Current status of followed users.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct Status {
    /// Online presences of the followed users.
    #[prost(message, repeated, tag = "1")]
    pub presences: Vec<UserPresence>,
}

/// Follow status updates for users. Replied to with [`Status`].
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusFollow {
    /// User ids to follow.
    #[prost(string, repeated, tag = "1")]
    pub user_ids: Vec<String>,
    /// Usernames to follow.
    #[prost(string, repeated, tag = "2")]
    pub usernames: Vec<String>,
}

/// Stop following status updates. Replied to with an empty envelope.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusUnfollow {
    /// User ids to unfollow.
    #[prost(string, repeated, tag = "1")]
    pub user_ids: Vec<String>,
}

/// Set this client's status. `None` appears offline.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusUpdate {
    /// Status message.
    #[prost(string, optional, tag = "1")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Followed users coming online, going offline or changing status.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusPresenceEvent {
    /// Presences that joined or updated.
    #[prost(message, repeated, tag = "2")]
    pub joins: Vec<UserPresence>,
    /// Presences that left.
    #[prost(message, repeated, tag = "3")]
    pub leaves: Vec<UserPresence>,
}
