//! Party payloads.

use serde::{Deserialize, Serialize};

use super::common::UserPresence;
use crate::serde_helpers::base64_bytes;

/// A party of users.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct Party {
    /// Party id.
    #[prost(string, tag = "1")]
    pub party_id: String,
    /// Whether anyone may join without approval.
    #[prost(bool, tag = "2")]
    pub open: bool,
    /// Maximum number of members.
    #[prost(int32, tag = "3")]
    pub max_size: i32,
    /// This client's own presence.
    #[prost(message, optional, tag = "4")]
    #[serde(rename = "self", skip_serializing_if = "Option::is_none")]
    pub self_presence: Option<UserPresence>,
    /// Current leader.
    #[prost(message, optional, tag = "5")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leader: Option<UserPresence>,
    /// All members.
    #[prost(message, repeated, tag = "6")]
    pub presences: Vec<UserPresence>,
}

/// Create a party. Replied to with [`Party`].
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct PartyCreate {
    /// Whether anyone may join without approval.
    #[prost(bool, tag = "1")]
    pub open: bool,
    /// Maximum number of members.
    #[prost(int32, tag = "2")]
    pub max_size: i32,
}

/// Join or request to join a party.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct PartyJoin {
    /// Party id.
    #[prost(string, tag = "1")]
    pub party_id: String,
}

/// Leave a party.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct PartyLeave {
    /// Party id.
    #[prost(string, tag = "1")]
    pub party_id: String,
}

/// Promote a member to leader. Leader only.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct PartyPromote {
    /// Party id.
    #[prost(string, tag = "1")]
    pub party_id: String,
    /// Member to promote.
    #[prost(message, optional, tag = "2")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence: Option<UserPresence>,
}

/// Announces the party's new leader.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct PartyLeader {
    /// Party id.
    #[prost(string, tag = "1")]
    pub party_id: String,
    /// New leader.
    #[prost(message, optional, tag = "2")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence: Option<UserPresence>,
}

/// Accept a join request. Leader only.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct PartyAccept {
    /// Party id.
    #[prost(string, tag = "1")]
    pub party_id: String,
    /// Requesting user.
    #[prost(message, optional, tag = "2")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence: Option<UserPresence>,
}

/// Kick a member or reject a join request. Leader only.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct PartyRemove {
    /// Party id.
    #[prost(string, tag = "1")]
    pub party_id: String,
    /// Member or requester to remove.
    #[prost(message, optional, tag = "2")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence: Option<UserPresence>,
}

/// Close a party, kicking every member. Leader only.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct PartyClose {
    /// Party id.
    #[prost(string, tag = "1")]
    pub party_id: String,
}

/// Data pushed from a party member.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct PartyData {
    /// Party id.
    #[prost(string, tag = "1")]
    pub party_id: String,
    /// Sender.
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
}

/// Send data to the party. Fire-and-forget: the server sends no reply.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct PartyDataSend {
    /// Party id.
    #[prost(string, tag = "1")]
    pub party_id: String,
    /// Application-defined op code.
    #[prost(int64, tag = "2")]
    pub op_code: i64,
    /// Opaque data.
    #[prost(bytes = "vec", tag = "3")]
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

/// Members joining and leaving a party.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct PartyPresenceEvent {
    /// Party id.
    #[prost(string, tag = "1")]
    pub party_id: String,
    /// Presences that joined.
    #[prost(message, repeated, tag = "2")]
    pub joins: Vec<UserPresence>,
    /// Presences that left.
    #[prost(message, repeated, tag = "3")]
    pub leaves: Vec<UserPresence>,
}
