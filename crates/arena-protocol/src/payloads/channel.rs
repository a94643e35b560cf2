//! Chat channel payloads.

use serde::{Deserialize, Serialize};

use super::common::UserPresence;

/// Kind of chat channel being joined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ChannelType {
    /// Default, rejected by the server.
    Unspecified = 0,
    /// A named room.
    Room = 1,
    /// A direct conversation with another user.
    DirectMessage = 2,
    /// A group's channel.
    Group = 3,
}

/// Join a chat channel. Replied to with [`Channel`].
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelJoin {
    /// Room name, user id or group id depending on `channel_type`.
    #[prost(string, tag = "1")]
    pub target: String,
    /// Numeric [`ChannelType`].
    #[prost(enumeration = "ChannelType", tag = "2")]
    #[serde(rename = "type")]
    pub channel_type: i32,
    /// Whether messages should be persisted.
    #[prost(bool, optional, tag = "3")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistence: Option<bool>,
    /// Whether the join should be hidden from other members.
    #[prost(bool, optional, tag = "4")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
}

/// A joined chat channel.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct Channel {
    /// Channel id.
    #[prost(string, tag = "1")]
    pub id: String,
    /// Members currently in the channel.
    #[prost(message, repeated, tag = "2")]
    pub presences: Vec<UserPresence>,
    /// This client's own presence.
    #[prost(message, optional, tag = "3")]
    #[serde(rename = "self", skip_serializing_if = "Option::is_none")]
    pub self_presence: Option<UserPresence>,
    /// Room name, for room channels.
    #[prost(string, tag = "4")]
    pub room_name: String,
    /// Group id, for group channels.
    #[prost(string, tag = "5")]
    pub group_id: String,
    /// First user, for direct channels.
    #[prost(string, tag = "6")]
    pub user_id_one: String,
    /// Second user, for direct channels.
    #[prost(string, tag = "7")]
    pub user_id_two: String,
}

/// Leave a chat channel. Replied to with an empty envelope.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelLeave {
    /// Channel id.
    #[prost(string, tag = "1")]
    pub channel_id: String,
}

/// A chat message pushed to channel members.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelMessage {
    /// Channel id.
    #[prost(string, tag = "1")]
    pub channel_id: String,
    /// Message id.
    #[prost(string, tag = "2")]
    pub message_id: String,
    /// Message code; negative values are reserved by the server.
    #[prost(int32, tag = "3")]
    pub code: i32,
    /// Sender user id.
    #[prost(string, tag = "4")]
    pub sender_id: String,
    /// Sender username.
    #[prost(string, tag = "5")]
    pub username: String,
    /// JSON content.
    #[prost(string, tag = "6")]
    pub content: String,
    /// Creation time in unix seconds.
    #[prost(int64, tag = "7")]
    pub create_time: i64,
    /// Last update time in unix seconds.
    #[prost(int64, tag = "8")]
    pub update_time: i64,
    /// Whether the message is persisted.
    #[prost(bool, tag = "9")]
    pub persistent: bool,
    /// Room name, for room channels.
    #[prost(string, tag = "10")]
    pub room_name: String,
    /// Group id, for group channels.
    #[prost(string, tag = "11")]
    pub group_id: String,
    /// First user, for direct channels.
    #[prost(string, tag = "12")]
    pub user_id_one: String,
    /// Second user, for direct channels.
    #[prost(string, tag = "13")]
    pub user_id_two: String,
}

/// Receipt for a sent, updated or removed channel message.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelMessageAck {
    /// Channel id.
    #[prost(string, tag = "1")]
    pub channel_id: String,
    /// Message id.
    #[prost(string, tag = "2")]
    pub message_id: String,
    /// Message code.
    #[prost(int32, tag = "3")]
    pub code: i32,
    /// Sender username.
    #[prost(string, tag = "4")]
    pub username: String,
    /// Creation time in unix seconds.
    #[prost(int64, tag = "5")]
    pub create_time: i64,
    /// Last update time in unix seconds.
    #[prost(int64, tag = "6")]
    pub update_time: i64,
    /// Whether the message is persisted.
    #[prost(bool, tag = "7")]
    pub persistent: bool,
    /// Room name, for room channels.
    #[prost(string, tag = "8")]
    pub room_name: String,
    /// Group id, for group channels.
    #[prost(string, tag = "9")]
    pub group_id: String,
    /// First user, for direct channels.
    #[prost(string, tag = "10")]
    pub user_id_one: String,
    /// Second user, for direct channels.
    #[prost(string, tag = "11")]
    pub user_id_two: String,
}

/// Send a message to a channel. Replied to with [`ChannelMessageAck`].
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelMessageSend {
    /// Channel id.
    #[prost(string, tag = "1")]
    pub channel_id: String,
    /// JSON content.
    #[prost(string, tag = "2")]
    pub content: String,
}

/// Replace the content of a previously sent message.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelMessageUpdate {
    /// Channel id.
    #[prost(string, tag = "1")]
    pub channel_id: String,
    /// Message id.
    #[prost(string, tag = "2")]
    pub message_id: String,
    /// New JSON content.
    #[prost(string, tag = "3")]
    pub content: String,
}

/// Remove a previously sent message.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelMessageRemove {
    /// Channel id.
    #[prost(string, tag = "1")]
    pub channel_id: String,
    /// Message id.
    #[prost(string, tag = "2")]
    pub message_id: String,
}

/// Members joining and leaving a channel.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelPresenceEvent {
    /// Channel id.
    #[prost(string, tag = "1")]
    pub channel_id: String,
    /// Presences that joined.
    #[prost(message, repeated, tag = "2")]
    pub joins: Vec<UserPresence>,
    /// Presences that left.
    #[prost(message, repeated, tag = "3")]
    pub leaves: Vec<UserPresence>,
    /// Room name, for room channels.
    #[prost(string, tag = "4")]
    pub room_name: String,
    /// Group id, for group channels.
    #[prost(string, tag = "5")]
    pub group_id: String,
    /// First user, for direct channels.
    #[prost(string, tag = "6")]
    pub user_id_one: String,
    /// Second user, for direct channels.
    #[prost(string, tag = "7")]
    pub user_id_two: String,
}
