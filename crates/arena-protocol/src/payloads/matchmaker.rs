//! Matchmaker payloads.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::common::UserPresence;

/// Submit a matchmaking ticket. Replied to with [`MatchmakerTicket`].
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchmakerAdd {
    /// Minimum total user count to match together.
    #[prost(int32, tag = "1")]
    pub min_count: i32,
    /// Maximum total user count to match together.
    #[prost(int32, tag = "2")]
    pub max_count: i32,
    /// Filter query used to find opponents.
    #[prost(string, tag = "3")]
    pub query: String,
    /// String properties describing this ticket.
    #[prost(map = "string, string", tag = "4")]
    pub string_properties: HashMap<String, String>,
    /// Numeric properties describing this ticket.
    #[prost(map = "string, double", tag = "5")]
    pub numeric_properties: HashMap<String, f64>,
    /// Optional multiple the matched count must be a multiple of.
    #[prost(int32, optional, tag = "6")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count_multiple: Option<i32>,
}

/// A ticket issued for a matchmaker submission.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchmakerTicket {
    /// Ticket id.
    #[prost(string, tag = "1")]
    pub ticket: String,
}

/// Cancel a matchmaking ticket. Replied to with an empty envelope.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchmakerRemove {
    /// Ticket id.
    #[prost(string, tag = "1")]
    pub ticket: String,
}

/// A matched user with the properties they submitted.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchmakerUser {
    /// The user's presence.
    #[prost(message, optional, tag = "1")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence: Option<UserPresence>,
    /// Party id, when the user matched as part of a party.
    #[prost(string, tag = "2")]
    pub party_id: String,
    /// String properties.
    #[prost(map = "string, string", tag = "3")]
    pub string_properties: HashMap<String, String>,
    /// Numeric properties.
    #[prost(map = "string, double", tag = "4")]
    pub numeric_properties: HashMap<String, f64>,
}

/// A successful matchmaking result.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchmakerMatched {
    /// The ticket that matched.
    #[prost(string, tag = "1")]
    pub ticket: String,
    /// Authoritative match id, if one was created.
    #[prost(string, tag = "2")]
    pub match_id: String,
    /// Token for joining a relayed match.
    #[prost(string, tag = "3")]
    pub token: String,
    /// Every matched user, this client included.
    #[prost(message, repeated, tag = "4")]
    pub users: Vec<MatchmakerUser>,
    /// This client's own entry.
    #[prost(message, optional, tag = "5")]
    #[serde(rename = "self", skip_serializing_if = "Option::is_none")]
    pub self_user: Option<MatchmakerUser>,
}
