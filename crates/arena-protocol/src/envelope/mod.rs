//! The realtime envelope and its tagged message union.
//!
//! - [`Envelope`]: correlation id plus an optional [`Message`].
//! - [`Message`]: one variant per payload kind, generated by
//!   `define_messages!` from the table below.
//! - [`MessageKind`]: `Copy` discriminator with wire names.
//! - [`ExpectedReply`]: what the server answers to each request kind.

#[macro_use]
mod macros;

use serde::{Deserialize, Serialize};

use crate::errors::CodecError;
use crate::payloads::{
    Channel, ChannelJoin, ChannelLeave, ChannelMessage, ChannelMessageAck, ChannelMessageRemove,
    ChannelMessageSend, ChannelMessageUpdate, ChannelPresenceEvent, Match, MatchCreate, MatchData,
    MatchDataSend, MatchJoin, MatchLeave, MatchPresenceEvent, MatchmakerAdd, MatchmakerMatched,
    MatchmakerRemove, MatchmakerTicket, Notifications, Party, PartyAccept, PartyClose,
    PartyCreate, PartyData, PartyDataSend, PartyJoin, PartyLeader, PartyLeave,
    PartyPresenceEvent, PartyPromote, PartyRemove, Ping, Pong, Rpc, ServerError, Status,
    StatusFollow, StatusPresenceEvent, StatusUnfollow, StatusUpdate, StreamData,
    StreamPresenceEvent,
};

define_messages! {
    messages {
        /// A joined chat channel.
        Channel => "channel" => "2" => Channel,
        /// Join a chat channel.
        ChannelJoin => "channel_join" => "3" => ChannelJoin,
        /// Leave a chat channel.
        ChannelLeave => "channel_leave" => "4" => ChannelLeave,
        /// Chat message pushed to channel members.
        ChannelMessage => "channel_message" => "5" => ChannelMessage,
        /// Receipt for a channel message write.
        ChannelMessageAck => "channel_message_ack" => "6" => ChannelMessageAck,
        /// Send a chat message.
        ChannelMessageSend => "channel_message_send" => "7" => ChannelMessageSend,
        /// Update a chat message.
        ChannelMessageUpdate => "channel_message_update" => "8" => ChannelMessageUpdate,
        /// Remove a chat message.
        ChannelMessageRemove => "channel_message_remove" => "9" => ChannelMessageRemove,
        /// Channel members joined or left.
        ChannelPresenceEvent => "channel_presence_event" => "10" => ChannelPresenceEvent,
        /// Application error.
        Error => "error" => "11" => ServerError,
        /// A realtime match.
        Match => "match" => "12" => Match,
        /// Create a match.
        MatchCreate => "match_create" => "13" => MatchCreate,
        /// Match state from a participant.
        MatchData => "match_data" => "14" => MatchData,
        /// Send match state.
        MatchDataSend => "match_data_send" => "15" => MatchDataSend,
        /// Join a match.
        MatchJoin => "match_join" => "16" => MatchJoin,
        /// Leave a match.
        MatchLeave => "match_leave" => "17" => MatchLeave,
        /// Match participants joined or left.
        MatchPresenceEvent => "match_presence_event" => "18" => MatchPresenceEvent,
        /// Submit a matchmaking ticket.
        MatchmakerAdd => "matchmaker_add" => "19" => MatchmakerAdd,
        /// Matchmaking succeeded.
        MatchmakerMatched => "matchmaker_matched" => "20" => MatchmakerMatched,
        /// Cancel a matchmaking ticket.
        MatchmakerRemove => "matchmaker_remove" => "21" => MatchmakerRemove,
        /// Matchmaking ticket issued.
        MatchmakerTicket => "matchmaker_ticket" => "22" => MatchmakerTicket,
        /// In-app notifications.
        Notifications => "notifications" => "23" => Notifications,
        /// Remote procedure call or its reply.
        Rpc => "rpc" => "24" => Rpc,
        /// Followed users' status.
        Status => "status" => "25" => Status,
        /// Follow users' status.
        StatusFollow => "status_follow" => "26" => StatusFollow,
        /// Followed users changed status.
        StatusPresenceEvent => "status_presence_event" => "27" => StatusPresenceEvent,
        /// Unfollow users' status.
        StatusUnfollow => "status_unfollow" => "28" => StatusUnfollow,
        /// Set this client's status.
        StatusUpdate => "status_update" => "29" => StatusUpdate,
        /// Data on a stream.
        StreamData => "stream_data" => "30" => StreamData,
        /// Stream presences joined or left.
        StreamPresenceEvent => "stream_presence_event" => "31" => StreamPresenceEvent,
        /// Application-level ping.
        Ping => "ping" => "32" => Ping,
        /// Reply to a ping.
        Pong => "pong" => "33" => Pong,
        /// A party.
        Party => "party" => "34" => Party,
        /// Create a party.
        PartyCreate => "party_create" => "35" => PartyCreate,
        /// Join a party.
        PartyJoin => "party_join" => "36" => PartyJoin,
        /// Leave a party.
        PartyLeave => "party_leave" => "37" => PartyLeave,
        /// Promote a party member.
        PartyPromote => "party_promote" => "38" => PartyPromote,
        /// New party leader.
        PartyLeader => "party_leader" => "39" => PartyLeader,
        /// Accept a party join request.
        PartyAccept => "party_accept" => "40" => PartyAccept,
        /// Remove a party member.
        PartyRemove => "party_remove" => "41" => PartyRemove,
        /// Close a party.
        PartyClose => "party_close" => "42" => PartyClose,
        /// Data from a party member.
        PartyData => "party_data" => "43" => PartyData,
        /// Send data to a party.
        PartyDataSend => "party_data_send" => "44" => PartyDataSend,
        /// Party members joined or left.
        PartyPresenceEvent => "party_presence_event" => "45" => PartyPresenceEvent,
    }
    domain_groups {
        /// Sent by the client.
        is_request => [
            ChannelJoin, ChannelLeave, ChannelMessageSend, ChannelMessageUpdate,
            ChannelMessageRemove, MatchCreate, MatchDataSend, MatchJoin, MatchLeave,
            MatchmakerAdd, MatchmakerRemove, Rpc, StatusFollow, StatusUnfollow,
            StatusUpdate, Ping, PartyCreate, PartyJoin, PartyLeave, PartyPromote,
            PartyAccept, PartyRemove, PartyClose, PartyDataSend,
        ],
        /// Sent by the server, as a reply or a push.
        is_server_message => [
            Channel, ChannelMessage, ChannelMessageAck, ChannelPresenceEvent, Error,
            Match, MatchData, MatchPresenceEvent, MatchmakerMatched, MatchmakerTicket,
            Notifications, Rpc, Status, StatusPresenceEvent, StreamData,
            StreamPresenceEvent, Pong, Party, PartyClose, PartyLeader, PartyData,
            PartyPresenceEvent,
        ],
        /// Channel domain.
        is_channel => [
            Channel, ChannelJoin, ChannelLeave, ChannelMessage, ChannelMessageAck,
            ChannelMessageSend, ChannelMessageUpdate, ChannelMessageRemove,
            ChannelPresenceEvent,
        ],
        /// Match and matchmaker domain.
        is_match => [
            Match, MatchCreate, MatchData, MatchDataSend, MatchJoin, MatchLeave,
            MatchPresenceEvent, MatchmakerAdd, MatchmakerMatched, MatchmakerRemove,
            MatchmakerTicket,
        ],
        /// Party domain.
        is_party => [
            Party, PartyCreate, PartyJoin, PartyLeave, PartyPromote, PartyLeader,
            PartyAccept, PartyRemove, PartyClose, PartyData, PartyDataSend,
            PartyPresenceEvent,
        ],
    }
}

/// What the server sends back for a request kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExpectedReply {
    /// A correlated reply carrying this kind.
    Message(MessageKind),
    /// A correlated envelope with no message.
    Ack,
    /// Nothing. The request is written without a correlation id.
    NoReply,
}

impl MessageKind {
    /// Reply the server sends for this request kind, `None` for kinds the
    /// client never sends.
    #[must_use]
    pub fn expected_reply(self) -> Option<ExpectedReply> {
        use ExpectedReply::{Ack, NoReply};
        let reply = |kind| Some(ExpectedReply::Message(kind));
        match self {
            Self::ChannelJoin => reply(Self::Channel),
            Self::ChannelMessageSend | Self::ChannelMessageUpdate | Self::ChannelMessageRemove => {
                reply(Self::ChannelMessageAck)
            }
            Self::MatchCreate | Self::MatchJoin => reply(Self::Match),
            Self::MatchmakerAdd => reply(Self::MatchmakerTicket),
            Self::PartyCreate => reply(Self::Party),
            Self::Rpc => reply(Self::Rpc),
            Self::StatusFollow => reply(Self::Status),
            Self::Ping => reply(Self::Pong),
            Self::ChannelLeave
            | Self::MatchLeave
            | Self::MatchmakerRemove
            | Self::PartyJoin
            | Self::PartyLeave
            | Self::PartyPromote
            | Self::PartyAccept
            | Self::PartyRemove
            | Self::PartyClose
            | Self::StatusUnfollow
            | Self::StatusUpdate => Some(Ack),
            Self::MatchDataSend | Self::PartyDataSend => Some(NoReply),
            _ => None,
        }
    }
}

/// A single realtime frame.
///
/// `cid` is non-empty only on a request expecting a reply and on the
/// server's reply to it. An envelope without a message is an empty
/// acknowledgement.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Envelope {
    /// Correlation id, an ASCII decimal string.
    #[prost(string, tag = "1")]
    pub cid: String,
    /// The payload.
    #[prost(
        oneof = "Message",
        tags = "2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, \
                24, 25, 26, 27, 28, 29, 30, 31, 32, 33, 34, 35, 36, 37, 38, 39, 40, 41, 42, 43, \
                44, 45"
    )]
    pub message: Option<Message>,
}

impl Envelope {
    /// An outbound request; the connection assigns the cid.
    pub fn request(message: impl Into<Message>) -> Self {
        Self {
            cid: String::new(),
            message: Some(message.into()),
        }
    }

    /// An envelope with an explicit cid.
    pub fn with_cid(cid: impl Into<String>, message: impl Into<Message>) -> Self {
        Self {
            cid: cid.into(),
            message: Some(message.into()),
        }
    }

    /// An empty acknowledgement for `cid`.
    pub fn ack(cid: impl Into<String>) -> Self {
        Self {
            cid: cid.into(),
            message: None,
        }
    }

    /// Kind of the payload, `None` for an empty envelope.
    #[must_use]
    pub fn kind(&self) -> Option<MessageKind> {
        self.message.as_ref().map(Message::kind)
    }

    /// Whether the envelope is correlated to a request.
    #[must_use]
    pub fn has_cid(&self) -> bool {
        !self.cid.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
