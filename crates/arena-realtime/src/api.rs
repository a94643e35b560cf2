//! Typed request methods.
//!
//! Each method builds one request, sends it through
//! [`RealtimeClient::send`] and unwraps the reply variant the server
//! answers that request with.

use std::collections::HashMap;

use arena_protocol::payloads::{
    Channel, ChannelJoin, ChannelLeave, ChannelMessageAck, ChannelMessageRemove,
    ChannelMessageSend, ChannelMessageUpdate, ChannelType, Match, MatchCreate, MatchDataSend,
    MatchJoin, MatchLeave, MatchmakerAdd, MatchmakerRemove, MatchmakerTicket, Party, PartyAccept,
    PartyClose, PartyCreate, PartyDataSend, PartyJoin, PartyLeave, PartyPromote, PartyRemove,
    Ping, Rpc, Status, StatusFollow, StatusUnfollow, StatusUpdate, UserPresence,
};
use arena_protocol::{Envelope, Message, MessageKind};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::client::RealtimeClient;
use crate::errors::{RealtimeError, Result};

/// Unwrap `$variant` from a reply or fail with `UnexpectedReply`.
macro_rules! expect_reply {
    ($reply:expr, $variant:ident) => {
        match $reply {
            Some(Message::$variant(payload)) => Ok(payload),
            other => Err(unexpected(MessageKind::$variant, other.as_ref())),
        }
    };
}

fn unexpected(expected: MessageKind, actual: Option<&Message>) -> RealtimeError {
    RealtimeError::UnexpectedReply {
        expected: expected.to_string(),
        actual: actual.map_or_else(|| "empty".to_string(), |m| m.kind().to_string()),
    }
}

impl RealtimeClient {
    async fn call(&self, message: impl Into<Message>) -> Result<Option<Message>> {
        self.send(Envelope::request(message)).await
    }

    async fn call_ack(&self, message: impl Into<Message>) -> Result<()> {
        let _ = self.call(message).await?;
        Ok(())
    }

    // ─── Channels ────────────────────────────────────────────────────────

    /// Join a room, group or direct-message channel.
    pub async fn join_channel(
        &self,
        target: impl Into<String>,
        channel_type: ChannelType,
        persistence: bool,
        hidden: bool,
    ) -> Result<Channel> {
        let reply = self
            .call(ChannelJoin {
                target: target.into(),
                channel_type: channel_type as i32,
                persistence: Some(persistence),
                hidden: Some(hidden),
            })
            .await?;
        expect_reply!(reply, Channel)
    }

    /// Leave a channel.
    pub async fn leave_channel(&self, channel_id: impl Into<String>) -> Result<()> {
        self.call_ack(ChannelLeave {
            channel_id: channel_id.into(),
        })
        .await
    }

    /// Post a message; `content` is a JSON object.
    pub async fn write_channel_message(
        &self,
        channel_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<ChannelMessageAck> {
        let reply = self
            .call(ChannelMessageSend {
                channel_id: channel_id.into(),
                content: content.into(),
            })
            .await?;
        expect_reply!(reply, ChannelMessageAck)
    }

    /// Replace the content of a message this user sent.
    pub async fn update_channel_message(
        &self,
        channel_id: impl Into<String>,
        message_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<ChannelMessageAck> {
        let reply = self
            .call(ChannelMessageUpdate {
                channel_id: channel_id.into(),
                message_id: message_id.into(),
                content: content.into(),
            })
            .await?;
        expect_reply!(reply, ChannelMessageAck)
    }

    /// Remove a message this user sent.
    pub async fn remove_channel_message(
        &self,
        channel_id: impl Into<String>,
        message_id: impl Into<String>,
    ) -> Result<ChannelMessageAck> {
        let reply = self
            .call(ChannelMessageRemove {
                channel_id: channel_id.into(),
                message_id: message_id.into(),
            })
            .await?;
        expect_reply!(reply, ChannelMessageAck)
    }

    // ─── Matches ─────────────────────────────────────────────────────────

    /// Create a relayed match. Matches created with the same name share an id.
    pub async fn create_match(&self, name: Option<&str>) -> Result<Match> {
        let reply = self
            .call(MatchCreate {
                name: name.unwrap_or_default().to_string(),
            })
            .await?;
        expect_reply!(reply, Match)
    }

    /// Join a match by id.
    pub async fn join_match(
        &self,
        match_id: impl Into<String>,
        metadata: HashMap<String, String>,
    ) -> Result<Match> {
        let reply = self
            .call(MatchJoin {
                match_id: match_id.into(),
                metadata,
                ..Default::default()
            })
            .await?;
        expect_reply!(reply, Match)
    }

    /// Join a match with a matchmaker token.
    pub async fn join_match_token(
        &self,
        token: impl Into<String>,
        metadata: HashMap<String, String>,
    ) -> Result<Match> {
        let reply = self
            .call(MatchJoin {
                token: token.into(),
                metadata,
                ..Default::default()
            })
            .await?;
        expect_reply!(reply, Match)
    }

    /// Leave a match.
    pub async fn leave_match(&self, match_id: impl Into<String>) -> Result<()> {
        self.call_ack(MatchLeave {
            match_id: match_id.into(),
        })
        .await
    }

    /// Send match state. Not acknowledged; returns once written.
    ///
    /// An empty `presences` sends to every participant.
    pub async fn send_match_data(
        &self,
        match_id: impl Into<String>,
        op_code: i64,
        data: Vec<u8>,
        presences: Vec<UserPresence>,
        reliable: bool,
    ) -> Result<()> {
        self.call_ack(MatchDataSend {
            match_id: match_id.into(),
            op_code,
            data,
            presences,
            reliable,
        })
        .await
    }

    // ─── Matchmaker ──────────────────────────────────────────────────────

    /// Submit a matchmaking ticket.
    pub async fn add_matchmaker(&self, request: MatchmakerAdd) -> Result<MatchmakerTicket> {
        let reply = self.call(request).await?;
        expect_reply!(reply, MatchmakerTicket)
    }

    /// Cancel a matchmaking ticket.
    pub async fn remove_matchmaker(&self, ticket: impl Into<String>) -> Result<()> {
        self.call_ack(MatchmakerRemove {
            ticket: ticket.into(),
        })
        .await
    }

    // ─── Parties ─────────────────────────────────────────────────────────

    /// Create a party led by this user.
    pub async fn create_party(&self, open: bool, max_size: i32) -> Result<Party> {
        let reply = self.call(PartyCreate { open, max_size }).await?;
        expect_reply!(reply, Party)
    }

    /// Join or request to join a party.
    pub async fn join_party(&self, party_id: impl Into<String>) -> Result<()> {
        self.call_ack(PartyJoin {
            party_id: party_id.into(),
        })
        .await
    }

    /// Leave a party.
    pub async fn leave_party(&self, party_id: impl Into<String>) -> Result<()> {
        self.call_ack(PartyLeave {
            party_id: party_id.into(),
        })
        .await
    }

    /// Hand leadership to another member.
    pub async fn promote_party_member(
        &self,
        party_id: impl Into<String>,
        presence: UserPresence,
    ) -> Result<()> {
        self.call_ack(PartyPromote {
            party_id: party_id.into(),
            presence: Some(presence),
        })
        .await
    }

    /// Accept a pending join request.
    pub async fn accept_party_member(
        &self,
        party_id: impl Into<String>,
        presence: UserPresence,
    ) -> Result<()> {
        self.call_ack(PartyAccept {
            party_id: party_id.into(),
            presence: Some(presence),
        })
        .await
    }

    /// Kick a member or reject a join request.
    pub async fn remove_party_member(
        &self,
        party_id: impl Into<String>,
        presence: UserPresence,
    ) -> Result<()> {
        self.call_ack(PartyRemove {
            party_id: party_id.into(),
            presence: Some(presence),
        })
        .await
    }

    /// Close a party, removing every member.
    pub async fn close_party(&self, party_id: impl Into<String>) -> Result<()> {
        self.call_ack(PartyClose {
            party_id: party_id.into(),
        })
        .await
    }

    /// Send data to party members. Not acknowledged; returns once written.
    pub async fn send_party_data(
        &self,
        party_id: impl Into<String>,
        op_code: i64,
        data: Vec<u8>,
    ) -> Result<()> {
        self.call_ack(PartyDataSend {
            party_id: party_id.into(),
            op_code,
            data,
        })
        .await
    }

    // ─── Status ──────────────────────────────────────────────────────────

    /// Follow users' status by id or username.
    pub async fn follow_users(
        &self,
        user_ids: Vec<String>,
        usernames: Vec<String>,
    ) -> Result<Status> {
        let reply = self
            .call(StatusFollow {
                user_ids,
                usernames,
            })
            .await?;
        expect_reply!(reply, Status)
    }

    /// Stop following users' status.
    pub async fn unfollow_users(&self, user_ids: Vec<String>) -> Result<()> {
        self.call_ack(StatusUnfollow { user_ids }).await
    }

    /// Set this user's status; `None` appears offline.
    pub async fn update_status(&self, status: Option<&str>) -> Result<()> {
        self.call_ack(StatusUpdate {
            status: status.map(str::to_string),
        })
        .await
    }

    // ─── Misc ────────────────────────────────────────────────────────────

    /// Round-trip an application-level ping.
    pub async fn ping(&self) -> Result<()> {
        let reply = self.call(Ping {}).await?;
        expect_reply!(reply, Pong).map(|_| ())
    }

    /// Call a server function with a raw payload.
    #[tracing::instrument(skip(self, payload))]
    pub async fn rpc(&self, id: &str, payload: impl Into<String> + Send) -> Result<Rpc> {
        let reply = self
            .call(Rpc {
                id: id.to_string(),
                payload: payload.into(),
                ..Default::default()
            })
            .await?;
        expect_reply!(reply, Rpc)
    }

    /// Call a server function with a JSON payload and decode its JSON reply.
    ///
    /// An empty reply payload decodes as JSON `null`.
    pub async fn rpc_json<T, R>(&self, id: &str, payload: &T) -> Result<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body =
            serde_json::to_string(payload).map_err(|e| RealtimeError::Codec(e.to_string()))?;
        let reply = self.rpc(id, body).await?;
        let text = if reply.payload.is_empty() {
            "null"
        } else {
            reply.payload.as_str()
        };
        serde_json::from_str(text).map_err(|e| RealtimeError::Codec(e.to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use arena_protocol::payloads::Pong;

    use super::*;

    #[test]
    fn expect_reply_unwraps_variant() {
        let reply = Some(Message::Pong(Pong {}));
        let pong: Result<Pong> = expect_reply!(reply, Pong);
        assert_eq!(pong, Ok(Pong {}));
    }

    #[test]
    fn expect_reply_reports_mismatch() {
        let reply = Some(Message::Pong(Pong {}));
        let err = expect_reply!(reply, Channel).unwrap_err();
        assert_eq!(
            err,
            RealtimeError::UnexpectedReply {
                expected: "channel".into(),
                actual: "pong".into(),
            }
        );

        let empty: Option<Message> = None;
        let err = expect_reply!(empty, Match).unwrap_err();
        assert_eq!(
            err,
            RealtimeError::UnexpectedReply {
                expected: "match".into(),
                actual: "empty".into(),
            }
        );
    }
}
