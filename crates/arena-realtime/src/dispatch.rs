//! Push dispatch: uncorrelated envelopes fan out to registered handlers.
//!
//! Handlers are keyed by [`MessageKind`]. Each invocation runs on its own
//! tokio task, so a panicking handler never reaches the inbound loop, the
//! other handlers or any waiting caller.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use arena_protocol::payloads::{
    ChannelMessage, ChannelPresenceEvent, MatchData, MatchPresenceEvent, MatchmakerMatched,
    Notifications, Party, PartyClose, PartyData, PartyLeader, PartyPresenceEvent, ServerError,
    StatusPresenceEvent, StreamData, StreamPresenceEvent,
};
use arena_protocol::{Envelope, Message, MessageKind};
use parking_lot::RwLock;
use tracing::{debug, warn};

/// A registered push handler.
pub type Handler = Arc<dyn Fn(Message) + Send + Sync>;

type Slots = HashMap<MessageKind, Vec<Option<Handler>>>;

/// Handlers keyed by message kind.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    slots: Arc<RwLock<Slots>>,
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.len())
            .finish()
    }
}

/// Handle to one registration. Dropping it keeps the handler registered.
#[derive(Debug)]
pub struct Subscription {
    kind: MessageKind,
    index: usize,
    slots: Weak<RwLock<Slots>>,
}

impl Subscription {
    /// Kind this handler was registered for.
    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Remove the handler. Returns whether it was still registered.
    pub fn unsubscribe(self) -> bool {
        let Some(slots) = self.slots.upgrade() else {
            return false;
        };
        let mut slots = slots.write();
        slots
            .get_mut(&self.kind)
            .and_then(|handlers| handlers.get_mut(self.index))
            .and_then(Option::take)
            .is_some()
    }
}

/// Typed registration for a push kind whose payload is `$payload`.
macro_rules! typed_handlers {
    ($($(#[$doc:meta])* $method:ident => $variant:ident($payload:ty);)*) => {
        impl HandlerRegistry {
            $(
                $(#[$doc])*
                pub fn $method<F>(&self, handler: F) -> Subscription
                where
                    F: Fn($payload) + Send + Sync + 'static,
                {
                    self.on(MessageKind::$variant, move |message| {
                        if let Message::$variant(payload) = message {
                            handler(payload);
                        }
                    })
                }
            )*
        }
    };
}

typed_handlers! {
    /// Chat messages on joined channels.
    on_channel_message => ChannelMessage(ChannelMessage);
    /// Joins and leaves on joined channels.
    on_channel_presence_event => ChannelPresenceEvent(ChannelPresenceEvent);
    /// Uncorrelated server errors.
    on_error => Error(ServerError);
    /// Match state from other participants.
    on_match_data => MatchData(MatchData);
    /// Joins and leaves on joined matches.
    on_match_presence_event => MatchPresenceEvent(MatchPresenceEvent);
    /// Matchmaking results.
    on_matchmaker_matched => MatchmakerMatched(MatchmakerMatched);
    /// In-app notifications.
    on_notifications => Notifications(Notifications);
    /// Status changes of followed users.
    on_status_presence_event => StatusPresenceEvent(StatusPresenceEvent);
    /// Data on a joined stream.
    on_stream_data => StreamData(StreamData);
    /// Joins and leaves on joined streams.
    on_stream_presence_event => StreamPresenceEvent(StreamPresenceEvent);
    /// Party state after a join was accepted.
    on_party => Party(Party);
    /// Party leadership changes.
    on_party_leader => PartyLeader(PartyLeader);
    /// Data from party members.
    on_party_data => PartyData(PartyData);
    /// Joins and leaves on the current party.
    on_party_presence_event => PartyPresenceEvent(PartyPresenceEvent);
    /// The current party was closed.
    on_party_close => PartyClose(PartyClose);
}

impl HandlerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for every push of `kind`.
    ///
    /// Slots freed by [`Subscription::unsubscribe`] are reused, so
    /// subscribe/unsubscribe churn does not grow the registry.
    pub fn on<F>(&self, kind: MessageKind, handler: F) -> Subscription
    where
        F: Fn(Message) + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(handler);
        let mut slots = self.slots.write();
        let handlers = slots.entry(kind).or_default();
        // A freed slot's subscription was consumed by `unsubscribe`.
        let index = match handlers.iter().position(Option::is_none) {
            Some(index) => {
                handlers[index] = Some(handler);
                index
            }
            None => {
                handlers.push(Some(handler));
                handlers.len() - 1
            }
        };
        Subscription {
            kind,
            index,
            slots: Arc::downgrade(&self.slots),
        }
    }

    /// Number of live handlers across all kinds.
    pub fn len(&self) -> usize {
        self.slots
            .read()
            .values()
            .map(|handlers| handlers.iter().flatten().count())
            .sum()
    }

    /// Whether no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hand an uncorrelated envelope to its kind's handlers.
    ///
    /// Returns how many handlers were started. Must be called from within a
    /// tokio runtime.
    pub fn dispatch(&self, envelope: Envelope) -> usize {
        let Some(message) = envelope.message else {
            debug!("empty push envelope ignored");
            return 0;
        };
        let kind = message.kind();
        if let Message::Error(err) = &message {
            warn!(code = err.code, message = %err.message, "server error pushed");
        }

        let handlers: Vec<Handler> = self
            .slots
            .read()
            .get(&kind)
            .map(|handlers| handlers.iter().flatten().cloned().collect())
            .unwrap_or_default();
        if handlers.is_empty() {
            debug!(%kind, "no handler registered, push discarded");
            return 0;
        }

        for handler in &handlers {
            let handler = Arc::clone(handler);
            let message = message.clone();
            // Detached: a panic stays inside the handler's task.
            drop(tokio::spawn(async move { handler(message) }));
        }
        handlers.len()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
