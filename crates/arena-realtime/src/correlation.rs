//! Correlation table: pending calls keyed by correlation id.
//!
//! Ids are decimal strings from a counter that never goes backwards, so an
//! id is never reused for the lifetime of the client. Every entry leaves the
//! table exactly once: by reply, by cancellation or by [`drain_all`].
//!
//! [`drain_all`]: CorrelationTable::drain_all

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use arena_protocol::{Envelope, ExpectedReply, Message};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{trace, warn};

use crate::errors::RealtimeError;

/// Outcome delivered to a waiting caller.
pub type CallResult = Result<Option<Message>, RealtimeError>;

/// Receiving end handed back to the caller.
pub type ReplySlot = oneshot::Sender<CallResult>;

/// A call waiting for its reply.
#[derive(Debug)]
pub struct PendingCall {
    expected: ExpectedReply,
    slot: ReplySlot,
}

impl PendingCall {
    /// Wrap a reply slot with the reply the request expects.
    pub fn new(expected: ExpectedReply, slot: ReplySlot) -> Self {
        Self { expected, slot }
    }

    fn settle(self, result: CallResult) {
        // The caller may have stopped waiting.
        let _ = self.slot.send(result);
    }

    fn outcome(&self, message: Option<Message>) -> CallResult {
        match (message, self.expected) {
            (Some(Message::Error(err)), _) => Err(err.into()),
            (message, ExpectedReply::Ack) => Ok(message),
            (Some(message), ExpectedReply::Message(kind)) if message.kind() == kind => {
                Ok(Some(message))
            }
            (message, expected) => Err(RealtimeError::UnexpectedReply {
                expected: describe(expected),
                actual: message.map_or_else(|| "empty".to_string(), |m| m.kind().to_string()),
            }),
        }
    }
}

fn describe(expected: ExpectedReply) -> String {
    match expected {
        ExpectedReply::Message(kind) => kind.to_string(),
        ExpectedReply::Ack => "empty".to_string(),
        ExpectedReply::NoReply => "no reply".to_string(),
    }
}

/// Lock-guarded map from correlation id to pending call.
#[derive(Debug, Default)]
pub struct CorrelationTable {
    next: AtomicU64,
    pending: Mutex<HashMap<String, PendingCall>>,
}

impl CorrelationTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next correlation id.
    pub fn next_id(&self) -> String {
        (self.next.fetch_add(1, Ordering::Relaxed) + 1).to_string()
    }

    /// Store a call under a fresh id and return the id.
    pub fn register(&self, call: PendingCall) -> String {
        let id = self.next_id();
        let _ = self.pending.lock().insert(id.clone(), call);
        trace!(cid = %id, "call registered");
        id
    }

    /// Settle the call matching the envelope's cid.
    ///
    /// An error envelope settles it with [`RealtimeError::Protocol`]; a reply
    /// of the wrong kind with [`RealtimeError::UnexpectedReply`]. A cid with
    /// no pending call is logged and reported back, never fatal.
    pub fn resolve(&self, envelope: Envelope) -> Result<(), RealtimeError> {
        let Some(call) = self.pending.lock().remove(&envelope.cid) else {
            warn!(cid = %envelope.cid, kind = ?envelope.kind(), "reply for unknown correlation id");
            return Err(RealtimeError::UnknownCorrelationId(envelope.cid));
        };
        let result = call.outcome(envelope.message);
        trace!(cid = %envelope.cid, ok = result.is_ok(), "call resolved");
        call.settle(result);
        Ok(())
    }

    /// Remove one call and settle it with `err`. Returns whether it was
    /// still pending.
    pub fn cancel(&self, id: &str, err: RealtimeError) -> bool {
        let call = self.pending.lock().remove(id);
        match call {
            Some(call) => {
                trace!(cid = id, error = %err, "call cancelled");
                call.settle(Err(err));
                true
            }
            None => false,
        }
    }

    /// Cancel the call if its caller is no longer waiting.
    pub fn cancel_if_abandoned(&self, id: &str) -> bool {
        let abandoned = self
            .pending
            .lock()
            .get(id)
            .is_some_and(|call| call.slot.is_closed());
        abandoned && self.cancel(id, RealtimeError::Cancelled)
    }

    /// Remove every call and settle each with `err`. Returns how many.
    pub fn drain_all(&self, err: &RealtimeError) -> usize {
        let drained: Vec<PendingCall> = {
            let mut pending = self.pending.lock();
            pending.drain().map(|(_, call)| call).collect()
        };
        let count = drained.len();
        for call in drained {
            call.settle(Err(err.clone()));
        }
        count
    }

    /// Number of pending calls.
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Whether no call is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    /// Whether `id` is pending.
    pub fn contains(&self, id: &str) -> bool {
        self.pending.lock().contains_key(id)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
