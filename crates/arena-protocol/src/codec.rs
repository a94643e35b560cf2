//! Envelope codec: protobuf binary frames or JSON text frames.
//!
//! Text frames are flat objects: `{"cid": "1", "channel_join": {...}}`.
//! Unknown top-level keys are skipped so newer servers can add kinds.

use prost::Message as _;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::trace;

use crate::envelope::{Envelope, Message, MessageKind};
use crate::errors::{CodecError, Result};

const CID_KEY: &str = "cid";

/// Encoding negotiated for a connection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Protobuf wire format, sent as binary frames.
    #[default]
    Binary,
    /// JSON, sent as text frames.
    Text,
}

impl Format {
    /// Value of the `format` query parameter when dialing.
    #[must_use]
    pub fn as_param(self) -> &'static str {
        match self {
            Self::Binary => "protobuf",
            Self::Text => "json",
        }
    }
}

/// Encode an envelope.
pub fn encode(envelope: &Envelope, format: Format) -> Result<Vec<u8>> {
    match format {
        Format::Binary => Ok(envelope.encode_to_vec()),
        Format::Text => encode_text(envelope).map(String::into_bytes),
    }
}

/// Decode an envelope.
pub fn decode(bytes: &[u8], format: Format) -> Result<Envelope> {
    match format {
        Format::Binary => Envelope::decode(bytes).map_err(|e| CodecError::Binary(e.to_string())),
        Format::Text => {
            let text = std::str::from_utf8(bytes).map_err(|e| CodecError::Text(e.to_string()))?;
            decode_text(text)
        }
    }
}

/// Encode an envelope as a JSON string.
pub fn encode_text(envelope: &Envelope) -> Result<String> {
    let mut object = Map::new();
    if envelope.has_cid() {
        let _ = object.insert(CID_KEY.to_owned(), Value::String(envelope.cid.clone()));
    }
    if let Some(message) = &envelope.message {
        match serde_json::to_value(message).map_err(|e| CodecError::Text(e.to_string()))? {
            Value::Object(payload) => object.extend(payload),
            other => {
                return Err(CodecError::Text(format!(
                    "{} did not serialize to an object: {other}",
                    message.kind()
                )));
            }
        }
    }
    serde_json::to_string(&Value::Object(object)).map_err(|e| CodecError::Text(e.to_string()))
}

/// Decode an envelope from a JSON string.
pub fn decode_text(text: &str) -> Result<Envelope> {
    let value: Value = serde_json::from_str(text).map_err(|e| CodecError::Text(e.to_string()))?;
    let Value::Object(object) = value else {
        return Err(CodecError::Text("envelope is not a JSON object".into()));
    };

    let mut envelope = Envelope::default();
    for (key, payload) in object {
        if key == CID_KEY {
            envelope.cid = match payload {
                Value::String(cid) => cid,
                Value::Null => String::new(),
                Value::Number(n) => n.to_string(),
                other => return Err(CodecError::Text(format!("invalid cid: {other}"))),
            };
            continue;
        }
        let Some(kind) = MessageKind::from_wire(&key) else {
            trace!(key = %key, "skipping unknown envelope key");
            continue;
        };
        if let Some(existing) = &envelope.message {
            return Err(CodecError::Text(format!(
                "envelope carries both {} and {kind}",
                existing.kind()
            )));
        }
        let mut tagged = Map::with_capacity(1);
        let _ = tagged.insert(key, payload);
        let message: Message = serde_json::from_value(Value::Object(tagged))
            .map_err(|e| CodecError::Text(format!("malformed {kind} payload: {e}")))?;
        envelope.message = Some(message);
    }
    Ok(envelope)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
