//! # arena-protocol
//!
//! Wire types for the realtime socket.
//!
//! - [`Envelope`]: correlation id plus an optional [`Message`].
//! - [`payloads`]: the payload structs, grouped by domain.
//! - [`codec`]: binary (protobuf) and text (JSON) encodings.
//!
//! Every payload derives both `prost::Message` and serde, so one set of types
//! serves both encodings.

#![deny(unsafe_code)]

pub mod codec;
pub mod envelope;
pub mod errors;
pub mod payloads;
pub mod serde_helpers;

pub use codec::{Format, decode, decode_text, encode, encode_text};
pub use envelope::{Envelope, ExpectedReply, Message, MessageKind};
pub use errors::{CodecError, Result};
