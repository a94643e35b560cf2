//! Envelope payload types, grouped by domain.
//!
//! Every payload is a prost message that also derives serde, so the same
//! value travels in the binary and the text encoding. Text field names are
//! the snake_case field names, byte fields are base64 strings.

pub mod channel;
pub mod common;
pub mod matches;
pub mod matchmaker;
pub mod party;
pub mod status;
pub mod stream;

pub use channel::*;
pub use common::*;
pub use matches::*;
pub use matchmaker::*;
pub use party::*;
pub use status::*;
pub use stream::*;
