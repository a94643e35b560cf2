//! # arena-realtime
//!
//! Client for the arena realtime socket.
//!
//! - [`RealtimeClient`]: connection lifecycle, persist-mode reconnect, the
//!   request/reply surface and typed request methods
//! - [`CorrelationTable`]: pending calls keyed by correlation id
//! - [`HandlerRegistry`]: per-kind push handlers
//! - [`TokenSource`]: where the socket gets its token and address

#![deny(unsafe_code)]

pub mod api;
pub mod client;
pub mod config;
pub mod correlation;
pub mod dispatch;
pub mod errors;
pub mod socket;
pub mod token;

pub use client::{ConnectionStatus, RealtimeClient};
pub use config::RealtimeConfig;
pub use correlation::{CallResult, CorrelationTable, PendingCall};
pub use dispatch::{Handler, HandlerRegistry, Subscription};
pub use errors::{RealtimeError, Result};
pub use socket::{DialParams, socket_url};
pub use token::{StaticTokenSource, TokenSource};
