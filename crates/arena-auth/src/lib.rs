//! # arena-auth
//!
//! Session lifecycle for the arena client.
//!
//! - [`Session`]: an accepted token pair with expiries derived from the
//!   tokens' `exp` claims
//! - [`SessionManager`]: stores the session, checks expiry against a
//!   grace period, refreshes proactively, logs out
//! - [`SessionApi`] / [`HttpSessionApi`]: the refresh, logout and
//!   authenticate endpoints

#![deny(unsafe_code)]

pub mod api;
pub mod errors;
pub mod manager;
pub mod session;

pub use api::{Credential, HttpSessionApi, SessionApi};
pub use errors::{Result, SessionError};
pub use manager::SessionManager;
pub use session::{Claims, Expiry, Session, TokenPair, parse_claims};
