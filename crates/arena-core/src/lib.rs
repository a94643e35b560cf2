//! # arena-core
//!
//! Foundation types shared by every arena crate:
//!
//! - **Clock**: [`Clock`] abstraction over "now", with a [`ManualClock`] for tests
//! - **Backoff**: [`BackoffConfig`] and the [`Backoff`] state used by the
//!   reconnect supervisor
//! - **Logging**: [`logging::init_subscriber`] for the `tracing` subscriber

#![deny(unsafe_code)]

pub mod clock;
pub mod logging;
pub mod retry;

pub use clock::{Clock, ManualClock, SystemClock};
pub use retry::{Backoff, BackoffConfig, apply_jitter, next_delay_ms};

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
