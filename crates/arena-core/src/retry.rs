//! Reconnect backoff configuration and delay calculation.
//!
//! The supervisor in `arena-realtime` owns a [`Backoff`] per client. This
//! module holds the portable building blocks:
//!
//! - [`BackoffConfig`]: floor, ceiling, multiplier and jitter
//! - [`Backoff`]: the current delay, grown after each failed dial and reset
//!   on every connected/disconnected transition
//! - [`next_delay_ms`] / [`apply_jitter`]: the pure math

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Default first retry delay in milliseconds.
pub const DEFAULT_FLOOR_MS: u64 = 500;
/// Default maximum retry delay in milliseconds.
pub const DEFAULT_CEILING_MS: u64 = 30_000;
/// Default growth factor between consecutive failed dials.
pub const DEFAULT_MULTIPLIER: f64 = 2.0;
/// Default jitter factor (0.0–1.0). Zero keeps delays deterministic.
pub const DEFAULT_JITTER_FACTOR: f64 = 0.0;

/// Reconnect backoff parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackoffConfig {
    /// Delay after the first failed dial, and the value every reset returns to.
    pub floor_ms: u64,
    /// Upper bound for any delay, jitter included.
    pub ceiling_ms: u64,
    /// Factor applied to the delay after each failed dial.
    pub multiplier: f64,
    /// Jitter range 0.0–1.0, applied symmetrically around the delay.
    pub jitter_factor: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            floor_ms: DEFAULT_FLOOR_MS,
            ceiling_ms: DEFAULT_CEILING_MS,
            multiplier: DEFAULT_MULTIPLIER,
            jitter_factor: DEFAULT_JITTER_FACTOR,
        }
    }
}

impl BackoffConfig {
    /// Floor clamped to `1..=ceiling`. A zero floor would never grow.
    #[must_use]
    pub fn effective_floor_ms(&self) -> u64 {
        self.floor_ms.max(1).min(self.ceiling_ms.max(1))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Backoff state
// ─────────────────────────────────────────────────────────────────────────────

/// Current reconnect delay.
#[derive(Clone, Debug)]
pub struct Backoff {
    config: BackoffConfig,
    current_ms: u64,
}

impl Backoff {
    /// Start at the configured floor.
    pub fn new(config: BackoffConfig) -> Self {
        let current_ms = config.effective_floor_ms();
        Self { config, current_ms }
    }

    /// The delay to sleep before the next dial, jitter applied.
    pub fn delay(&self) -> Duration {
        let ms = if self.config.jitter_factor > 0.0 {
            apply_jitter(
                self.current_ms,
                self.config.jitter_factor,
                rand::random::<f64>(),
                self.config.ceiling_ms,
            )
        } else {
            self.current_ms
        };
        Duration::from_millis(ms)
    }

    /// The un-jittered delay in milliseconds.
    pub fn current_ms(&self) -> u64 {
        self.current_ms
    }

    /// Grow the delay after a failed dial.
    pub fn advance(&mut self) {
        self.current_ms = next_delay_ms(
            self.current_ms,
            self.config.multiplier,
            self.config.ceiling_ms,
        );
    }

    /// Return to the floor.
    pub fn reset(&mut self) {
        self.current_ms = self.config.effective_floor_ms();
    }

    /// The configuration this backoff was built from.
    pub fn config(&self) -> &BackoffConfig {
        &self.config
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Delay math
// ─────────────────────────────────────────────────────────────────────────────

/// Grow `current_ms` by `multiplier`, capped at `ceiling_ms`.
///
/// A multiplier below 1.0 is treated as 1.0 so the delay never shrinks
/// between failures.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn next_delay_ms(current_ms: u64, multiplier: f64, ceiling_ms: u64) -> u64 {
    let factor = if multiplier.is_finite() { multiplier.max(1.0) } else { 1.0 };
    let grown = (current_ms as f64 * factor).round();
    if grown >= ceiling_ms as f64 {
        ceiling_ms
    } else {
        (grown as u64).max(current_ms)
    }
}

/// Apply symmetric jitter to `delay_ms`, never exceeding `ceiling_ms`.
///
/// `random` should be a value in `[0.0, 1.0)`; it maps to
/// `[-jitter_factor, +jitter_factor]`.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn apply_jitter(delay_ms: u64, jitter_factor: f64, random: f64, ceiling_ms: u64) -> u64 {
    let jitter = 1.0 + (random * 2.0 - 1.0) * jitter_factor;
    let with_jitter = (delay_ms as f64 * jitter).round().max(0.0) as u64;
    with_jitter.min(ceiling_ms)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
