//! Realtime socket settings.

use arena_core::BackoffConfig;
use serde::{Deserialize, Serialize};

/// Envelope encoding negotiated with the server.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    /// Compact protobuf frames.
    #[default]
    Binary,
    /// JSON text frames.
    Text,
}

/// Realtime connection settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RealtimeSettings {
    /// Envelope encoding.
    pub format: WireFormat,
    /// Keep redialing in the background instead of failing once.
    pub persist: bool,
    /// How often the supervisor checks a healthy connection, in milliseconds.
    pub poll_interval_ms: u64,
    /// Upper bound for a single dial, in milliseconds.
    pub connect_timeout_ms: u64,
    /// Reconnect backoff.
    pub backoff: BackoffConfig,
    /// Keepalive ping interval in milliseconds (0 disables).
    pub ping_interval_ms: u64,
    /// Capacity of the outbound send queue.
    pub outbound_queue_capacity: usize,
    /// Language tag sent as the `lang` connection parameter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    /// Whether the user should appear online to followers (`status` parameter).
    pub appear_online: bool,
}

impl Default for RealtimeSettings {
    fn default() -> Self {
        Self {
            format: WireFormat::Binary,
            persist: false,
            poll_interval_ms: 250,
            connect_timeout_ms: 10_000,
            backoff: BackoffConfig::default(),
            ping_interval_ms: 0,
            outbound_queue_capacity: 256,
            lang: None,
            appear_online: true,
        }
    }
}
