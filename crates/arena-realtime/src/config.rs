//! Runtime configuration for a realtime connection.

use std::time::Duration;

use arena_core::BackoffConfig;
use arena_protocol::Format;
use arena_settings::{ArenaSettings, WireFormat};

/// Connection behaviour, resolved from settings or built by hand.
#[derive(Clone, Debug)]
pub struct RealtimeConfig {
    /// Envelope encoding.
    pub format: Format,
    /// Keep redialing in the background instead of failing once.
    pub persist: bool,
    /// Supervisor check interval while the connection is healthy.
    pub poll_interval: Duration,
    /// Upper bound for a single dial.
    pub connect_timeout: Duration,
    /// Default wait for a reply; `None` waits until the caller cancels.
    pub request_timeout: Option<Duration>,
    /// Reconnect backoff.
    pub backoff: BackoffConfig,
    /// Keepalive ping interval; `None` disables keepalive.
    pub ping_interval: Option<Duration>,
    /// Capacity of the outbound send queue.
    pub outbound_queue_capacity: usize,
    /// `lang` connection parameter.
    pub lang: Option<String>,
    /// `status` connection parameter.
    pub appear_online: bool,
    /// Base address to dial instead of the token source's.
    pub url_override: Option<String>,
    /// Token to dial with instead of asking the token source.
    pub token_override: Option<String>,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self::from_settings(&ArenaSettings::default())
    }
}

fn non_zero_ms(ms: u64) -> Option<Duration> {
    (ms > 0).then_some(Duration::from_millis(ms))
}

impl RealtimeConfig {
    /// Resolve from loaded settings.
    pub fn from_settings(settings: &ArenaSettings) -> Self {
        let rt = &settings.realtime;
        Self {
            format: match rt.format {
                WireFormat::Binary => Format::Binary,
                WireFormat::Text => Format::Text,
            },
            persist: rt.persist,
            poll_interval: Duration::from_millis(rt.poll_interval_ms.max(1)),
            connect_timeout: Duration::from_millis(rt.connect_timeout_ms),
            request_timeout: non_zero_ms(settings.client.request_timeout_ms),
            backoff: rt.backoff.clone(),
            ping_interval: non_zero_ms(rt.ping_interval_ms),
            outbound_queue_capacity: rt.outbound_queue_capacity.max(1),
            lang: rt.lang.clone(),
            appear_online: rt.appear_online,
            url_override: None,
            token_override: None,
        }
    }

    /// Set the encoding.
    #[must_use]
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Enable or disable persist mode.
    #[must_use]
    pub fn with_persist(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    /// Dial this base address instead of the token source's.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url_override = Some(url.into());
        self
    }

    /// Dial with this token instead of asking the token source.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token_override = Some(token.into());
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
