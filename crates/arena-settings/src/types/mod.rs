//! Settings types.
//!
//! All structs use `serde(rename_all = "camelCase", default)` so a partial
//! settings file only needs the keys it overrides.

mod client;
mod realtime;

pub use client::ClientSettings;
pub use realtime::{RealtimeSettings, WireFormat};

use serde::{Deserialize, Serialize};

/// Root settings object (`~/.arena/settings.json`).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArenaSettings {
    /// HTTP endpoint and session settings.
    pub client: ClientSettings,
    /// Realtime socket settings.
    pub realtime: RealtimeSettings,
    /// Log output settings.
    pub logging: LoggingSettings,
}

/// Log output settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of compact text.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: arena_core::logging::DEFAULT_LEVEL.to_string(),
            json: false,
        }
    }
}

impl LoggingSettings {
    /// Install the global subscriber described by these settings.
    pub fn init(&self) {
        if self.json {
            arena_core::logging::init_json_subscriber(&self.level);
        } else {
            arena_core::logging::init_subscriber(&self.level);
        }
    }
}
