//! # arena-settings
//!
//! Configuration management with layered sources for the arena client.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`ArenaSettings::default()`]
//! 2. **User file**: `~/.arena/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `ARENA_*` overrides (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use arena_settings::get_settings;
//!
//! let settings = get_settings();
//! println!("backend: {}", settings.client.base_url);
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

use std::sync::OnceLock;

/// Global settings singleton.
static SETTINGS: OnceLock<ArenaSettings> = OnceLock::new();

/// Get the global settings instance.
///
/// On first call, loads settings from `~/.arena/settings.json` with env var
/// overrides. If loading fails, returns compiled defaults.
pub fn get_settings() -> &'static ArenaSettings {
    SETTINGS.get_or_init(|| {
        load_settings().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load settings, using defaults");
            ArenaSettings::default()
        })
    })
}

/// Initialize the global settings with a specific value.
///
/// Returns the provided settings back if the global was already initialized.
#[allow(clippy::result_large_err)]
pub fn init_settings(settings: ArenaSettings) -> std::result::Result<(), ArenaSettings> {
    SETTINGS.set(settings)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
