//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`ArenaSettings::default()`]
//! 2. If `~/.arena/settings.json` exists, deep-merge user values over defaults
//! 3. Apply `ARENA_*` environment variable overrides (highest priority)
//! 4. Validate cross-field constraints
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::{ArenaSettings, WireFormat};

/// Resolve the path to the settings file (`~/.arena/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".arena").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<ArenaSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON or the merged values are inconsistent, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<ArenaSettings> {
    let defaults = serde_json::to_value(ArenaSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: ArenaSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    validate(&settings)?;
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Reject settings the client cannot run with.
pub fn validate(settings: &ArenaSettings) -> Result<()> {
    let rt = &settings.realtime;
    if rt.backoff.floor_ms == 0 {
        return Err(SettingsError::InvalidValue(
            "realtime.backoff.floorMs must be positive".into(),
        ));
    }
    if rt.backoff.ceiling_ms == 0 {
        return Err(SettingsError::InvalidValue(
            "realtime.backoff.ceilingMs must be positive".into(),
        ));
    }
    if rt.backoff.ceiling_ms < rt.backoff.floor_ms {
        return Err(SettingsError::InvalidValue(format!(
            "realtime.backoff.ceilingMs ({}) is below floorMs ({})",
            rt.backoff.ceiling_ms, rt.backoff.floor_ms
        )));
    }
    if !(0.0..=1.0).contains(&rt.backoff.jitter_factor) {
        return Err(SettingsError::InvalidValue(
            "realtime.backoff.jitterFactor must be within 0.0..=1.0".into(),
        ));
    }
    if rt.poll_interval_ms == 0 {
        return Err(SettingsError::InvalidValue(
            "realtime.pollIntervalMs must be positive".into(),
        ));
    }
    if rt.outbound_queue_capacity == 0 {
        return Err(SettingsError::InvalidValue(
            "realtime.outboundQueueCapacity must be positive".into(),
        ));
    }
    Ok(())
}

/// Apply environment variable overrides to loaded settings.
///
/// Invalid values are logged and ignored (fall back to file/default).
pub fn apply_env_overrides(settings: &mut ArenaSettings) {
    // ── Client settings ─────────────────────────────────────────────
    if let Some(v) = read_env_string("ARENA_BASE_URL") {
        settings.client.base_url = v;
    }
    if let Some(v) = read_env_string("ARENA_SERVER_KEY") {
        settings.client.server_key = v;
    }
    if let Some(v) = read_env_u64("ARENA_GRACE_SECS", 0, 86_400) {
        settings.client.expiry_grace_secs = v;
    }
    if let Some(v) = read_env_u64("ARENA_REQUEST_TIMEOUT_MS", 100, 600_000) {
        settings.client.request_timeout_ms = v;
    }

    // ── Realtime settings ───────────────────────────────────────────
    if let Some(v) = read_env_format("ARENA_FORMAT") {
        settings.realtime.format = v;
    }
    if let Some(v) = read_env_bool("ARENA_PERSIST") {
        settings.realtime.persist = v;
    }
    if let Some(v) = read_env_u64("ARENA_PING_INTERVAL_MS", 0, 3_600_000) {
        settings.realtime.ping_interval_ms = v;
    }
    if let Some(v) = read_env_string("ARENA_LANG") {
        settings.realtime.lang = Some(v);
    }

    // ── Logging settings ────────────────────────────────────────────
    if let Some(v) = read_env_string("ARENA_LOG_LEVEL") {
        settings.logging.level = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a wire format name (`binary`/`protobuf` or `text`/`json`).
pub fn parse_format(val: &str) -> Option<WireFormat> {
    match val.to_lowercase().as_str() {
        "binary" | "protobuf" => Some(WireFormat::Binary),
        "text" | "json" => Some(WireFormat::Text),
        _ => None,
    }
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_bool(name: &str) -> Option<bool> {
    let val = std::env::var(name).ok()?;
    let result = parse_bool(&val);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid boolean env var, ignoring");
    }
    result
}

fn read_env_u64(name: &str, min: u64, max: u64) -> Option<u64> {
    let val = std::env::var(name).ok()?;
    let result = parse_u64_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u64 env var, ignoring");
    }
    result
}

fn read_env_format(name: &str) -> Option<WireFormat> {
    let val = std::env::var(name).ok()?;
    let result = parse_format(&val);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid wire format env var, ignoring");
    }
    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
