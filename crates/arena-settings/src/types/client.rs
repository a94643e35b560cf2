//! HTTP endpoint and session lifecycle settings.

use serde::{Deserialize, Serialize};

/// Where the backend lives and how sessions are kept fresh.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientSettings {
    /// Base HTTP(S) address of the backend. The socket address is derived
    /// from it (`http` → `ws`, `https` → `wss`).
    pub base_url: String,
    /// Server key used as the basic-auth user for session endpoints.
    pub server_key: String,
    /// Seconds subtracted from each token's expiry to refresh early.
    pub expiry_grace_secs: u64,
    /// Refresh the session automatically before handing out a token.
    pub auto_refresh: bool,
    /// Default timeout for a single realtime request in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:7350".to_string(),
            server_key: "defaultkey".to_string(),
            expiry_grace_secs: 300,
            auto_refresh: true,
            request_timeout_ms: 10_000,
        }
    }
}
