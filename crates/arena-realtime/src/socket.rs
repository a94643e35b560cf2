//! Socket address derivation and dialing.

use std::time::Duration;

use arena_protocol::Format;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;
use url::Url;

use crate::errors::{RealtimeError, Result};

/// Client side of an established socket.
pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Query parameters sent when dialing.
#[derive(Clone, Debug)]
pub struct DialParams<'a> {
    /// Session token.
    pub token: &'a str,
    /// Envelope encoding.
    pub format: Format,
    /// Optional language tag.
    pub lang: Option<&'a str>,
    /// Whether to appear online to followers.
    pub appear_online: bool,
}

/// Build the socket address from a base HTTP(S) or WS(S) address.
///
/// `http` maps to `ws` and `https` to `wss`; `/ws` is appended to the base
/// path and any existing query is replaced.
pub fn socket_url(base: &str, params: &DialParams<'_>) -> Result<Url> {
    let mut url = Url::parse(base).map_err(|e| RealtimeError::InvalidUrl(format!("{base}: {e}")))?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(RealtimeError::InvalidUrl(format!("unsupported scheme {other}"))),
    };
    url.set_scheme(scheme)
        .map_err(|()| RealtimeError::InvalidUrl(format!("cannot use scheme {scheme}")))?;

    let path = format!("{}/ws", url.path().trim_end_matches('/'));
    url.set_path(&path);

    let mut query = url::form_urlencoded::Serializer::new(String::new());
    let _ = query
        .append_pair("token", params.token)
        .append_pair("format", params.format.as_param());
    if let Some(lang) = params.lang {
        let _ = query.append_pair("lang", lang);
    }
    let _ = query.append_pair("status", if params.appear_online { "true" } else { "false" });
    url.set_query(Some(&query.finish()));
    url.set_fragment(None);
    Ok(url)
}

/// Open a socket, bounded by `timeout`.
pub async fn dial(url: &Url, timeout: Duration) -> Result<WsStream> {
    debug!(host = url.host_str().unwrap_or_default(), "dialing");
    let (ws, _) = tokio::time::timeout(timeout, connect_async(url.as_str()))
        .await
        .map_err(|_| RealtimeError::Dial(format!("timed out after {}ms", timeout.as_millis())))?
        .map_err(|e| RealtimeError::Dial(e.to_string()))?;
    Ok(ws)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
