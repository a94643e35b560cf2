//! Session model and token claim parsing.

use std::collections::HashMap;

use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SessionError};

/// Access and refresh token as issued by the server.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Access token.
    pub token: String,
    /// Refresh token.
    #[serde(default)]
    pub refresh_token: String,
}

impl TokenPair {
    /// Bundle a token pair.
    pub fn new(token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

/// Claims carried in a token's payload segment.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Claims {
    /// Expiry in unix seconds.
    #[serde(default)]
    pub exp: i64,
    /// User id.
    #[serde(default)]
    pub uid: String,
    /// Username.
    #[serde(default)]
    pub usn: String,
    /// Session variables.
    #[serde(default)]
    pub vrs: HashMap<String, String>,
}

/// Decode the payload segment of a three-part token.
pub fn parse_claims(token: &str) -> Result<Claims> {
    if token.is_empty() {
        return Err(SessionError::InvalidSession("empty token".into()));
    }
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(SessionError::InvalidSession(format!(
            "token has {} parts, expected 3",
            parts.len()
        )));
    }
    let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(parts[1].trim_end_matches('='))
        .map_err(|e| SessionError::InvalidSession(format!("undecodable token payload: {e}")))?;
    serde_json::from_slice(&payload)
        .map_err(|e| SessionError::InvalidSession(format!("unparseable token claims: {e}")))
}

/// Raw expiry and grace-adjusted expiry of one token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Expiry {
    /// The `exp` claim.
    pub at: DateTime<Utc>,
    /// `exp` minus the grace period.
    pub with_grace: DateTime<Utc>,
}

impl Expiry {
    fn from_claims(claims: &Claims, grace: Duration, which: &str) -> Result<Self> {
        if claims.exp == 0 {
            return Err(SessionError::InvalidSession(format!(
                "{which} token has no exp claim"
            )));
        }
        let at = DateTime::from_timestamp(claims.exp, 0).ok_or_else(|| {
            SessionError::InvalidSession(format!("{which} token exp out of range"))
        })?;
        let with_grace = at.checked_sub_signed(grace).unwrap_or(DateTime::<Utc>::MIN_UTC);
        Ok(Self { at, with_grace })
    }

    /// Whether `now` has reached the grace-adjusted expiry.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.with_grace
    }
}

/// An accepted session: both tokens plus their derived expiries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    tokens: TokenPair,
    access: Expiry,
    refresh: Expiry,
    user_id: String,
    username: String,
    vars: HashMap<String, String>,
}

impl Session {
    /// Validate a token pair at `now`.
    ///
    /// Both tokens must parse and carry a non-zero `exp`, and neither may be
    /// expired once the grace period is taken into account.
    pub fn new(tokens: TokenPair, grace: Duration, now: DateTime<Utc>) -> Result<Self> {
        let access_claims = parse_claims(&tokens.token)?;
        let refresh_claims = parse_claims(&tokens.refresh_token)?;
        let access = Expiry::from_claims(&access_claims, grace, "access")?;
        let refresh = Expiry::from_claims(&refresh_claims, grace, "refresh")?;
        if access.is_expired(now) || refresh.is_expired(now) {
            return Err(SessionError::ExpiredSession);
        }
        Ok(Self {
            tokens,
            access,
            refresh,
            user_id: access_claims.uid,
            username: access_claims.usn,
            vars: access_claims.vrs,
        })
    }

    /// Access token.
    pub fn access_token(&self) -> &str {
        &self.tokens.token
    }

    /// Refresh token.
    pub fn refresh_token(&self) -> &str {
        &self.tokens.refresh_token
    }

    /// Both tokens.
    pub fn tokens(&self) -> &TokenPair {
        &self.tokens
    }

    /// Access token expiry.
    pub fn access_expiry(&self) -> Expiry {
        self.access
    }

    /// Refresh token expiry.
    pub fn refresh_expiry(&self) -> Expiry {
        self.refresh
    }

    /// User id from the `uid` claim.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Username from the `usn` claim.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Session variables from the `vrs` claim.
    pub fn vars(&self) -> &HashMap<String, String> {
        &self.vars
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
