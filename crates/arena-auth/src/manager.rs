//! Session lifecycle: start, expiry checks, refresh, logout.

use std::fmt;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use arena_core::{Clock, SystemClock};
use arena_settings::ArenaSettings;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::api::{Credential, HttpSessionApi, SessionApi};
use crate::errors::{Result, SessionError};
use crate::session::{Session, TokenPair};

/// Owns the current session and keeps it fresh.
///
/// Reads (expiry checks, token lookups) take the shared lock; `start` and
/// `clear` take it exclusively. Refreshes are serialized by an async mutex
/// so concurrent callers share one round trip.
pub struct SessionManager {
    api: Arc<dyn SessionApi>,
    clock: Arc<dyn Clock>,
    base_url: String,
    grace: Duration,
    auto_refresh: bool,
    state: RwLock<Option<Session>>,
    refresh_lock: tokio::sync::Mutex<()>,
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("base_url", &self.base_url)
            .field("grace", &self.grace)
            .field("auto_refresh", &self.auto_refresh)
            .field("has_session", &self.state.read().is_some())
            .finish_non_exhaustive()
    }
}

fn grace_from_secs(secs: u64) -> Duration {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

impl SessionManager {
    /// Create a manager with no session, using the system clock.
    pub fn new(api: Arc<dyn SessionApi>, grace_secs: u64) -> Self {
        Self {
            api,
            clock: Arc::new(SystemClock),
            base_url: String::new(),
            grace: grace_from_secs(grace_secs),
            auto_refresh: true,
            state: RwLock::new(None),
            refresh_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Build a manager over HTTP from loaded settings.
    pub fn from_settings(settings: &ArenaSettings) -> Result<Self> {
        let client = &settings.client;
        let api = HttpSessionApi::with_timeout(
            client.base_url.clone(),
            client.server_key.clone(),
            StdDuration::from_millis(client.request_timeout_ms),
        )?;
        Ok(Self::new(Arc::new(api), client.expiry_grace_secs)
            .with_base_url(client.base_url.clone())
            .with_auto_refresh(client.auto_refresh))
    }

    /// Record the backend's base HTTP address.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Replace the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Whether [`current_token`](Self::current_token) refreshes first.
    #[must_use]
    pub fn with_auto_refresh(mut self, enabled: bool) -> Self {
        self.auto_refresh = enabled;
        self
    }

    /// Base HTTP address of the backend, empty if unknown.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Grace period subtracted from each expiry.
    pub fn grace(&self) -> Duration {
        self.grace
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Validate and store a token pair, replacing any previous session.
    pub fn start(&self, tokens: TokenPair) -> Result<()> {
        let session = Session::new(tokens, self.grace, self.now())?;
        debug!(
            user_id = session.user_id(),
            access_expiry = %session.access_expiry().at,
            "session started"
        );
        *self.state.write() = Some(session);
        Ok(())
    }

    /// Authenticate with the server and start the resulting session.
    pub async fn authenticate(
        &self,
        credential: &Credential,
        create: bool,
        username: Option<&str>,
    ) -> Result<()> {
        let tokens = self.api.authenticate(credential, create, username).await?;
        self.start(tokens)
    }

    /// Snapshot of the stored session.
    pub fn session(&self) -> Option<Session> {
        self.state.read().clone()
    }

    /// True without a session or once the access token's grace-adjusted
    /// expiry has passed.
    pub fn is_access_expired(&self) -> bool {
        let now = self.now();
        self.state
            .read()
            .as_ref()
            .is_none_or(|s| s.access_expiry().is_expired(now))
    }

    /// True without a session or once the refresh token's grace-adjusted
    /// expiry has passed.
    pub fn is_refresh_expired(&self) -> bool {
        let now = self.now();
        self.state
            .read()
            .as_ref()
            .is_none_or(|s| s.refresh_expiry().is_expired(now))
    }

    /// Raw access token expiry.
    pub fn session_expiry(&self) -> Option<DateTime<Utc>> {
        self.state.read().as_ref().map(|s| s.access_expiry().at)
    }

    /// Alias for [`is_access_expired`](Self::is_access_expired).
    pub fn session_expired(&self) -> bool {
        self.is_access_expired()
    }

    /// Refresh the session if the access token is expired.
    pub async fn refresh(&self) -> Result<()> {
        if !self.is_access_expired() {
            return Ok(());
        }
        let _guard = self.refresh_lock.lock().await;
        // Another caller may have refreshed while we waited.
        if !self.is_access_expired() {
            return Ok(());
        }
        let (refresh_token, vars) = {
            let state = self.state.read();
            let Some(session) = state.as_ref() else {
                return Err(SessionError::InvalidSession("no session".into()));
            };
            (session.refresh_token().to_string(), session.vars().clone())
        };
        if self.is_refresh_expired() {
            return Err(SessionError::RefreshExpired);
        }
        info!("access token expired, refreshing session");
        let tokens = self.api.refresh(&refresh_token, &vars).await?;
        self.start(tokens)
    }

    /// Tell the server to invalidate the session, then drop it locally.
    ///
    /// The server call is best effort; local state is cleared regardless.
    pub async fn logout(&self) -> Result<()> {
        let tokens = self.state.read().as_ref().map(|s| s.tokens().clone());
        if let Some(tokens) = tokens {
            if let Err(e) = self.api.logout(&tokens.token, &tokens.refresh_token).await {
                warn!(error = %e, "server logout failed, clearing session anyway");
            }
        }
        self.clear();
        Ok(())
    }

    /// Drop the session without contacting the server.
    pub fn clear(&self) {
        if self.state.write().take().is_some() {
            debug!("session cleared");
        }
    }

    /// Access token, refreshing first when auto-refresh is on.
    pub async fn current_token(&self) -> Result<String> {
        if self.auto_refresh {
            self.refresh().await?;
        }
        self.state
            .read()
            .as_ref()
            .map(|s| s.access_token().to_string())
            .ok_or_else(|| SessionError::InvalidSession("no session".into()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use arena_core::ManualClock;
    use assert_matches::assert_matches;
    use async_trait::async_trait;

    use super::*;
    use crate::session::tests::{pair_expiring_in, token_expiring_at};

    /// Issues fresh pairs relative to a shared clock and counts calls.
    struct FakeApi {
        clock: Arc<ManualClock>,
        refreshes: AtomicUsize,
        logouts: AtomicUsize,
        fail_logout: bool,
        delay: StdDuration,
    }

    impl FakeApi {
        fn new(clock: Arc<ManualClock>) -> Self {
            Self {
                clock,
                refreshes: AtomicUsize::new(0),
                logouts: AtomicUsize::new(0),
                fail_logout: false,
                delay: StdDuration::ZERO,
            }
        }

        fn fresh_pair(&self) -> TokenPair {
            pair_expiring_in(self.clock.now(), Duration::hours(1), Duration::days(7))
        }
    }

    #[async_trait]
    impl SessionApi for FakeApi {
        async fn refresh(&self, _: &str, _: &HashMap<String, String>) -> Result<TokenPair> {
            let _ = self.refreshes.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(self.fresh_pair())
        }

        async fn logout(&self, _: &str, _: &str) -> Result<()> {
            let _ = self.logouts.fetch_add(1, Ordering::SeqCst);
            if self.fail_logout {
                return Err(SessionError::Http("connection refused".into()));
            }
            Ok(())
        }

        async fn authenticate(&self, _: &Credential, _: bool, _: Option<&str>) -> Result<TokenPair> {
            Ok(self.fresh_pair())
        }
    }

    fn manager(api: &Arc<FakeApi>, grace_secs: u64) -> SessionManager {
        SessionManager::new(api.clone(), grace_secs).with_clock(api.clock.clone())
    }

    #[test]
    fn no_session_is_expired() {
        let api = Arc::new(FakeApi::new(ManualClock::starting_now()));
        let mgr = manager(&api, 5);
        assert!(mgr.is_access_expired());
        assert!(mgr.is_refresh_expired());
        assert!(mgr.session_expiry().is_none());
    }

    #[test]
    fn start_then_fast_forward_past_grace() {
        let clock = ManualClock::starting_now();
        let api = Arc::new(FakeApi::new(clock.clone()));
        let mgr = manager(&api, 5);
        mgr.start(pair_expiring_in(clock.now(), Duration::seconds(60), Duration::days(1)))
            .unwrap();
        assert!(!mgr.is_access_expired());

        clock.advance(Duration::seconds(54));
        assert!(!mgr.is_access_expired());
        clock.advance(Duration::seconds(1));
        assert!(mgr.is_access_expired());
        assert!(!mgr.is_refresh_expired());
    }

    #[test]
    fn session_expiry_matches_exp_claim() {
        let clock = ManualClock::starting_now();
        let api = Arc::new(FakeApi::new(clock.clone()));
        let mgr = manager(&api, 5);
        let now = clock.now();
        mgr.start(pair_expiring_in(now, Duration::seconds(3600), Duration::days(1)))
            .unwrap();

        let expiry = mgr.session_expiry().unwrap();
        let delta = (expiry - (now + Duration::seconds(3600))).num_seconds().abs();
        assert!(delta <= 1, "expiry off by {delta}s");
        assert!(!mgr.session_expired());
    }

    #[test]
    fn failed_start_keeps_previous_session() {
        let clock = ManualClock::starting_now();
        let api = Arc::new(FakeApi::new(clock.clone()));
        let mgr = manager(&api, 0);
        mgr.start(api.fresh_pair()).unwrap();
        let before = mgr.session();

        let err = mgr.start(TokenPair::new("bad", "worse")).unwrap_err();
        assert_matches!(err, SessionError::InvalidSession(_));
        assert_eq!(mgr.session(), before);
    }

    #[tokio::test]
    async fn refresh_is_noop_while_valid() {
        let clock = ManualClock::starting_now();
        let api = Arc::new(FakeApi::new(clock.clone()));
        let mgr = manager(&api, 5);
        mgr.start(api.fresh_pair()).unwrap();

        mgr.refresh().await.unwrap();
        assert_eq!(api.refreshes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn refresh_replaces_expired_session() {
        let clock = ManualClock::starting_now();
        let api = Arc::new(FakeApi::new(clock.clone()));
        let mgr = manager(&api, 5);
        mgr.start(api.fresh_pair()).unwrap();
        let old_expiry = mgr.session_expiry().unwrap();

        clock.advance(Duration::hours(2));
        assert!(mgr.is_access_expired());
        mgr.refresh().await.unwrap();

        assert_eq!(api.refreshes.load(Ordering::SeqCst), 1);
        assert!(!mgr.is_access_expired());
        assert!(mgr.session_expiry().unwrap() > old_expiry);
    }

    #[tokio::test]
    async fn refresh_fails_when_refresh_token_expired() {
        let clock = ManualClock::starting_now();
        let api = Arc::new(FakeApi::new(clock.clone()));
        let mgr = manager(&api, 5);
        mgr.start(pair_expiring_in(clock.now(), Duration::hours(1), Duration::hours(2)))
            .unwrap();

        clock.advance(Duration::hours(3));
        assert_matches!(mgr.refresh().await, Err(SessionError::RefreshExpired));
        assert_eq!(api.refreshes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn refresh_without_session_is_invalid() {
        let api = Arc::new(FakeApi::new(ManualClock::starting_now()));
        let mgr = manager(&api, 5);
        assert_matches!(mgr.refresh().await, Err(SessionError::InvalidSession(_)));
    }

    #[tokio::test]
    async fn concurrent_refreshes_share_one_call() {
        let clock = ManualClock::starting_now();
        let mut fake = FakeApi::new(clock.clone());
        fake.delay = StdDuration::from_millis(50);
        let api = Arc::new(fake);
        let mgr = manager(&api, 5);
        mgr.start(api.fresh_pair()).unwrap();
        clock.advance(Duration::hours(2));

        let (a, b, c) = tokio::join!(mgr.refresh(), mgr.refresh(), mgr.refresh());
        a.unwrap();
        b.unwrap();
        c.unwrap();
        assert_eq!(api.refreshes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn current_token_refreshes_when_enabled() {
        let clock = ManualClock::starting_now();
        let api = Arc::new(FakeApi::new(clock.clone()));
        let mgr = manager(&api, 5);
        mgr.start(api.fresh_pair()).unwrap();
        let first = mgr.current_token().await.unwrap();

        clock.advance(Duration::hours(2));
        let second = mgr.current_token().await.unwrap();
        assert_ne!(first, second);
        assert_eq!(api.refreshes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn current_token_without_auto_refresh_returns_stale_token() {
        let clock = ManualClock::starting_now();
        let api = Arc::new(FakeApi::new(clock.clone()));
        let mgr = manager(&api, 5).with_auto_refresh(false);
        mgr.start(api.fresh_pair()).unwrap();
        let first = mgr.current_token().await.unwrap();

        clock.advance(Duration::hours(2));
        assert_eq!(mgr.current_token().await.unwrap(), first);
        assert_eq!(api.refreshes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn current_token_without_session() {
        let api = Arc::new(FakeApi::new(ManualClock::starting_now()));
        let mgr = manager(&api, 5).with_auto_refresh(false);
        assert_matches!(
            mgr.current_token().await,
            Err(SessionError::InvalidSession(_))
        );
    }

    #[tokio::test]
    async fn logout_clears_even_when_server_fails() {
        let clock = ManualClock::starting_now();
        let mut fake = FakeApi::new(clock.clone());
        fake.fail_logout = true;
        let api = Arc::new(fake);
        let mgr = manager(&api, 5);
        mgr.start(api.fresh_pair()).unwrap();

        mgr.logout().await.unwrap();
        assert_eq!(api.logouts.load(Ordering::SeqCst), 1);
        assert!(mgr.session().is_none());
        assert!(mgr.is_access_expired());
    }

    #[tokio::test]
    async fn logout_without_session_skips_server() {
        let api = Arc::new(FakeApi::new(ManualClock::starting_now()));
        let mgr = manager(&api, 5);
        mgr.logout().await.unwrap();
        assert_eq!(api.logouts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn authenticate_starts_session() {
        let api = Arc::new(FakeApi::new(ManualClock::starting_now()));
        let mgr = manager(&api, 5);
        mgr.authenticate(&Credential::Device("d".into()), true, None)
            .await
            .unwrap();
        assert_eq!(mgr.session().unwrap().username(), "player");
    }

    #[test]
    fn clear_drops_session() {
        let clock = ManualClock::starting_now();
        let api = Arc::new(FakeApi::new(clock.clone()));
        let mgr = manager(&api, 5);
        mgr.start(TokenPair::new(
            token_expiring_at(clock.now() + Duration::hours(1)),
            token_expiring_at(clock.now() + Duration::days(1)),
        ))
        .unwrap();
        mgr.clear();
        assert!(mgr.session().is_none());
    }

    #[test]
    fn from_settings_uses_client_section() {
        let mut settings = ArenaSettings::default();
        settings.client.expiry_grace_secs = 42;
        settings.client.auto_refresh = false;
        let mgr = SessionManager::from_settings(&settings).unwrap();
        assert_eq!(mgr.grace(), Duration::seconds(42));
        assert_eq!(mgr.base_url(), "http://127.0.0.1:7350");
        assert!(!mgr.auto_refresh);
    }

    #[test]
    fn huge_grace_saturates() {
        assert_eq!(grace_from_secs(u64::MAX), Duration::MAX);
    }
}
