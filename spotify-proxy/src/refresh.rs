//! Background loop that keeps the shared client's access token valid.
//!
//! One iteration ([`TokenRefresher::tick`]):
//!
//! 1. No token installed: re-authenticate from the credential cache. On
//!    failure wait [`REINIT_INTERVAL`] and try again.
//! 2. Token expires within [`SAFETY_MARGIN`]: refresh it, up to
//!    [`REFRESH_ATTEMPTS`] tries with exponential backoff plus jitter. When
//!    every try fails, escalate to re-authentication. The loop never exits
//!    because of a failed refresh.
//! 3. Sleep `max(expires_at - now - SAFETY_MARGIN, SLEEP_FLOOR)`, recomputed
//!    every iteration.
//!
//! The new token is installed with a single swap on the client, so request
//! handlers reading it concurrently see either the old or the new token.

use chrono::Utc;
use rand::Rng;
use spotify_api::{CacheHandler, OAuth, SpotifyClient, TokenInfo};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Refresh once the token has less than this left.
pub const SAFETY_MARGIN: Duration = Duration::from_secs(5 * 60);

/// Never sleep shorter than this between iterations.
pub const SLEEP_FLOOR: Duration = Duration::from_secs(30);

/// Refresh tries before escalating to re-authentication.
pub const REFRESH_ATTEMPTS: u32 = 3;

/// Wait before the next iteration after a failed re-authentication.
pub const REINIT_INTERVAL: Duration = Duration::from_secs(30);

const REFRESH_BACKOFF_BASE: Duration = Duration::from_secs(1);
const MAX_JITTER_MS: u64 = 1000;

/// Where fresh tokens come from.
pub trait TokenSource: Send + Sync {
    /// Mint a new access token from `token`'s refresh token.
    fn refresh(&self, token: &TokenInfo) -> impl Future<Output = spotify_api::Result<TokenInfo>> + Send;

    /// Start over from persisted credentials.
    fn reauthenticate(&self) -> impl Future<Output = spotify_api::Result<TokenInfo>> + Send;
}

/// The accounts service, with tokens persisted to the credential cache.
#[derive(Debug, Clone)]
pub struct CachedOAuth {
    oauth: OAuth,
    cache: CacheHandler,
}

impl CachedOAuth {
    pub fn new(oauth: OAuth, cache: CacheHandler) -> Self {
        Self { oauth, cache }
    }
}

impl TokenSource for CachedOAuth {
    async fn refresh(&self, token: &TokenInfo) -> spotify_api::Result<TokenInfo> {
        let fresh = self.oauth.refresh(token).await?;
        self.cache.save(&fresh)?;
        Ok(fresh)
    }

    async fn reauthenticate(&self) -> spotify_api::Result<TokenInfo> {
        self.oauth.authenticate(&self.cache).await
    }
}

/// Sleep before the next check for a token expiring at `expires_at`.
pub fn sleep_duration(expires_at: i64, now: i64) -> Duration {
    let secs = expires_at - now - margin_secs();
    u64::try_from(secs)
        .map(Duration::from_secs)
        .unwrap_or(Duration::ZERO)
        .max(SLEEP_FLOOR)
}

#[allow(clippy::cast_possible_wrap)]
const fn margin_secs() -> i64 {
    SAFETY_MARGIN.as_secs() as i64
}

/// Delay after failed refresh attempt `attempt` (0-based).
fn refresh_backoff(attempt: u32) -> Duration {
    let jitter = rand::rng().random_range(0..=MAX_JITTER_MS);
    REFRESH_BACKOFF_BASE * 2u32.saturating_pow(attempt) + Duration::from_millis(jitter)
}

/// Owns the refresh side of the shared client.
pub struct TokenRefresher<S> {
    client: Arc<SpotifyClient>,
    source: S,
}

impl<S: TokenSource> TokenRefresher<S> {
    pub fn new(client: Arc<SpotifyClient>, source: S) -> Self {
        Self { client, source }
    }

    /// Run one iteration and return how long to sleep before the next.
    pub async fn tick(&self) -> Duration {
        let Some(token) = self.client.token() else {
            warn!("no token installed, re-authenticating");
            return self.reinitialize().await;
        };

        if token.seconds_left(Utc::now().timestamp()) >= margin_secs() {
            return sleep_duration(token.expires_at, Utc::now().timestamp());
        }

        match self.refresh_with_retries(&token).await {
            Some(fresh) => {
                let expires_at = fresh.expires_at;
                self.client.install_token(fresh);
                info!(expires_at, "access token refreshed");
                sleep_duration(expires_at, Utc::now().timestamp())
            }
            None => {
                error!("token refresh exhausted {REFRESH_ATTEMPTS} attempts, re-authenticating");
                self.reinitialize().await
            }
        }
    }

    async fn refresh_with_retries(&self, token: &TokenInfo) -> Option<TokenInfo> {
        for attempt in 0..REFRESH_ATTEMPTS {
            match self.source.refresh(token).await {
                Ok(fresh) => return Some(fresh),
                Err(e) => warn!(attempt = attempt + 1, error = %e, "token refresh failed"),
            }
            if attempt + 1 < REFRESH_ATTEMPTS {
                tokio::time::sleep(refresh_backoff(attempt)).await;
            }
        }
        None
    }

    async fn reinitialize(&self) -> Duration {
        match self.source.reauthenticate().await {
            Ok(token) => {
                let expires_at = token.expires_at;
                self.client.install_token(token);
                info!(expires_at, "re-authenticated from credential cache");
                sleep_duration(expires_at, Utc::now().timestamp())
            }
            Err(e) => {
                error!(error = %e, "re-authentication failed, retrying in {}s", REINIT_INTERVAL.as_secs());
                REINIT_INTERVAL
            }
        }
    }

    /// Loop until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        info!("token refresh loop started");
        loop {
            if cancel.is_cancelled() {
                break;
            }
            let wait = self.tick().await;
            debug!(secs = wait.as_secs(), "next token check scheduled");
            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(wait) => {}
            }
        }
        info!("token refresh loop stopped");
    }
}

impl<S: TokenSource + 'static> TokenRefresher<S> {
    /// Run the loop on its own task.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spotify_api::SpotifyError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct FakeSource {
        refresh_failures: AtomicU32,
        refresh_calls: AtomicU32,
        reauth_calls: AtomicU32,
        reauth_fails: bool,
    }

    impl FakeSource {
        fn failing_refresh(times: u32) -> Self {
            Self {
                refresh_failures: AtomicU32::new(times),
                ..Self::default()
            }
        }
    }

    impl TokenSource for Arc<FakeSource> {
        async fn refresh(&self, token: &TokenInfo) -> spotify_api::Result<TokenInfo> {
            self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            let left = self.refresh_failures.load(Ordering::SeqCst);
            if left > 0 {
                self.refresh_failures.store(left - 1, Ordering::SeqCst);
                return Err(SpotifyError::Auth("503: unavailable".into()));
            }
            Ok(TokenInfo::issued_now("refreshed".into(), token.refresh_token.clone(), String::new(), 3600))
        }

        async fn reauthenticate(&self) -> spotify_api::Result<TokenInfo> {
            self.reauth_calls.fetch_add(1, Ordering::SeqCst);
            if self.reauth_fails {
                return Err(SpotifyError::NotAuthenticated);
            }
            Ok(TokenInfo::issued_now("reauthenticated".into(), "r".into(), String::new(), 3600))
        }
    }

    fn refresher(token: Option<TokenInfo>, source: &Arc<FakeSource>) -> TokenRefresher<Arc<FakeSource>> {
        let client = SpotifyClient::new().unwrap();
        if let Some(token) = token {
            client.install_token(token);
        }
        TokenRefresher::new(Arc::new(client), Arc::clone(source))
    }

    fn token_expiring_in(secs: i64) -> TokenInfo {
        TokenInfo::issued_now("old".into(), "r".into(), String::new(), secs)
    }

    fn current(r: &TokenRefresher<Arc<FakeSource>>) -> String {
        r.client.token().unwrap().access_token.clone()
    }

    #[test]
    fn sleep_is_clamped_to_floor() {
        assert_eq!(sleep_duration(10_000, 0), Duration::from_secs(10_000 - 300));
        assert_eq!(sleep_duration(100, 0), SLEEP_FLOOR);
        assert_eq!(sleep_duration(0, 5_000), SLEEP_FLOOR);
    }

    #[test]
    fn backoff_grows_with_jitter() {
        for attempt in 0..3 {
            let base = Duration::from_secs(1 << attempt);
            let d = refresh_backoff(attempt);
            assert!(d >= base && d <= base + Duration::from_secs(1), "{d:?}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_token_is_left_alone() {
        let source = Arc::new(FakeSource::default());
        let r = refresher(Some(token_expiring_in(3600)), &source);
        let wait = r.tick().await;
        assert!(wait >= Duration::from_secs(3290) && wait <= Duration::from_secs(3300));
        assert_eq!(source.refresh_calls.load(Ordering::SeqCst), 0);
        assert_eq!(current(&r), "old");
    }

    #[tokio::test(start_paused = true)]
    async fn expiring_token_is_refreshed() {
        let source = Arc::new(FakeSource::failing_refresh(1));
        let r = refresher(Some(token_expiring_in(60)), &source);
        let wait = r.tick().await;
        assert!(wait >= Duration::from_secs(3290) && wait <= Duration::from_secs(3300), "{wait:?}");
        assert_eq!(source.refresh_calls.load(Ordering::SeqCst), 2);
        assert_eq!(source.reauth_calls.load(Ordering::SeqCst), 0);
        assert_eq!(current(&r), "refreshed");
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_refresh_escalates_to_reauthentication() {
        let source = Arc::new(FakeSource::failing_refresh(REFRESH_ATTEMPTS));
        let r = refresher(Some(token_expiring_in(60)), &source);
        r.tick().await;
        assert_eq!(source.refresh_calls.load(Ordering::SeqCst), REFRESH_ATTEMPTS);
        assert_eq!(source.reauth_calls.load(Ordering::SeqCst), 1);
        assert_eq!(current(&r), "reauthenticated");
    }

    #[tokio::test(start_paused = true)]
    async fn missing_token_reinitializes_and_waits_on_failure() {
        let source = Arc::new(FakeSource {
            reauth_fails: true,
            ..FakeSource::default()
        });
        let r = refresher(None, &source);
        assert_eq!(r.tick().await, REINIT_INTERVAL);
        assert_eq!(source.refresh_calls.load(Ordering::SeqCst), 0);
        assert!(r.client.token().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn loop_stops_on_cancel() {
        let source = Arc::new(FakeSource::default());
        let cancel = CancellationToken::new();
        let handle = refresher(Some(token_expiring_in(3600)), &source).spawn(cancel.clone());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!handle.is_finished());
        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_loop_never_ticks() {
        let source = Arc::new(FakeSource::default());
        let cancel = CancellationToken::new();
        cancel.cancel();
        refresher(None, &source).run(cancel).await;
        assert_eq!(source.reauth_calls.load(Ordering::SeqCst), 0);
    }
}
