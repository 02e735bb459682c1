//! Bearer token cache with coalesced refresh.
//!
//! `get_token` serves the cached token while `now < expires_at - refresh_skew`.
//! Otherwise it joins the refresh already in flight, or starts one. The refresh
//! runs on its own task so callers that give up do not cancel it for the rest,
//! and every caller attached to it observes the same token or the same error.

use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::cache::credential::CachedCredential;
use crate::cache::token::AccessToken;
use crate::helpers::time::{get_instant, Clock, SystemClock};
use crate::observability::metrics::get_metrics;
use crate::resilience::retry::RetrySettings;
use crate::sources::{IssuedToken, RefreshError, TokenSource};

pub const REFRESH_SKEW_SECONDS_DEFAULT: u64 = 60;
pub const REFRESH_TIMEOUT_MS_DEFAULT: u64 = 30_000;

type RefreshOutcome = Result<CachedCredential, RefreshError>;
type InFlightRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    /// margin subtracted from the advertised lifetime
    pub refresh_skew: Duration,
    /// upper bound for one refresh, retries included
    pub refresh_timeout: Duration,
    pub retry: RetrySettings,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            refresh_skew: Duration::from_secs(REFRESH_SKEW_SECONDS_DEFAULT),
            refresh_timeout: Duration::from_millis(REFRESH_TIMEOUT_MS_DEFAULT),
            retry: RetrySettings::default(),
        }
    }
}

#[derive(Default)]
struct CacheState {
    credential: Option<CachedCredential>,
    in_flight: Option<InFlightRefresh>,
}

struct Inner<S, C> {
    source: S,
    clock: C,
    settings: CacheSettings,
    state: Mutex<CacheState>,
}

/// Process-wide token cache. Clones share the same credential.
pub struct TokenCache<S, C = SystemClock> {
    inner: Arc<Inner<S, C>>,
}

impl<S, C> Clone for TokenCache<S, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: TokenSource> TokenCache<S, SystemClock> {
    pub fn new(source: S, settings: CacheSettings) -> Self {
        Self::with_clock(source, settings, SystemClock)
    }
}

impl<S: TokenSource, C: Clock> TokenCache<S, C> {
    pub fn with_clock(source: S, settings: CacheSettings, clock: C) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                clock,
                settings,
                state: Mutex::new(CacheState::default()),
            }),
        }
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.inner.settings
    }

    /// Return a token valid for at least `refresh_skew`, refreshing if needed.
    pub async fn get_token(&self) -> Result<AccessToken, RefreshError> {
        let metrics = get_metrics().await;

        let refresh = {
            let mut state = self.inner.state.lock().await;

            if let Some(credential) = state.credential.as_ref() {
                if credential.is_fresh(self.inner.clock.now()) {
                    debug!("using cached token");
                    metrics.token_cache_hits.inc();
                    return Ok(credential.token.clone());
                }
            }

            match state.in_flight.as_ref() {
                Some(in_flight) => {
                    debug!("joining in-flight token refresh");
                    in_flight.clone()
                }
                None => {
                    let in_flight = self.spawn_refresh();
                    state.in_flight = Some(in_flight.clone());
                    in_flight
                }
            }
        };

        refresh.await.map(|credential| credential.token)
    }

    /// Snapshot of the stored credential, fresh or not.
    pub async fn current(&self) -> Option<CachedCredential> {
        self.inner.state.lock().await.credential.clone()
    }

    /// Drop the stored credential if it still holds `rejected`.
    ///
    /// Returns whether anything was dropped. A token stored by a later refresh
    /// is left alone.
    pub async fn invalidate(&self, rejected: &AccessToken) -> bool {
        let mut state = self.inner.state.lock().await;
        match state.credential.as_ref() {
            Some(credential) if &credential.token == rejected => {
                info!("dropping cached token rejected by upstream");
                state.credential = None;
                true
            }
            _ => false,
        }
    }

    fn spawn_refresh(&self) -> InFlightRefresh {
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move { inner.refresh().await });

        let inner = Arc::clone(&self.inner);
        async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(join_err) => {
                    error!("token refresh task failed: {}", join_err);
                    inner.state.lock().await.in_flight = None;
                    Err(RefreshError::Aborted(join_err.to_string()))
                }
            }
        }
        .boxed()
        .shared()
    }
}

impl<S: TokenSource, C: Clock> Inner<S, C> {
    async fn refresh(&self) -> RefreshOutcome {
        let metrics = get_metrics().await;
        let start = get_instant();
        info!("fetching new token");

        let timeout = self.settings.refresh_timeout;
        let fetched = tokio::time::timeout(timeout, self.fetch_with_retry())
            .await
            .unwrap_or(Err(RefreshError::Timeout(timeout)));
        metrics.token_refresh_duration.observe(start.elapsed().as_secs_f64());

        let mut state = self.state.lock().await;
        state.in_flight = None;

        match fetched {
            Ok(issued) => {
                if issued.expires_in <= self.settings.refresh_skew {
                    warn!(
                        "token lifetime {:?} does not exceed refresh skew {:?}, it will be refreshed on every use",
                        issued.expires_in, self.settings.refresh_skew
                    );
                }
                let credential = CachedCredential::new(
                    issued.access_token,
                    self.clock.now(),
                    issued.expires_in,
                    self.settings.refresh_skew,
                );
                info!(expires_at = %credential.expires_at, "token refreshed");
                metrics.token_refreshes.with_label_values(&["success"]).inc();
                metrics.token_expiry_unix.set(credential.expires_at.timestamp());

                state.credential = Some(credential.clone());
                Ok(credential)
            }
            Err(err) => {
                warn!(reason = err.reason(), "failed to refresh token: {}", err);
                metrics.token_refreshes.with_label_values(&[err.reason()]).inc();
                Err(err)
            }
        }
    }

    async fn fetch_with_retry(&self) -> Result<IssuedToken, RefreshError> {
        self.settings
            .retry
            .run_with_retry(|| self.source.fetch_token(), RefreshError::is_transient)
            .await
    }
}
