use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::cache::token::AccessToken;

/// The cached bearer token and the instants that govern it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedCredential {
    pub token: AccessToken,
    /// completion time of the refresh + advertised lifetime
    pub expires_at: DateTime<Utc>,
    pub refresh_skew: Duration,
}

impl CachedCredential {
    pub fn new(
        token: AccessToken,
        issued_at: DateTime<Utc>,
        lifetime: Duration,
        refresh_skew: Duration,
    ) -> Self {
        Self {
            token,
            expires_at: add_saturating(issued_at, lifetime),
            refresh_skew,
        }
    }

    /// First instant at which the token must no longer be served.
    pub fn refresh_at(&self) -> DateTime<Utc> {
        TimeDelta::from_std(self.refresh_skew)
            .ok()
            .and_then(|skew| self.expires_at.checked_sub_signed(skew))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Check if token can be served without a refresh
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.refresh_at()
    }
}

fn add_saturating(at: DateTime<Utc>, by: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(by)
        .ok()
        .and_then(|by| at.checked_add_signed(by))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
