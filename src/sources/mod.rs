//! Token sources
//!
//! A source performs exactly one grant against an authority and reports the
//! issued token with its advertised lifetime. Caching and coalescing live in
//! `crate::cache`.

use std::future::Future;
use std::time::Duration;

use crate::cache::token::AccessToken;

pub mod error;
pub mod oauth2;

pub use error::RefreshError;

/// Lifetime assumed when the authority omits `expires_in`.
pub const DEFAULT_TOKEN_LIFETIME_SECONDS: u64 = 3600;

/// A freshly issued token as reported by the authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub access_token: AccessToken,
    pub expires_in: Duration,
}

impl IssuedToken {
    pub fn new(access_token: impl Into<AccessToken>, expires_in: Duration) -> Self {
        Self {
            access_token: access_token.into(),
            expires_in,
        }
    }
}

pub trait TokenSource: Send + Sync + 'static {
    /// Request a new token from the authority. One call is one upstream request.
    fn fetch_token(&self) -> impl Future<Output = Result<IssuedToken, RefreshError>> + Send;
}
