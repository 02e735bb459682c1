// tests/common/mod.rs
pub use axum::Router;
pub use tokio::task::JoinHandle;

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;

use crate::helpers::time::ManualClock;
use crate::sources::{IssuedToken, RefreshError, TokenSource};

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn build_reqwest_client() -> Client {
    Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .expect("reqwest client")
}

pub fn test_clock() -> ManualClock {
    ManualClock::new(DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap())
}

/// Token source answering from a script, counting every call.
#[derive(Clone, Default)]
pub struct ScriptedSource {
    calls: Arc<AtomicUsize>,
    script: Arc<Mutex<VecDeque<Result<IssuedToken, RefreshError>>>>,
    delay: Duration,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every fetch sleeps this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn push_ok(&self, token: &str, lifetime_seconds: u64) -> &Self {
        self.push(Ok(IssuedToken::new(token, Duration::from_secs(lifetime_seconds))))
    }

    pub fn push_err(&self, err: RefreshError) -> &Self {
        self.push(Err(err))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn push(&self, outcome: Result<IssuedToken, RefreshError>) -> &Self {
        self.script.lock().unwrap().push_back(outcome);
        self
    }
}

impl TokenSource for ScriptedSource {
    async fn fetch_token(&self) -> Result<IssuedToken, RefreshError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(RefreshError::Malformed("script exhausted".to_owned())))
    }
}
