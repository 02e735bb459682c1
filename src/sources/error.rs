use std::time::Duration;

use thiserror::Error;

/// Why a refresh did not produce a token.
///
/// Cloneable so one failed refresh can be reported to every caller that was
/// waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    #[error("token endpoint request failed: {0}")]
    Transport(String),

    #[error("token endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed token response: {0}")]
    Malformed(String),

    #[error("token refresh timed out after {0:?}")]
    Timeout(Duration),

    #[error("token refresh task aborted: {0}")]
    Aborted(String),
}

impl RefreshError {
    /// Errors worth another attempt within the same refresh.
    pub fn is_transient(&self) -> bool {
        match self {
            RefreshError::Transport(_) | RefreshError::Timeout(_) => true,
            RefreshError::Status { status, .. } => *status >= 500 || *status == 429,
            RefreshError::Malformed(_) | RefreshError::Aborted(_) => false,
        }
    }

    /// Short label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            RefreshError::Transport(_) => "transport",
            RefreshError::Status { .. } => "status",
            RefreshError::Malformed(_) => "malformed",
            RefreshError::Timeout(_) => "timeout",
            RefreshError::Aborted(_) => "aborted",
        }
    }
}

impl From<reqwest::Error> for RefreshError {
    fn from(err: reqwest::Error) -> Self {
        RefreshError::Transport(err.to_string())
    }
}
