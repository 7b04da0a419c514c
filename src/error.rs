//! Error types for RepoLens
//!
//! Defines the caller-facing outcome taxonomy for fetch operations.
//! Uses thiserror for ergonomic error handling.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type alias for RepoLens operations
pub type Result<T> = std::result::Result<T, FetchError>;

/// Caller-facing classification of a fetch outcome
///
/// Variants are `Clone` because one upstream outcome fans out to every
/// caller waiting on the same in-flight cache population.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Username rejected before any network call
    #[error("Invalid username: {reason}")]
    InvalidUsername { reason: String },

    /// Upstream has no such user
    #[error("User not found: {username}")]
    UserNotFound { username: String },

    /// Upstream has no such repository
    #[error("Repository not found: {repo}")]
    RepoNotFound { repo: String },

    /// Upstream rate limit exhausted
    #[error("Rate limited by upstream{}", reset_suffix(.reset_at))]
    RateLimited { reset_at: Option<DateTime<Utc>> },

    /// Upstream request exceeded the configured timeout
    #[error("Upstream request timed out")]
    UpstreamTimeout,

    /// Upstream returned a server error
    #[error("Upstream error: HTTP {status}")]
    UpstreamError { status: u16 },

    /// Anything the classifier does not recognize
    #[error("Unexpected upstream response{}", status_suffix(.status))]
    UnknownError { status: Option<u16> },
}

fn reset_suffix(reset_at: &Option<DateTime<Utc>>) -> String {
    match reset_at {
        Some(at) => format!(" (resets at {})", at.to_rfc3339()),
        None => String::new(),
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(": HTTP {}", code),
        None => String::new(),
    }
}

impl crate::fetch::retry::RetryableError for FetchError {
    fn retry_decision(&self) -> crate::fetch::retry::RetryDecision {
        use crate::fetch::retry::RetryDecision;

        match self {
            // Transient upstream failures
            FetchError::UpstreamTimeout => RetryDecision::Retry,
            FetchError::UpstreamError { .. } => RetryDecision::Retry,
            // Terminal outcomes
            FetchError::InvalidUsername { .. } => RetryDecision::NoRetry,
            FetchError::UserNotFound { .. } => RetryDecision::NoRetry,
            FetchError::RepoNotFound { .. } => RetryDecision::NoRetry,
            FetchError::RateLimited { .. } => RetryDecision::NoRetry,
            FetchError::UnknownError { .. } => RetryDecision::NoRetry,
        }
    }
}
