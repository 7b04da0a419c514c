//! GitHub upstream integration
//!
//! The REST client, the payload types it decodes, and username validation.
//! Everything above this module talks to GitHub through the [`UpstreamApi`]
//! trait, so tests can swap in a scripted upstream.

mod client;
mod types;
mod username;

pub use client::{GitHubClient, LISTING_WINDOW};
pub use types::{language_percentages, LanguageBytes, RepoSummary, Repository};
pub use username::Username;

use crate::Result;
use async_trait::async_trait;

/// Upstream endpoints the service depends on
///
/// One method per endpoint. Implementations perform a single attempt and
/// classify the outcome; retries and caching live in the layers above.
#[async_trait]
pub trait UpstreamApi: Send + Sync {
    /// List a user's repositories, most recently pushed first
    async fn list_repositories(&self, username: &Username) -> Result<Vec<RepoSummary>>;

    /// Byte counts per language for one repository
    async fn list_languages(&self, full_name: &str) -> Result<LanguageBytes>;
}
