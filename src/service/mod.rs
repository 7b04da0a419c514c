//! Recent-repository aggregation
//!
//! Validates the username, fetches the user's listing through the cached,
//! retrying pipeline, enriches every repository with its language
//! breakdown under a concurrency cap, then sorts and truncates.

use crate::cache::CacheStore;
use crate::config::Settings;
use crate::fetch::retry::RetryConfig;
use crate::fetch::ResilientFetcher;
use crate::github::{LanguageBytes, RepoSummary, Repository, UpstreamApi, Username};
use crate::Result;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

const REPOS_NAMESPACE: &str = "repos";
const LANGUAGES_NAMESPACE: &str = "languages";

/// The aggregation service behind every lookup
pub struct RepoService {
    upstream: Arc<dyn UpstreamApi>,
    repo_listings: ResilientFetcher<Vec<RepoSummary>>,
    language_breakdowns: ResilientFetcher<LanguageBytes>,
    language_concurrency: usize,
    default_limit: usize,
}

impl RepoService {
    pub fn new(upstream: Arc<dyn UpstreamApi>, settings: &Settings) -> Self {
        let retry = RetryConfig {
            max_retries: settings.max_retries,
            initial_backoff: settings.base_backoff,
            ..RetryConfig::default()
        };

        Self {
            upstream,
            repo_listings: ResilientFetcher::new(
                CacheStore::new(REPOS_NAMESPACE, settings.cache_ttl_repos),
                retry.clone(),
            ),
            language_breakdowns: ResilientFetcher::new(
                CacheStore::new(LANGUAGES_NAMESPACE, settings.cache_ttl_languages),
                retry,
            ),
            language_concurrency: settings.language_concurrency,
            default_limit: settings.result_limit,
        }
    }

    /// A user's most recently pushed repositories, enriched and sorted
    ///
    /// Returns the `limit` most recent (the configured default when `None`),
    /// newest push first, never-pushed repositories last, ties broken by
    /// name. A failed language lookup degrades that repository to an empty
    /// breakdown instead of failing the whole call.
    pub async fn list_recent_repositories(
        &self,
        username: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Repository>> {
        let username = Username::parse(username)?;
        let limit = limit.unwrap_or(self.default_limit);
        info!(user = %username, limit, "Listing recent repositories");

        let summaries = self.fetch_listing(&username).await?;
        let mut breakdowns = self.fetch_breakdowns(&summaries).await;

        let mut repositories: Vec<Repository> = summaries
            .into_iter()
            .map(|summary| {
                let languages = breakdowns.remove(&summary.full_name).unwrap_or_default();
                Repository::from_parts(summary, &languages)
            })
            .collect();

        repositories.sort_by(|a, b| {
            b.pushed_at
                .cmp(&a.pushed_at)
                .then_with(|| a.name.cmp(&b.name))
        });
        repositories.truncate(limit);

        info!(
            user = %username,
            returned = repositories.len(),
            "Aggregation complete"
        );
        Ok(repositories)
    }

    async fn fetch_listing(&self, username: &Username) -> Result<Vec<RepoSummary>> {
        let upstream = Arc::clone(&self.upstream);
        let user = username.clone();
        self.repo_listings
            .fetch(username.as_str(), move || {
                let upstream = Arc::clone(&upstream);
                let user = user.clone();
                async move { upstream.list_repositories(&user).await }
            })
            .await
    }

    /// Language breakdowns for every listed repository
    ///
    /// Lookups run concurrently under the configured cap. Failures are
    /// logged and dropped; a missing entry means an empty breakdown.
    async fn fetch_breakdowns(&self, summaries: &[RepoSummary]) -> HashMap<String, LanguageBytes> {
        // Lookup futures own their keys; mapping them off borrowed summaries
        // makes the aggregate future fail the trait check under tokio::spawn.
        let full_names: Vec<String> = summaries
            .iter()
            .map(|summary| summary.full_name.clone())
            .collect();

        let lookups = full_names.into_iter().map(|full_name| async move {
            let outcome = self.fetch_languages(&full_name).await;
            (full_name, outcome)
        });

        let results: Vec<(String, Result<LanguageBytes>)> = stream::iter(lookups)
            .buffer_unordered(self.language_concurrency)
            .collect()
            .await;

        let mut breakdowns = HashMap::new();
        for (full_name, outcome) in results {
            match outcome {
                Ok(languages) => {
                    breakdowns.insert(full_name, languages);
                }
                Err(error) => {
                    warn!(
                        repo = %full_name,
                        error = %error,
                        "Language lookup failed, serving empty breakdown"
                    );
                }
            }
        }
        breakdowns
    }

    async fn fetch_languages(&self, full_name: &str) -> Result<LanguageBytes> {
        let upstream = Arc::clone(&self.upstream);
        let repo = full_name.to_string();
        self.language_breakdowns
            .fetch(full_name, move || {
                let upstream = Arc::clone(&upstream);
                let repo = repo.clone();
                async move { upstream.list_languages(&repo).await }
            })
            .await
    }
}
