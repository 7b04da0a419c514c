//! GitHub REST client
//!
//! One attempt per call, with every response classified into a
//! [`FetchError`] so the retry policy upstairs can tell transient failures
//! from terminal ones.

use super::{LanguageBytes, RepoSummary, UpstreamApi, Username};
use crate::config::Settings;
use crate::{FetchError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// How many repositories one listing call asks for
///
/// Wider than the default result limit, so sorting and truncation operate
/// on a meaningful candidate set.
pub const LISTING_WINDOW: u32 = 10;

/// Which entity a 404 on the request refers to
enum NotFound<'a> {
    User(&'a Username),
    Repo(&'a str),
}

impl NotFound<'_> {
    fn into_error(self) -> FetchError {
        match self {
            NotFound::User(username) => FetchError::UserNotFound {
                username: username.to_string(),
            },
            NotFound::Repo(full_name) => FetchError::RepoNotFound {
                repo: full_name.to_string(),
            },
        }
    }
}

/// Client for the GitHub REST API
pub struct GitHubClient {
    client: Client,
    base_url: String,
    token: String,
}

impl GitHubClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("repolens/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static("2022-11-28"));

        let client = Client::builder()
            .timeout(settings.api_timeout)
            .default_headers(headers)
            .build()
            .map_err(|error| {
                warn!(error = %error, "Failed to build HTTP client");
                FetchError::UnknownError { status: None }
            })?;

        Ok(Self {
            client,
            base_url: settings.api_base.trim_end_matches('/').to_string(),
            token: settings.github_token.clone(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: String,
        query: &[(&str, String)],
        not_found: NotFound<'_>,
    ) -> Result<T> {
        let response = self
            .client
            .get(&url)
            .query(query)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        match status {
            status if status.is_success() => response.json::<T>().await.map_err(|error| {
                // The request timeout also covers reading the body
                if error.is_timeout() {
                    return FetchError::UpstreamTimeout;
                }
                warn!(url = %url, error = %error, "Failed to decode upstream payload");
                FetchError::UnknownError {
                    status: Some(status.as_u16()),
                }
            }),
            StatusCode::NOT_FOUND => Err(not_found.into_error()),
            status => Err(classify_failure(status, response.headers())),
        }
    }
}

#[async_trait]
impl UpstreamApi for GitHubClient {
    async fn list_repositories(&self, username: &Username) -> Result<Vec<RepoSummary>> {
        debug!(user = %username, "Fetching repository listing");
        let url = format!("{}/users/{}/repos", self.base_url, username);
        let query = [
            ("sort", "pushed".to_string()),
            ("direction", "desc".to_string()),
            ("per_page", LISTING_WINDOW.to_string()),
        ];

        let summaries: Vec<RepoSummary> =
            self.get_json(url, &query, NotFound::User(username)).await?;
        debug!(
            user = %username,
            count = summaries.len(),
            "Repository listing fetched"
        );
        Ok(summaries)
    }

    async fn list_languages(&self, full_name: &str) -> Result<LanguageBytes> {
        debug!(repo = %full_name, "Fetching language breakdown");
        let url = format!("{}/repos/{}/languages", self.base_url, full_name);
        self.get_json(url, &[], NotFound::Repo(full_name)).await
    }
}

/// Map a non-success status to the matching error
fn classify_failure(status: StatusCode, headers: &HeaderMap) -> FetchError {
    if status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN && rate_limit_exhausted(headers))
    {
        return FetchError::RateLimited {
            reset_at: rate_limit_reset(headers),
        };
    }
    if status.is_server_error() {
        return FetchError::UpstreamError {
            status: status.as_u16(),
        };
    }
    FetchError::UnknownError {
        status: Some(status.as_u16()),
    }
}

/// GitHub signals quota exhaustion as 403 with a zeroed remaining header
fn rate_limit_exhausted(headers: &HeaderMap) -> bool {
    headers
        .get("x-ratelimit-remaining")
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim() == "0")
        .unwrap_or(false)
}

fn rate_limit_reset(headers: &HeaderMap) -> Option<DateTime<Utc>> {
    let epoch: i64 = headers
        .get("x-ratelimit-reset")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())?;
    DateTime::from_timestamp(epoch, 0)
}

fn classify_transport(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        return FetchError::UpstreamTimeout;
    }
    warn!(error = %error, "Transport failure");
    FetchError::UnknownError {
        status: error.status().map(|status| status.as_u16()),
    }
}
