//! Runtime configuration
//!
//! Settings come from environment variables, with a `.env` file picked up
//! when present. Parsing and range checking are separate steps: `from_env`
//! fails fast on unparseable values, `validate` reports every out-of-range
//! value at once.

mod validation;

pub use validation::{ValidationError, ValidationResult};

use anyhow::Context;
use std::env;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Service settings resolved from the environment
#[derive(Debug, Clone)]
pub struct Settings {
    /// Token sent as a bearer credential on every upstream call
    pub github_token: String,
    /// Base URL of the GitHub API
    pub api_base: String,
    /// Per-request timeout
    pub api_timeout: Duration,
    /// Retries after the initial attempt
    pub max_retries: u32,
    /// First backoff delay; later delays double from here
    pub base_backoff: Duration,
    /// How long a cached repository listing stays fresh
    pub cache_ttl_repos: Duration,
    /// How long a cached language breakdown stays fresh
    pub cache_ttl_languages: Duration,
    /// Concurrent language lookups per aggregation
    pub language_concurrency: usize,
    /// Repositories returned when the caller does not pass a limit
    pub result_limit: usize,
}

impl Settings {
    /// Load settings from the environment
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            github_token: env::var("GITHUB_TOKEN").context("GITHUB_TOKEN must be set")?,
            api_base: env::var("GITHUB_API_URL").unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            api_timeout: Duration::from_secs(parse_var("API_TIMEOUT", 30)?),
            max_retries: parse_var("MAX_RETRIES", 3)?,
            base_backoff: Duration::from_millis(parse_var("BASE_BACKOFF_MS", 1000)?),
            cache_ttl_repos: Duration::from_secs(parse_var("CACHE_TTL_REPOS", 300)?),
            cache_ttl_languages: Duration::from_secs(parse_var("CACHE_TTL_LANGUAGES", 600)?),
            language_concurrency: parse_var("LANGUAGE_CONCURRENCY", 5)?,
            result_limit: parse_var("RESULT_LIMIT", 3)?,
        })
    }

    /// Check every value against its allowed range
    pub fn validate(&self) -> ValidationResult {
        validation::validate_settings(self)
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}
