//! Payload types decoded from the GitHub REST API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bytes of code per language, as returned by the languages endpoint
pub type LanguageBytes = BTreeMap<String, u64>;

/// One repository from the listing endpoint
///
/// Fields GitHub may omit or null out carry defaults so a sparse payload
/// still decodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoSummary {
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub html_url: String,
    /// Primary language as reported by the listing, if any
    #[serde(default)]
    pub language: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Null for repositories that have never been pushed to
    #[serde(default)]
    pub pushed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub watchers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub open_issues_count: u64,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub disabled: bool,
}

/// A repository enriched with its language breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub html_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub pushed_at: Option<DateTime<Utc>>,
    pub stargazers_count: u64,
    pub watchers_count: u64,
    pub forks_count: u64,
    pub open_issues_count: u64,
    pub fork: bool,
    pub private: bool,
    pub archived: bool,
    pub disabled: bool,
    /// Percentage of bytes per language, each in [0, 100]
    pub languages: BTreeMap<String, f64>,
    pub primary_language: Option<String>,
}

impl Repository {
    /// Combine a listing entry with its language breakdown
    pub fn from_parts(summary: RepoSummary, languages: &LanguageBytes) -> Self {
        Self {
            name: summary.name,
            full_name: summary.full_name,
            description: summary.description,
            html_url: summary.html_url,
            created_at: summary.created_at,
            updated_at: summary.updated_at,
            pushed_at: summary.pushed_at,
            stargazers_count: summary.stargazers_count,
            watchers_count: summary.watchers_count,
            forks_count: summary.forks_count,
            open_issues_count: summary.open_issues_count,
            fork: summary.fork,
            private: summary.private,
            archived: summary.archived,
            disabled: summary.disabled,
            languages: language_percentages(languages),
            primary_language: summary.language,
        }
    }
}

/// Convert byte counts to percentages of the total
///
/// An empty or all-zero breakdown yields an empty map rather than
/// dividing by zero.
pub fn language_percentages(bytes: &LanguageBytes) -> BTreeMap<String, f64> {
    let total: u64 = bytes.values().sum();
    if total == 0 {
        return BTreeMap::new();
    }
    bytes
        .iter()
        .map(|(language, count)| (language.clone(), *count as f64 * 100.0 / total as f64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breakdown(pairs: &[(&str, u64)]) -> LanguageBytes {
        pairs
            .iter()
            .map(|(language, count)| (language.to_string(), *count))
            .collect()
    }

    #[test]
    fn test_language_percentages() {
        let percentages = language_percentages(&breakdown(&[("Rust", 300), ("TOML", 100)]));
        assert_eq!(percentages.get("Rust"), Some(&75.0));
        assert_eq!(percentages.get("TOML"), Some(&25.0));
    }

    #[test]
    fn test_language_percentages_empty() {
        assert!(language_percentages(&LanguageBytes::new()).is_empty());
    }

    #[test]
    fn test_language_percentages_sum_to_whole() {
        let percentages =
            language_percentages(&breakdown(&[("Rust", 1), ("Go", 1), ("Python", 1)]));
        let total: f64 = percentages.values().sum();
        assert!((total - 100.0).abs() < 0.5, "total was {}", total);
    }

    #[test]
    fn test_sparse_listing_payload_decodes() {
        let raw = r#"{
            "name": "hello-world",
            "full_name": "octocat/hello-world",
            "description": null,
            "html_url": "https://github.com/octocat/hello-world",
            "language": null,
            "created_at": "2020-01-01T00:00:00Z",
            "updated_at": "2023-01-01T00:00:00Z",
            "pushed_at": null,
            "stargazers_count": 4
        }"#;

        let summary: RepoSummary = serde_json::from_str(raw).unwrap();
        assert_eq!(summary.full_name, "octocat/hello-world");
        assert_eq!(summary.pushed_at, None);
        assert_eq!(summary.stargazers_count, 4);
        assert_eq!(summary.forks_count, 0);
        assert!(!summary.fork);
    }

    #[test]
    fn test_from_parts_carries_fields_and_percentages() {
        let raw = r#"{
            "name": "hello-world",
            "full_name": "octocat/hello-world",
            "html_url": "https://github.com/octocat/hello-world",
            "language": "Rust",
            "created_at": "2020-01-01T00:00:00Z",
            "updated_at": "2023-01-01T00:00:00Z",
            "pushed_at": "2023-06-01T00:00:00Z",
            "stargazers_count": 42,
            "forks_count": 7
        }"#;
        let summary: RepoSummary = serde_json::from_str(raw).unwrap();

        let repository = Repository::from_parts(summary, &breakdown(&[("Rust", 900), ("TOML", 100)]));

        assert_eq!(repository.full_name, "octocat/hello-world");
        assert_eq!(repository.stargazers_count, 42);
        assert_eq!(repository.forks_count, 7);
        assert_eq!(repository.primary_language.as_deref(), Some("Rust"));
        assert_eq!(repository.languages.get("Rust"), Some(&90.0));
        assert_eq!(repository.languages.get("TOML"), Some(&10.0));
    }
}
