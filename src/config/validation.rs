//! Settings range checks
//!
//! Checks every configured value against its allowed range and reports all
//! violations at once, so a misconfigured deployment surfaces the whole
//! problem in one run.

use super::Settings;
use crate::github::LISTING_WINDOW;
use std::fmt;
use std::time::Duration;

/// One out-of-range or malformed setting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

pub(super) fn validate_settings(settings: &Settings) -> ValidationResult {
    let mut errors = Vec::new();

    if settings.github_token.trim().is_empty() {
        errors.push(ValidationError::new("github_token", "Must not be empty"));
    }
    if !settings.api_base.starts_with("http://") && !settings.api_base.starts_with("https://") {
        errors.push(ValidationError::new(
            "api_base",
            "Must start with http:// or https://",
        ));
    }

    check_duration_range(
        &mut errors,
        "api_timeout",
        settings.api_timeout,
        Duration::from_secs(1),
        Duration::from_secs(120),
    );
    check_duration_range(
        &mut errors,
        "base_backoff",
        settings.base_backoff,
        Duration::from_millis(50),
        Duration::from_millis(10_000),
    );
    check_duration_range(
        &mut errors,
        "cache_ttl_repos",
        settings.cache_ttl_repos,
        Duration::from_secs(60),
        Duration::from_secs(3600),
    );
    check_duration_range(
        &mut errors,
        "cache_ttl_languages",
        settings.cache_ttl_languages,
        Duration::from_secs(60),
        Duration::from_secs(3600),
    );

    if settings.max_retries > 10 {
        errors.push(ValidationError::new(
            "max_retries",
            format!("Must be at most 10, got {}", settings.max_retries),
        ));
    }
    check_usize_range(
        &mut errors,
        "language_concurrency",
        settings.language_concurrency,
        1,
        20,
    );
    check_usize_range(
        &mut errors,
        "result_limit",
        settings.result_limit,
        1,
        LISTING_WINDOW as usize,
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_duration_range(
    errors: &mut Vec<ValidationError>,
    field: &str,
    value: Duration,
    min: Duration,
    max: Duration,
) {
    if value < min || value > max {
        errors.push(ValidationError::new(
            field,
            format!("Must be between {:?} and {:?}, got {:?}", min, max, value),
        ));
    }
}

fn check_usize_range(
    errors: &mut Vec<ValidationError>,
    field: &str,
    value: usize,
    min: usize,
    max: usize,
) {
    if value < min || value > max {
        errors.push(ValidationError::new(
            field,
            format!("Must be between {} and {}, got {}", min, max, value),
        ));
    }
}
