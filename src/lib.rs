//! RepoLens - resilient, cached recent-repository feed for GitHub users
//!
//! Given a username, RepoLens returns that user's most recently pushed
//! repositories enriched with per-language percentages, absorbing upstream
//! flakiness with retries and keeping hot answers in a TTL cache that
//! deduplicates concurrent misses into a single upstream flight.
//!
//! # Architecture
//!
//! - `github` - REST client, payload types, username validation
//! - `cache` - TTL store with single-flight population
//! - `fetch` - retry policy composed behind the cache
//! - `service` - aggregation: listing, enrichment, sorting, truncation
//! - `config` - environment-driven settings and their range checks
//! - `logging` - tracing subscriber setup

// Core modules
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod github;
pub mod logging;
pub mod service;

// Re-exports
pub use error::{FetchError, Result};
pub use service::RepoService;
