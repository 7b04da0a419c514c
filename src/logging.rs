//! Logging initialization for RepoLens
//!
//! Structured logging via `tracing`, filtered through `RUST_LOG`. Without
//! one, the default keeps the service's own milestones visible while
//! silencing upstream crate noise.

use anyhow::Context;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global tracing subscriber
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init() -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("repolens=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .try_init()
        .context("Failed to initialize tracing")?;

    Ok(())
}

/// Initialize logging for tests, tolerating repeat calls
pub fn init_test() {
    let _ = init();
}
