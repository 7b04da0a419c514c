//! Resilient fetch pipeline
//!
//! Composes the cache in front of the retry policy: a cache hit skips the
//! upstream entirely, and on a miss the retries run inside the one shared
//! flight, so concurrent callers pay for a single backoff sequence.

pub mod retry;

use crate::cache::CacheStore;
use crate::Result;
use retry::{with_retry, RetryConfig};
use std::future::Future;

/// Cached, retrying fetcher for one value namespace
pub struct ResilientFetcher<T> {
    cache: CacheStore<T>,
    retry: RetryConfig,
}

impl<T> ResilientFetcher<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(cache: CacheStore<T>, retry: RetryConfig) -> Self {
        Self { cache, retry }
    }

    /// Fetch `key`, serving from cache when fresh
    ///
    /// `call` performs one upstream attempt; the retry policy decides how
    /// often it runs. Only a final success is cached.
    pub async fn fetch<F, Fut>(&self, key: &str, call: F) -> Result<T>
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let retry = self.retry.clone();
        let name = self.cache.namespace();
        self.cache
            .get_or_populate(key, move || async move {
                with_retry(&retry, name, call).await
            })
            .await
    }

    pub fn cache(&self) -> &CacheStore<T> {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FetchError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::sleep;

    fn fetcher(ttl: Duration, max_retries: u32) -> ResilientFetcher<String> {
        let retry = RetryConfig {
            max_retries,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(10),
            multiplier: 2.0,
            jitter: false,
        };
        ResilientFetcher::new(CacheStore::new("test", ttl), retry)
    }

    #[tokio::test]
    async fn test_transient_failures_then_success_is_cached() {
        let fetcher = fetcher(Duration::from_secs(1), 3);
        let attempts = Arc::new(AtomicU32::new(0));

        let counter = Arc::clone(&attempts);
        let value = fetcher
            .fetch("octocat", move || {
                let counter = Arc::clone(&counter);
                async move {
                    let attempt = counter.fetch_add(1, Ordering::SeqCst);
                    if attempt < 2 {
                        Err(FetchError::UpstreamError { status: 502 })
                    } else {
                        Ok("fresh".to_string())
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(value, "fresh");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert_eq!(fetcher.cache().get("octocat"), Some("fresh".to_string()));
    }

    #[tokio::test]
    async fn test_exhausted_retries_return_error_uncached() {
        let fetcher = fetcher(Duration::from_secs(1), 2);
        let attempts = Arc::new(AtomicU32::new(0));

        let counter = Arc::clone(&attempts);
        let outcome = fetcher
            .fetch("octocat", move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<String, _>(FetchError::UpstreamTimeout)
                }
            })
            .await;

        assert_eq!(outcome, Err(FetchError::UpstreamTimeout));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert_eq!(fetcher.cache().get("octocat"), None);
    }

    #[tokio::test]
    async fn test_terminal_error_not_retried() {
        let fetcher = fetcher(Duration::from_secs(1), 3);
        let attempts = Arc::new(AtomicU32::new(0));

        let counter = Arc::clone(&attempts);
        let outcome = fetcher
            .fetch("ghost", move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<String, _>(FetchError::UserNotFound {
                        username: "ghost".to_string(),
                    })
                }
            })
            .await;

        assert!(matches!(outcome, Err(FetchError::UserNotFound { .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_fetch_retries_once_total() {
        let fetcher = Arc::new(fetcher(Duration::from_secs(1), 3));
        let attempts = Arc::new(AtomicU32::new(0));

        let mut handles = Vec::new();
        for _ in 0..6 {
            let fetcher = Arc::clone(&fetcher);
            let attempts = Arc::clone(&attempts);
            handles.push(tokio::spawn(async move {
                fetcher
                    .fetch("octocat", move || {
                        let attempts = Arc::clone(&attempts);
                        async move {
                            let attempt = attempts.fetch_add(1, Ordering::SeqCst);
                            sleep(Duration::from_millis(10)).await;
                            if attempt < 2 {
                                Err(FetchError::UpstreamError { status: 503 })
                            } else {
                                Ok("fresh".to_string())
                            }
                        }
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "fresh");
        }

        // One shared flight means one retry sequence, not one per caller
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}
