//! TTL keyed store with single-flight population
//!
//! Values expire after the store's TTL; expiry is checked lazily on read.
//! Concurrent callers asking for a missing key share one in-flight
//! population instead of issuing duplicate upstream calls. The population
//! runs as a spawned task, so a caller that goes away cannot abort a flight
//! other callers are waiting on.

use crate::{FetchError, Result};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Shared handle to an in-flight population
type InFlight<V> = Shared<BoxFuture<'static, Result<V>>>;

/// A cached value with its expiry deadline
#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V, ttl: Duration) -> Self {
        let stored_at = Instant::now();
        Self {
            value,
            stored_at,
            expires_at: stored_at + ttl,
        }
    }

    fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// One slot per key: a settled value, or a population in flight
enum Slot<V> {
    Ready(CacheEntry<V>),
    Pending { flight_id: u64, inflight: InFlight<V> },
}

impl<V> Slot<V> {
    fn flight_id(&self) -> Option<u64> {
        match self {
            Slot::Ready(_) => None,
            Slot::Pending { flight_id, .. } => Some(*flight_id),
        }
    }
}

/// TTL cache for one namespace, with single-flight deduplication
///
/// Values are handed out by clone and never mutated in place. Entries for
/// distinct keys live in a sharded map, so there is no global lock across
/// keys. There is no background sweeper; memory is bounded by the set of
/// distinct keys seen.
pub struct CacheStore<V> {
    namespace: &'static str,
    ttl: Duration,
    slots: Arc<DashMap<String, Slot<V>>>,
    flight_counter: AtomicU64,
}

impl<V> CacheStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a store for one namespace with its TTL
    pub fn new(namespace: &'static str, ttl: Duration) -> Self {
        Self {
            namespace,
            ttl,
            slots: Arc::new(DashMap::new()),
            flight_counter: AtomicU64::new(0),
        }
    }

    pub fn namespace(&self) -> &'static str {
        self.namespace
    }

    /// Look up a fresh value
    ///
    /// Expired entries and pending populations are misses.
    pub fn get(&self, key: &str) -> Option<V> {
        let slot = self.slots.get(key)?;
        match slot.value() {
            Slot::Ready(entry) if entry.is_fresh(Instant::now()) => {
                debug!(
                    cache = self.namespace,
                    key = %key,
                    age = ?entry.stored_at.elapsed(),
                    "Cache hit"
                );
                Some(entry.value.clone())
            }
            _ => None,
        }
    }

    /// Remove an entry immediately
    ///
    /// A population pending under this key keeps running, but its result is
    /// discarded instead of stored.
    pub fn invalidate(&self, key: &str) {
        if self.slots.remove(key).is_some() {
            debug!(cache = self.namespace, key = %key, "Cache entry invalidated");
        }
    }

    /// Fetch through the cache, deduplicating concurrent misses
    ///
    /// On a miss, exactly one caller invokes `populate`; every other caller
    /// asking for the same key awaits that single outcome. A success is
    /// stored for the store's TTL and fanned out; a failure is fanned out
    /// and nothing is cached, so the next call repopulates.
    pub async fn get_or_populate<F, Fut>(&self, key: &str, populate: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let inflight = match self.slots.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let live = match occupied.get() {
                    Slot::Ready(entry) if entry.is_fresh(Instant::now()) => {
                        debug!(
                            cache = self.namespace,
                            key = %key,
                            age = ?entry.stored_at.elapsed(),
                            "Cache hit"
                        );
                        return Ok(entry.value.clone());
                    }
                    // A flight someone else started and that has not settled.
                    Slot::Pending { inflight, .. } if inflight.peek().is_none() => {
                        Some(inflight.clone())
                    }
                    // Expired entry, or a settled flight whose task never got
                    // to swap the slot out (it panicked). Repopulate.
                    _ => None,
                };

                match live {
                    Some(shared) => {
                        debug!(cache = self.namespace, key = %key, "Joining in-flight population");
                        shared
                    }
                    None => {
                        let (flight_id, shared) = self.start_flight(key, populate);
                        occupied.insert(Slot::Pending {
                            flight_id,
                            inflight: shared.clone(),
                        });
                        shared
                    }
                }
            }
            Entry::Vacant(vacant) => {
                let (flight_id, shared) = self.start_flight(key, populate);
                vacant.insert(Slot::Pending {
                    flight_id,
                    inflight: shared.clone(),
                });
                shared
            }
        };

        inflight.await
    }

    /// Spawn the population task and hand back a shareable handle to it
    ///
    /// The task owns the slot update: success swaps this flight's slot for
    /// the stored entry, failure removes it. Both are gated on the flight id,
    /// so a flight that was invalidated or superseded mid-run discards its
    /// result instead of clobbering a newer slot.
    fn start_flight<F, Fut>(&self, key: &str, populate: F) -> (u64, InFlight<V>)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let flight_id = self.flight_counter.fetch_add(1, Ordering::Relaxed);
        let slots = Arc::clone(&self.slots);
        let namespace = self.namespace;
        let ttl = self.ttl;
        let key = key.to_string();
        let fut = populate();

        debug!(cache = namespace, key = %key, flight_id, "Cache miss, starting population");

        let task = tokio::spawn(async move {
            let result = fut.await;
            match &result {
                Ok(value) => {
                    let entry = CacheEntry::new(value.clone(), ttl);
                    match slots.entry(key.clone()) {
                        Entry::Occupied(mut occupied)
                            if occupied.get().flight_id() == Some(flight_id) =>
                        {
                            occupied.insert(Slot::Ready(entry));
                            debug!(cache = namespace, key = %key, "Population stored");
                        }
                        _ => {
                            debug!(
                                cache = namespace,
                                key = %key,
                                "Population superseded, result discarded"
                            );
                        }
                    }
                }
                Err(error) => {
                    slots.remove_if(&key, |_, slot| slot.flight_id() == Some(flight_id));
                    debug!(
                        cache = namespace,
                        key = %key,
                        "Population failed, nothing cached: {}",
                        error
                    );
                }
            }
            result
        });

        let inflight = task
            .map(|joined| match joined {
                Ok(result) => result,
                Err(_) => Err(FetchError::UnknownError { status: None }),
            })
            .boxed()
            .shared();

        (flight_id, inflight)
    }
}
