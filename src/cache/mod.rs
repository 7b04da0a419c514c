//! Caching layer
//!
//! A keyed TTL store with single-flight population, one store per value
//! namespace. Listings and language breakdowns get separate stores so
//! their TTLs can differ.

mod store;

pub use store::CacheStore;
