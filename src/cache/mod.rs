//! Time-limited cache of normalized content.
//!
//! Entries are `{ data, timestamp }` records kept in a [`Store`]. An entry is
//! valid while `now - timestamp < ttl`. Invalid entries are ignored, not
//! removed, and get overwritten by the next successful fetch.

use std::{
    sync::atomic::{AtomicI64, Ordering},
    time::Duration,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

pub const TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub data: serde_json::Value,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

pub trait Store {
    type Error: std::fmt::Display;

    fn load(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<CacheEntry>, Self::Error>> + Send;

    /// Replaces the entry stored under `key`.
    fn save(
        &self,
        key: &str,
        entry: &CacheEntry,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    pub fn at(time: DateTime<Utc>) -> Self {
        Self {
            millis: AtomicI64::new(time.timestamp_millis()),
        }
    }

    pub fn set(&self, time: DateTime<Utc>) {
        self.millis.store(time.timestamp_millis(), Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        let by = i64::try_from(by.as_millis()).unwrap_or(i64::MAX);
        self.millis.fetch_add(by, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst)).unwrap_or_default()
    }
}

impl<C: Clock> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (*self).now()
    }
}

impl<C: Clock> Clock for std::sync::Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

pub struct Cache<S, C = SystemClock> {
    store: S,
    clock: C,
    ttl: Duration,
}

impl<S: Store> Cache<S> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: Store, C: Clock> Cache<S, C> {
    pub fn with_clock(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            ttl: TTL,
        }
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn is_valid(&self, entry: &CacheEntry) -> bool {
        // A timestamp ahead of the clock has a negative age and stays valid.
        self.clock
            .now()
            .signed_duration_since(entry.timestamp)
            .to_std()
            .map(|age| age < self.ttl)
            .unwrap_or(true)
    }

    /// Returns the stored entry, valid or not. Store failures read as a miss.
    pub async fn get(&self, key: &str) -> Option<CacheEntry> {
        self.store
            .load(key)
            .await
            .inspect_err(|error| warn!(%error, key, "failed to read cache entry"))
            .ok()
            .flatten()
    }

    /// Stores `payload` stamped with the current time. A failed write is
    /// logged and otherwise ignored.
    pub async fn put<T: Serialize>(&self, key: &str, payload: &T) {
        let data = match serde_json::to_value(payload) {
            Ok(data) => data,
            Err(error) => {
                warn!(%error, key, "failed to encode cache payload");
                return;
            }
        };
        let entry = CacheEntry {
            data,
            timestamp: self.clock.now(),
        };
        if let Err(error) = self.store.save(key, &entry).await {
            warn!(%error, key, "failed to write cache entry");
        }
    }

    /// Returns a copy of the payload stored under `key` if the entry is still
    /// valid and decodes as `T`.
    pub async fn fresh<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entry = self.get(key).await?;
        if !self.is_valid(&entry) {
            debug!(key, timestamp = %entry.timestamp, "cache entry expired");
            return None;
        }
        serde_json::from_value(entry.data)
            .inspect(|_| debug!(key, "cache hit"))
            .inspect_err(|error| warn!(%error, key, "discarding undecodable cache entry"))
            .ok()
    }
}
