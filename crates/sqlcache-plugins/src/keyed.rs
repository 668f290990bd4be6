//! Keyed (external key-value) cache plugin.
//!
//! The store itself is an opaque collaborator behind [`KeyedCache`]; this
//! module only decides which key to ask for and what to do with failures.
//! Keys have the form `"{table}:{pk}"`, e.g. `caching_models:1,2`, with the
//! primary key rendered through `CompositeKey`'s escaped `Display`.

use serde::{Deserialize, Serialize};
use sqlcache_core::{CompositeKey, Model, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

/// A key-value store holding shared model instances.
///
/// Thread safety of `get`/`set` is the store's own contract; callers add no
/// locking around it. A store that deserializes on every `get` gives up
/// instance identity, which association lookups otherwise preserve.
pub trait KeyedCache<M>: Send + Sync {
    /// Fetch the entry for `key`, `Ok(None)` on a miss.
    fn get(&self, key: &str) -> Result<Option<Arc<M>>>;

    /// Store `value` under `key` for `ttl`.
    fn set(&self, key: &str, value: Arc<M>, ttl: Duration) -> Result<()>;
}

/// Configuration for [`CachingPlugin`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachingConfig {
    /// Time-to-live passed to the store on every `set`, in seconds when serialized.
    #[serde(default = "default_ttl", with = "duration_secs")]
    pub ttl: Duration,
    /// Log and swallow store errors instead of propagating them.
    ///
    /// A failed `get` then counts as a miss and a failed `set` is dropped.
    #[serde(default)]
    pub ignore_exceptions: bool,
}

const DEFAULT_TTL_SECONDS: u64 = 3600;

fn default_ttl() -> Duration {
    Duration::from_secs(DEFAULT_TTL_SECONDS)
}

impl Default for CachingConfig {
    fn default() -> Self {
        Self {
            ttl: default_ttl(),
            ignore_exceptions: false,
        }
    }
}

impl CachingConfig {
    /// Create the default configuration (one hour TTL, errors propagate).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the TTL (builder pattern).
    #[must_use]
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set `ignore_exceptions` (builder pattern).
    #[must_use]
    pub fn ignore_exceptions(mut self, value: bool) -> Self {
        self.ignore_exceptions = value;
        self
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

/// The keyed cache backend of a model class.
pub struct CachingPlugin<M: Model> {
    store: Arc<dyn KeyedCache<M>>,
    config: CachingConfig,
}

impl<M: Model> CachingPlugin<M> {
    /// Attach `store` with the default configuration.
    pub fn new(store: Arc<dyn KeyedCache<M>>) -> Self {
        Self::with_config(store, CachingConfig::default())
    }

    /// Attach `store` with an explicit configuration.
    pub fn with_config(store: Arc<dyn KeyedCache<M>>, config: CachingConfig) -> Self {
        Self { store, config }
    }

    /// The active configuration.
    pub fn config(&self) -> &CachingConfig {
        &self.config
    }

    /// The cache key for a primary key value.
    pub fn cache_key(&self, pk: &CompositeKey) -> String {
        format!("{}:{}", M::TABLE_NAME, pk)
    }

    /// Cache-only lookup. Never touches the database.
    #[allow(clippy::result_large_err)]
    pub fn get_pk(&self, pk: &CompositeKey) -> Result<Option<Arc<M>>> {
        let key = self.cache_key(pk);
        match self.store.get(&key) {
            Ok(found) => Ok(found),
            Err(e) if self.config.ignore_exceptions => {
                tracing::warn!(key = %key, error = %e, "Ignoring cache get failure");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Store `value` under its primary key with the configured TTL.
    #[allow(clippy::result_large_err)]
    pub fn set_pk(&self, pk: &CompositeKey, value: Arc<M>) -> Result<()> {
        let key = self.cache_key(pk);
        match self.store.set(&key, value, self.config.ttl) {
            Ok(()) => Ok(()),
            Err(e) if self.config.ignore_exceptions => {
                tracing::warn!(key = %key, error = %e, "Ignoring cache set failure");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

impl<M: Model> Clone for CachingPlugin<M> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl<M: Model> fmt::Debug for CachingPlugin<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachingPlugin")
            .field("table", &M::TABLE_NAME)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// In-process [`KeyedCache`] keeping `Arc`s in a map.
///
/// Entries never expire; the last TTL passed to `set` is recorded so callers
/// can check what a real store would have been told.
pub struct MemoryCache<M> {
    entries: RwLock<HashMap<String, Arc<M>>>,
    last_ttl: Mutex<Option<Duration>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<M> MemoryCache<M> {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            last_ttl: Mutex::new(None),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if `key` is stored.
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// The TTL passed to the most recent `set`.
    pub fn last_ttl(&self) -> Option<Duration> {
        *self.last_ttl.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// `(hits, misses)` observed by `get`.
    pub fn stats(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}

impl<M> Default for MemoryCache<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Send + Sync> KeyedCache<M> for MemoryCache<M> {
    fn get(&self, key: &str) -> Result<Option<Arc<M>>> {
        let found = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned();
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        Ok(found)
    }

    fn set(&self, key: &str, value: Arc<M>, ttl: Duration) -> Result<()> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
        *self.last_ttl.lock().unwrap_or_else(PoisonError::into_inner) = Some(ttl);
        Ok(())
    }
}

impl<M> fmt::Debug for MemoryCache<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (hits, misses) = self.stats();
        f.debug_struct("MemoryCache")
            .field("len", &self.len())
            .field("hits", &hits)
            .field("misses", &misses)
            .finish()
    }
}
