//! Static (snapshot) cache plugin.
//!
//! A `StaticCache` holds every row of a table, loaded once and indexed by
//! primary key. After construction it is read-only, so concurrent lookups
//! need no synchronization.

use asupersync::{Cx, Outcome};
use sqlcache_core::{CacheError, CacheErrorKind, CompositeKey, Connection, Error, Model};
use sqlcache_query::Dataset;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Read-only, in-memory primary key lookup.
///
/// Never performs I/O. A key absent from the snapshot simply has no entity.
pub trait SnapshotLookup<M>: Send + Sync {
    /// Look up the entity stored under `key`.
    fn lookup(&self, key: &CompositeKey) -> Option<Arc<M>>;
}

/// Snapshot of a whole table keyed by primary key.
pub struct StaticCache<M> {
    primary_key: Vec<&'static str>,
    index: HashMap<CompositeKey, usize>,
    rows: Vec<Arc<M>>,
}

impl<M: Model> StaticCache<M> {
    /// Build a snapshot from already-decoded models.
    ///
    /// `primary_key` names the columns the index is built on. Rows whose key
    /// contains NULL are skipped; a later row with the same key replaces an
    /// earlier one.
    pub fn from_models(primary_key: &[&'static str], models: impl IntoIterator<Item = M>) -> Self {
        let mut index = HashMap::new();
        let mut rows: Vec<Arc<M>> = Vec::new();

        for model in models {
            let Some(key) = CompositeKey::from_model(&model, primary_key) else {
                tracing::warn!(
                    table = M::TABLE_NAME,
                    "Skipping snapshot row with NULL primary key"
                );
                continue;
            };
            let model = Arc::new(model);
            if let Some(&slot) = index.get(&key) {
                rows[slot] = model;
            } else {
                index.insert(key, rows.len());
                rows.push(model);
            }
        }

        Self {
            primary_key: primary_key.to_vec(),
            index,
            rows,
        }
    }

    /// Run `dataset` and snapshot every returned row.
    ///
    /// A failed query or row decode is reported as a `CacheErrorKind::Load`
    /// cache error carrying the underlying error as its source.
    #[tracing::instrument(level = "debug", skip_all, fields(table = M::TABLE_NAME))]
    pub async fn load<C: Connection>(
        cx: &Cx,
        conn: &C,
        dataset: &Dataset,
        primary_key: &[&'static str],
    ) -> Outcome<Self, Error> {
        match dataset.all::<M, C>(cx, conn).await {
            Outcome::Ok(models) => {
                let cache = Self::from_models(primary_key, models);
                tracing::info!(
                    table = M::TABLE_NAME,
                    rows = cache.len(),
                    "Static cache loaded"
                );
                Outcome::Ok(cache)
            }
            Outcome::Err(e) => {
                tracing::error!(table = M::TABLE_NAME, error = %e, "Static cache load failed");
                Outcome::Err(Error::Cache(CacheError {
                    kind: CacheErrorKind::Load,
                    key: None,
                    message: format!("loading static cache for {} failed", M::TABLE_NAME),
                    source: Some(Box::new(e)),
                }))
            }
            Outcome::Cancelled(r) => Outcome::Cancelled(r),
            Outcome::Panicked(p) => Outcome::Panicked(p),
        }
    }

    /// Look up a row by primary key.
    pub fn get(&self, key: &CompositeKey) -> Option<Arc<M>> {
        self.index.get(key).map(|&i| Arc::clone(&self.rows[i]))
    }

    /// Every cached row, in load order.
    pub fn all(&self) -> &[Arc<M>] {
        &self.rows
    }

    /// The columns this snapshot is indexed on.
    pub fn primary_key(&self) -> &[&'static str] {
        &self.primary_key
    }

    /// Number of cached rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<M: Model> SnapshotLookup<M> for StaticCache<M> {
    fn lookup(&self, key: &CompositeKey) -> Option<Arc<M>> {
        self.get(key)
    }
}

impl<M: Model> fmt::Debug for StaticCache<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCache")
            .field("table", &M::TABLE_NAME)
            .field("primary_key", &self.primary_key)
            .field("rows", &self.rows.len())
            .finish()
    }
}
