//! Runtime description of a model class.
//!
//! `ModelClass` carries what the association layer needs to know about a
//! target model beyond its compile-time `Model` impl: the effective primary
//! key (which may be overridden), the active cache backend, and whether the
//! class prefers prepared statements for association loading.

use crate::keyed::CachingPlugin;
use crate::snapshot::{SnapshotLookup, StaticCache};
use asupersync::{Cx, Outcome};
use sqlcache_core::{CompositeKey, Connection, Error, Model};
use sqlcache_query::Dataset;
use std::fmt;
use std::sync::Arc;

/// The cache backend active on a model class. At most one per class.
pub enum CacheBackend<M: Model> {
    /// External key-value store, may miss at any time.
    Keyed(CachingPlugin<M>),
    /// Whole-table snapshot, authoritative for the table's contents.
    Static(Arc<dyn SnapshotLookup<M>>),
}

impl<M: Model> CacheBackend<M> {
    /// Short name for logging.
    pub const fn kind(&self) -> &'static str {
        match self {
            CacheBackend::Keyed(_) => "keyed",
            CacheBackend::Static(_) => "static",
        }
    }
}

impl<M: Model> Clone for CacheBackend<M> {
    fn clone(&self) -> Self {
        match self {
            CacheBackend::Keyed(plugin) => CacheBackend::Keyed(plugin.clone()),
            CacheBackend::Static(snapshot) => CacheBackend::Static(Arc::clone(snapshot)),
        }
    }
}

impl<M: Model> fmt::Debug for CacheBackend<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheBackend::Keyed(plugin) => f.debug_tuple("Keyed").field(plugin).finish(),
            CacheBackend::Static(_) => f.write_str("Static(..)"),
        }
    }
}

/// Runtime configuration of a model class.
pub struct ModelClass<M: Model> {
    primary_key: Vec<&'static str>,
    cache: Option<CacheBackend<M>>,
    prepared_statements_associations: bool,
}

impl<M: Model> ModelClass<M> {
    /// Describe `M` with its natural primary key and no cache.
    pub fn new() -> Self {
        Self {
            primary_key: M::PRIMARY_KEY.to_vec(),
            cache: None,
            prepared_statements_associations: false,
        }
    }

    /// Override the primary key columns.
    pub fn set_primary_key(mut self, columns: &[&'static str]) -> Self {
        self.primary_key = columns.to_vec();
        self
    }

    /// Activate a keyed cache backend, replacing any active backend.
    pub fn with_caching(mut self, plugin: CachingPlugin<M>) -> Self {
        self.cache = Some(CacheBackend::Keyed(plugin));
        self
    }

    /// Activate a static snapshot backend, replacing any active backend.
    pub fn with_static_cache(mut self, snapshot: Arc<dyn SnapshotLookup<M>>) -> Self {
        self.cache = Some(CacheBackend::Static(snapshot));
        self
    }

    /// Load every row of the table and activate it as the static backend.
    ///
    /// The snapshot is indexed on the class's current primary key, so call
    /// this after any `set_primary_key`.
    pub async fn load_static_cache<C: Connection>(self, cx: &Cx, conn: &C) -> Outcome<Self, Error> {
        let dataset = Dataset::of::<M>();
        match StaticCache::<M>::load(cx, conn, &dataset, &self.primary_key).await {
            Outcome::Ok(cache) => Outcome::Ok(self.with_static_cache(Arc::new(cache))),
            Outcome::Err(e) => Outcome::Err(e),
            Outcome::Cancelled(r) => Outcome::Cancelled(r),
            Outcome::Panicked(p) => Outcome::Panicked(p),
        }
    }

    /// Prefer prepared statements when this class is the source of an association.
    pub fn with_prepared_statements_associations(mut self, enabled: bool) -> Self {
        self.prepared_statements_associations = enabled;
        self
    }

    /// The table name.
    pub fn table_name(&self) -> &'static str {
        M::TABLE_NAME
    }

    /// The effective primary key columns, in order.
    pub fn primary_key(&self) -> &[&'static str] {
        &self.primary_key
    }

    /// The active cache backend, if any.
    pub fn cache_backend(&self) -> Option<&CacheBackend<M>> {
        self.cache.as_ref()
    }

    /// Check if the class prefers prepared statements for association loading.
    pub fn prepared_statements_associations(&self) -> bool {
        self.prepared_statements_associations
    }

    /// Dataset selecting the row with primary key `key`.
    pub fn primary_key_dataset(&self, key: &CompositeKey) -> Dataset {
        self.primary_key
            .iter()
            .zip(key.values())
            .fold(Dataset::of::<M>(), |ds, (column, value)| {
                ds.filter_eq(column, value.clone())
            })
    }

    /// Fetch the row with primary key `key`, consulting the active backend.
    ///
    /// - keyed: cache first, then the database, storing what was found
    /// - static: the snapshot only
    /// - none: the database
    pub async fn primary_key_lookup<C: Connection>(
        &self,
        cx: &Cx,
        conn: &C,
        key: &CompositeKey,
    ) -> Outcome<Option<Arc<M>>, Error> {
        if key.arity() != self.primary_key.len() {
            return Outcome::Err(Error::Custom(format!(
                "{} primary key has {} column(s), got a key with {}",
                M::TABLE_NAME,
                self.primary_key.len(),
                key.arity()
            )));
        }

        match &self.cache {
            Some(CacheBackend::Static(snapshot)) => Outcome::Ok(snapshot.lookup(key)),
            Some(CacheBackend::Keyed(plugin)) => {
                match plugin.get_pk(key) {
                    Ok(Some(hit)) => return Outcome::Ok(Some(hit)),
                    Ok(None) => {}
                    Err(e) => return Outcome::Err(e),
                }
                let found = match self.fetch(cx, conn, key).await {
                    Outcome::Ok(found) => found,
                    other => return other,
                };
                if let Some(model) = &found {
                    if let Err(e) = plugin.set_pk(key, Arc::clone(model)) {
                        return Outcome::Err(e);
                    }
                }
                Outcome::Ok(found)
            }
            None => self.fetch(cx, conn, key).await,
        }
    }

    async fn fetch<C: Connection>(
        &self,
        cx: &Cx,
        conn: &C,
        key: &CompositeKey,
    ) -> Outcome<Option<Arc<M>>, Error> {
        tracing::debug!(table = M::TABLE_NAME, key = %key, "Primary key query");
        self.primary_key_dataset(key)
            .first::<M, C>(cx, conn)
            .await
            .and_then(|found| Outcome::Ok(found.map(Arc::new)))
    }
}

impl<M: Model> Default for ModelClass<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> fmt::Debug for ModelClass<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelClass")
            .field("table", &M::TABLE_NAME)
            .field("primary_key", &self.primary_key)
            .field("cache", &self.cache.as_ref().map(CacheBackend::kind))
            .field(
                "prepared_statements_associations",
                &self.prepared_statements_associations,
            )
            .finish()
    }
}
