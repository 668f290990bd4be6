//! SQLCache Rust: many-to-one associations served from model caches.
//!
//! A model class can carry a cache backend: either a keyed cache in front of
//! an external key-value store, or a static snapshot of the whole table.
//! Associations pointing at such a class skip the database and read the
//! target straight from the cache whenever that is guaranteed to return what
//! the query would have.
//!
//! # Quick Start
//!
//! ```ignore
//! use sqlcache::prelude::*;
//! use std::sync::Arc;
//!
//! async fn example(cx: &Cx, conn: &impl Connection, lookup: &LookupModel) {
//!     let store = Arc::new(MemoryCache::<CachingModel>::new());
//!     let caching_models =
//!         Arc::new(ModelClass::<CachingModel>::new().with_caching(CachingPlugin::new(store)));
//!
//!     let caching_model = ManyToOne::new(
//!         "caching_model",
//!         &ModelClass::<LookupModel>::new(),
//!         caching_models,
//!         AssociationOptions::new(),
//!     );
//!     assert!(caching_model.eligibility().is_eligible());
//!
//!     // Reads the keyed cache only; a miss is `None`.
//!     let target = caching_model.resolve(cx, conn, lookup).await;
//! }
//! ```
//!
//! # Crates
//!
//! - `sqlcache-core`: values, rows, keys, the `Model` and `Connection` traits
//! - `sqlcache-query`: the SELECT builder used by the query path
//! - `sqlcache-plugins`: keyed and static cache backends, `ModelClass`
//! - `sqlcache-assoc`: association options, eligibility and dispatch

pub use sqlcache_core::{
    CacheError, CacheErrorKind, ColumnInfo, CompositeKey, Connection, Cx, Error, FromValue, Model,
    Outcome, QueryError, QueryErrorKind, Result, Row, TypeError, Value,
};

pub use sqlcache_query::{CompareOp, Dataset, Filter, Limit};

pub use sqlcache_plugins::{
    CacheBackend, CachingConfig, CachingPlugin, KeyedCache, MemoryCache, ModelClass,
    SnapshotLookup, StaticCache,
};

pub use sqlcache_assoc::{
    Associated, AssociationOptions, BlockFn, DatasetFn, Eligibility, IneligibleReason, KeyOption,
    ManyToOne, analyze,
};

/// Prelude module for convenient imports.
///
/// ```ignore
/// use sqlcache::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Associated, AssociationOptions, CacheBackend, CachingConfig, CachingPlugin, CompositeKey,
        Connection, Cx, Dataset, Eligibility, Error, IneligibleReason, KeyedCache, ManyToOne,
        MemoryCache, Model, ModelClass, Outcome, Result, Row, SnapshotLookup, StaticCache, Value,
    };
}
