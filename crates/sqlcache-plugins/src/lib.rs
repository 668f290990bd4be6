//! Cache plugins for SQLCache Rust models.
//!
//! A [`ModelClass`] describes a model at runtime: its effective primary key and
//! at most one active cache backend.
//!
//! - **Keyed cache** ([`CachingPlugin`]): an external key-value store queried per
//!   primary key. Entries are populated by [`ModelClass::primary_key_lookup`]
//!   (read-through) and may be absent at any time.
//! - **Static cache** ([`StaticCache`]): every row of the table loaded once at
//!   activation and indexed by primary key. Lookups never touch the database.
//!
//! Both backends hand out `Arc<M>` so repeated lookups of the same key return
//! the same instance.

pub mod class;
pub mod keyed;
pub mod snapshot;

pub use class::{CacheBackend, ModelClass};
pub use keyed::{CachingConfig, CachingPlugin, KeyedCache, MemoryCache};
pub use snapshot::{SnapshotLookup, StaticCache};
