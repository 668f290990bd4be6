//! Per-record association slot.

use crate::definition::ManyToOne;
use asupersync::{Cx, Outcome};
use sqlcache_core::{Connection, Error, Model};
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Memoized association value carried by a source record.
///
/// The first successful [`load`](Self::load) stores its result (including
/// "no target"); later loads return it without resolving again. Errors and
/// cancellation leave the slot empty so the load can be retried.
///
/// # Example
///
/// ```ignore
/// struct Lookup {
///     id: i64,
///     caching_model_id: Option<i64>,
///     caching_model: Associated<CachingModel>,
/// }
///
/// let target = lookup.caching_model.load(&cx, &conn, &assoc, &lookup).await;
/// ```
pub struct Associated<T> {
    loaded: OnceLock<Option<Arc<T>>>,
}

impl<T: Model> Associated<T> {
    /// Create an unloaded slot.
    pub const fn new() -> Self {
        Self {
            loaded: OnceLock::new(),
        }
    }

    /// Create a slot holding an already known value.
    pub fn loaded(value: Option<Arc<T>>) -> Self {
        let slot = Self::new();
        let _ = slot.loaded.set(value);
        slot
    }

    /// Resolve `assoc` for `record` on first use, then return the stored value.
    pub async fn load<S: Model, C: Connection>(
        &self,
        cx: &Cx,
        conn: &C,
        assoc: &ManyToOne<S, T>,
        record: &S,
    ) -> Outcome<Option<Arc<T>>, Error> {
        if let Some(value) = self.loaded.get() {
            return Outcome::Ok(value.clone());
        }

        match assoc.resolve(cx, conn, record).await {
            Outcome::Ok(found) => Outcome::Ok(self.loaded.get_or_init(|| found).clone()),
            Outcome::Err(e) => Outcome::Err(e),
            Outcome::Cancelled(r) => Outcome::Cancelled(r),
            Outcome::Panicked(p) => Outcome::Panicked(p),
        }
    }

    /// The loaded target (None if not loaded or there is no target).
    pub fn get(&self) -> Option<&Arc<T>> {
        self.loaded.get().and_then(Option::as_ref)
    }

    /// Check if a load has completed.
    pub fn is_loaded(&self) -> bool {
        self.loaded.get().is_some()
    }

    /// Forget the loaded value.
    pub fn reset(&mut self) {
        self.loaded.take();
    }
}

impl<T: Model> Default for Associated<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Model + fmt::Debug> fmt::Debug for Associated<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Associated")
            .field("loaded", &self.loaded.get())
            .finish()
    }
}
