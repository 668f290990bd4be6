//! Association loading: cache lookup when eligible, a query otherwise.

use crate::definition::ManyToOne;
use asupersync::{Cx, Outcome};
use sqlcache_core::{Connection, Error, Model, Result};
use sqlcache_plugins::CacheBackend;
use sqlcache_query::Dataset;
use std::sync::Arc;

impl<S: Model, T: Model> ManyToOne<S, T> {
    /// Load the target of this association for `record`.
    ///
    /// Eligible associations read the target's cache backend and never touch
    /// the database: a keyed cache miss or a key absent from the static
    /// snapshot is `None`. Ineligible associations run the standard query.
    /// A NULL foreign key resolves to `None` on both paths without I/O.
    #[tracing::instrument(level = "debug", skip_all, fields(association = self.name()))]
    pub async fn resolve<C: Connection>(
        &self,
        cx: &Cx,
        conn: &C,
        record: &S,
    ) -> Outcome<Option<Arc<T>>, Error> {
        if !self.eligibility().is_eligible() {
            return self.load_with_query(cx, conn, record).await;
        }

        let Some(key) = self.source_key(record) else {
            tracing::trace!(strategy = "pk_lookup", "NULL foreign key");
            return Outcome::Ok(None);
        };

        match self.target().cache_backend() {
            Some(CacheBackend::Keyed(plugin)) => match plugin.get_pk(&key) {
                Ok(found) => {
                    tracing::trace!(
                        strategy = "keyed",
                        key = %key,
                        hit = found.is_some(),
                        "Primary key cache lookup"
                    );
                    Outcome::Ok(found)
                }
                Err(e) => Outcome::Err(e),
            },
            Some(CacheBackend::Static(snapshot)) => {
                let found = snapshot.lookup(&key);
                tracing::trace!(
                    strategy = "static",
                    key = %key,
                    hit = found.is_some(),
                    "Primary key cache lookup"
                );
                Outcome::Ok(found)
            }
            // Forced eligibility without a backend.
            None => self.load_with_query(cx, conn, record).await,
        }
    }

    /// The dataset the standard query path runs for `record`.
    ///
    /// `Ok(None)` when the association has no `dataset` option and the foreign
    /// key is NULL, since such a query could never match. A foreign key whose
    /// column count differs from the target primary key is an error.
    #[allow(clippy::result_large_err)]
    pub fn query_dataset(&self, record: &S) -> Result<Option<Dataset>> {
        let options = self.options();

        let mut dataset = if let Some(build) = &options.dataset {
            build(record)
        } else {
            let Some(key) = self.source_key(record) else {
                return Ok(None);
            };
            let primary_key = self.effective_primary_key();
            if primary_key.len() != key.arity() {
                return Err(Error::Custom(format!(
                    "association {} has {} foreign key column(s) but {} primary key has {}",
                    self.name(),
                    key.arity(),
                    T::TABLE_NAME,
                    primary_key.len()
                )));
            }
            primary_key
                .iter()
                .zip(key.values())
                .fold(Dataset::of::<T>(), |ds, (column, value)| {
                    ds.filter_eq(column, value.clone())
                })
        };

        if let Some(conditions) = &options.conditions {
            for (column, value) in conditions {
                dataset = dataset.filter_eq(column, value.clone());
            }
        }
        if let Some(columns) = &options.select {
            dataset = dataset.select(columns);
        }
        if let Some(block) = &options.block {
            dataset = block(dataset);
        }
        Ok(Some(dataset))
    }

    async fn load_with_query<C: Connection>(
        &self,
        cx: &Cx,
        conn: &C,
        record: &S,
    ) -> Outcome<Option<Arc<T>>, Error> {
        let dataset = match self.query_dataset(record) {
            Ok(Some(dataset)) => dataset,
            Ok(None) => {
                tracing::trace!(strategy = "query", "NULL foreign key");
                return Outcome::Ok(None);
            }
            Err(e) => return Outcome::Err(e),
        };
        tracing::trace!(strategy = "query", table = dataset.table(), "Association query");
        dataset
            .first::<T, C>(cx, conn)
            .await
            .and_then(|found| Outcome::Ok(found.map(Arc::new)))
    }
}
