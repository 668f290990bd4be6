//! Many-to-one association definitions.

use crate::eligibility::{Eligibility, analyze};
use crate::options::{AssociationOptions, KeyOption};
use sqlcache_core::{CompositeKey, Model};
use sqlcache_plugins::ModelClass;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// A many-to-one association from source model `S` to target model `T`.
///
/// Definitions are immutable. Changing an option means building a new
/// definition, which also re-evaluates eligibility.
///
/// # Example
///
/// ```ignore
/// let caching_models = Arc::new(ModelClass::<CachingModel>::new().with_caching(plugin));
/// let assoc = ManyToOne::new(
///     "caching_model",
///     &ModelClass::<LookupModel>::new(),
///     caching_models,
///     AssociationOptions::new(),
/// );
/// let found = assoc.resolve(&cx, &conn, &lookup).await;
/// ```
pub struct ManyToOne<S: Model, T: Model> {
    name: &'static str,
    foreign_key: Vec<String>,
    options: AssociationOptions<S>,
    prepared_statements: bool,
    target: Arc<ModelClass<T>>,
    eligibility: OnceLock<Eligibility>,
}

impl<S: Model, T: Model> ManyToOne<S, T> {
    /// Define an association named `name` on `source` pointing at `target`.
    ///
    /// The source class's prepared statement preference is captured here.
    pub fn new(
        name: &'static str,
        source: &ModelClass<S>,
        target: Arc<ModelClass<T>>,
        options: AssociationOptions<S>,
    ) -> Self {
        let foreign_key = match &options.key {
            KeyOption::Default => vec![format!("{name}_id")],
            KeyOption::Columns(columns) => columns.iter().map(|c| (*c).to_string()).collect(),
            KeyOption::Custom => Vec::new(),
        };
        Self {
            name,
            foreign_key,
            options,
            prepared_statements: source.prepared_statements_associations(),
            target,
            eligibility: OnceLock::new(),
        }
    }

    /// The association name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Foreign key columns on the source, in target primary key order.
    /// Empty for custom associations.
    pub fn foreign_key(&self) -> &[String] {
        &self.foreign_key
    }

    /// The association options.
    pub fn options(&self) -> &AssociationOptions<S> {
        &self.options
    }

    /// The target class.
    pub fn target(&self) -> &ModelClass<T> {
        &self.target
    }

    /// Whether the source class prefers prepared statements.
    pub fn prepared_statements(&self) -> bool {
        self.prepared_statements
    }

    /// Target columns the foreign key refers to: the `primary_key` option
    /// when set, otherwise the target class's primary key.
    pub fn effective_primary_key(&self) -> &[&'static str] {
        self.options
            .primary_key
            .as_deref()
            .unwrap_or_else(|| self.target.primary_key())
    }

    /// Eligibility for primary key cache lookups, computed on first access.
    pub fn eligibility(&self) -> &Eligibility {
        self.eligibility
            .get_or_init(|| analyze(self, &self.target))
    }

    /// Read the foreign key from `record`.
    ///
    /// `None` when the association has no foreign key columns or any
    /// component is NULL or absent.
    pub fn source_key(&self, record: &S) -> Option<CompositeKey> {
        let mut values = Vec::with_capacity(self.foreign_key.len());
        for column in &self.foreign_key {
            values.push(record.column_value(column)?);
        }
        CompositeKey::new(values)
    }
}

impl<S: Model, T: Model> fmt::Debug for ManyToOne<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManyToOne")
            .field("name", &self.name)
            .field("source", &S::TABLE_NAME)
            .field("target", &self.target)
            .field("foreign_key", &self.foreign_key)
            .field("options", &self.options)
            .field("eligibility", &self.eligibility.get())
            .finish()
    }
}
