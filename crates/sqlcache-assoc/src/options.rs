//! Association configuration.

use sqlcache_core::Value;
use sqlcache_query::Dataset;
use std::fmt;
use std::sync::Arc;

/// Builds the target dataset for a source record, replacing the default
/// primary key filter.
pub type DatasetFn<S> = Arc<dyn Fn(&S) -> Dataset + Send + Sync>;

/// Refines the target dataset after every other option has been applied.
pub type BlockFn = Arc<dyn Fn(Dataset) -> Dataset + Send + Sync>;

/// How the foreign key columns of an association are determined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum KeyOption {
    /// `"{name}_id"`
    #[default]
    Default,
    /// Explicit source columns, in the order of the target primary key.
    Columns(Vec<&'static str>),
    /// No foreign key columns; the association is loaded some other way
    /// (usually a `dataset` option).
    Custom,
}

/// Options for a many-to-one association.
///
/// # Example
///
/// ```
/// use sqlcache_assoc::AssociationOptions;
///
/// struct Lookup;
///
/// let options = AssociationOptions::<Lookup>::new()
///     .key(&["caching_model_id", "caching_model_id2"])
///     .pk_lookup(true);
/// assert_eq!(options.pk_lookup_flag(), Some(true));
/// ```
pub struct AssociationOptions<S> {
    pub(crate) key: KeyOption,
    pub(crate) primary_key: Option<Vec<&'static str>>,
    pub(crate) conditions: Option<Vec<(&'static str, Value)>>,
    pub(crate) select: Option<Vec<&'static str>>,
    pub(crate) dataset: Option<DatasetFn<S>>,
    pub(crate) block: Option<BlockFn>,
    pub(crate) pk_lookup: Option<bool>,
}

impl<S> AssociationOptions<S> {
    /// Options with every setting at its default.
    #[must_use]
    pub fn new() -> Self {
        Self {
            key: KeyOption::Default,
            primary_key: None,
            conditions: None,
            select: None,
            dataset: None,
            block: None,
            pk_lookup: None,
        }
    }

    /// Set the foreign key columns on the source model.
    #[must_use]
    pub fn key(mut self, columns: &[&'static str]) -> Self {
        self.key = KeyOption::Columns(columns.to_vec());
        self
    }

    /// Declare a custom association with no foreign key columns.
    #[must_use]
    pub fn no_key(mut self) -> Self {
        self.key = KeyOption::Custom;
        self
    }

    /// Override the target columns the foreign key refers to.
    #[must_use]
    pub fn primary_key(mut self, columns: &[&'static str]) -> Self {
        self.primary_key = Some(columns.to_vec());
        self
    }

    /// Restrict the target with `column = value` conditions.
    #[must_use]
    pub fn conditions<V: Into<Value>>(
        mut self,
        conditions: impl IntoIterator<Item = (&'static str, V)>,
    ) -> Self {
        self.conditions = Some(
            conditions
                .into_iter()
                .map(|(column, value)| (column, value.into()))
                .collect(),
        );
        self
    }

    /// Select only `columns` from the target.
    #[must_use]
    pub fn select(mut self, columns: &[&'static str]) -> Self {
        self.select = Some(columns.to_vec());
        self
    }

    /// Build the target dataset from the source record.
    #[must_use]
    pub fn dataset<F>(mut self, f: F) -> Self
    where
        F: Fn(&S) -> Dataset + Send + Sync + 'static,
    {
        self.dataset = Some(Arc::new(f));
        self
    }

    /// Refine the target dataset.
    #[must_use]
    pub fn block<F>(mut self, f: F) -> Self
    where
        F: Fn(Dataset) -> Dataset + Send + Sync + 'static,
    {
        self.block = Some(Arc::new(f));
        self
    }

    /// Force primary key cache lookups on (`true`) or off (`false`).
    ///
    /// Forcing it on skips every safety check; the caller vouches that the
    /// cached entity is what a query would have returned.
    #[must_use]
    pub fn pk_lookup(mut self, enabled: bool) -> Self {
        self.pk_lookup = Some(enabled);
        self
    }

    /// The foreign key setting.
    pub fn key_option(&self) -> &KeyOption {
        &self.key
    }

    /// The primary key override, if any.
    pub fn primary_key_override(&self) -> Option<&[&'static str]> {
        self.primary_key.as_deref()
    }

    /// The explicit `pk_lookup` setting, if any.
    pub fn pk_lookup_flag(&self) -> Option<bool> {
        self.pk_lookup
    }
}

impl<S> Default for AssociationOptions<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Clone for AssociationOptions<S> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            primary_key: self.primary_key.clone(),
            conditions: self.conditions.clone(),
            select: self.select.clone(),
            dataset: self.dataset.clone(),
            block: self.block.clone(),
            pk_lookup: self.pk_lookup,
        }
    }
}

impl<S> fmt::Debug for AssociationOptions<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssociationOptions")
            .field("key", &self.key)
            .field("primary_key", &self.primary_key)
            .field("conditions", &self.conditions)
            .field("select", &self.select)
            .field("dataset", &self.dataset.is_some())
            .field("block", &self.block.is_some())
            .field("pk_lookup", &self.pk_lookup)
            .finish()
    }
}
