//! Model trait for ORM-style struct mapping.
//!
//! The `Model` trait defines the contract for structs that can be mapped to
//! database tables. Source records of an association and the target entities
//! it resolves to are both `Model`s.

use crate::Result;
use crate::row::Row;
use crate::value::Value;

/// Trait for types that can be mapped to database tables.
///
/// # Example
///
/// ```ignore
/// use sqlcache_core::{Model, Row, Value, Result};
///
/// struct Team {
///     id: i64,
///     name: String,
/// }
///
/// impl Model for Team {
///     const TABLE_NAME: &'static str = "teams";
///     const PRIMARY_KEY: &'static [&'static str] = &["id"];
///
///     fn to_row(&self) -> Vec<(&'static str, Value)> {
///         vec![("id", Value::BigInt(self.id)), ("name", self.name.clone().into())]
///     }
///
///     fn from_row(row: &Row) -> Result<Self> {
///         Ok(Self { id: row.get_named("id")?, name: row.get_named("name")? })
///     }
/// }
/// ```
pub trait Model: Sized + Send + Sync + 'static {
    /// The name of the database table.
    const TABLE_NAME: &'static str;

    /// The natural primary key column name(s), in declared order.
    const PRIMARY_KEY: &'static [&'static str];

    /// Convert this model instance to a row of values.
    fn to_row(&self) -> Vec<(&'static str, Value)>;

    /// Construct a model instance from a database row.
    #[allow(clippy::result_large_err)]
    fn from_row(row: &Row) -> Result<Self>;

    /// Read a single column value.
    ///
    /// The default scans `to_row()`; models on hot paths can override it with
    /// a direct field match.
    fn column_value(&self, column: &str) -> Option<Value> {
        self.to_row()
            .into_iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value)
    }
}
