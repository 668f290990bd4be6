//! Database connection trait.
//!
//! [`Connection`] is the seam between this workspace and whatever actually
//! talks to the database. The association layer only ever reads, so the trait
//! is limited to queries. All operations integrate with asupersync's
//! structured concurrency via `Cx` for cancellation and timeout handling.

use crate::row::Row;
use crate::value::Value;
use asupersync::{Cx, Outcome};

/// A database connection capable of executing queries.
///
/// Implementations must be `Send + Sync` for use across async boundaries.
///
/// # Example
///
/// ```rust,ignore
/// let rows = conn
///     .query(&cx, "SELECT * FROM teams WHERE id = $1 LIMIT 1", &[Value::BigInt(1)])
///     .await;
/// ```
pub trait Connection: Send + Sync {
    /// Execute a query and return all rows.
    fn query(
        &self,
        cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<Vec<Row>, crate::Error>> + Send;

    /// Execute a query and return the first row, if any.
    fn query_one(
        &self,
        cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<Option<Row>, crate::Error>> + Send {
        async move {
            match self.query(cx, sql, params).await {
                Outcome::Ok(rows) => Outcome::Ok(rows.into_iter().next()),
                Outcome::Err(e) => Outcome::Err(e),
                Outcome::Cancelled(r) => Outcome::Cancelled(r),
                Outcome::Panicked(p) => Outcome::Panicked(p),
            }
        }
    }
}
