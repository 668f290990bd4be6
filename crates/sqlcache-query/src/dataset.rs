//! SELECT dataset builder.

use crate::clause::{CompareOp, Filter, Limit};
use asupersync::{Cx, Outcome};
use sqlcache_core::{Connection, Error, Model, Row, Value};

/// A SELECT query over a single table.
///
/// Datasets are plain values: every builder method consumes and returns the
/// dataset, so association options can hand one to a closure and get a
/// refined one back.
///
/// # Example
///
/// ```
/// use sqlcache_query::{CompareOp, Dataset};
///
/// let (sql, params) = Dataset::new("caching_models")
///     .filter_eq("id", 1_i64)
///     .filter("a", CompareOp::Gt, 1_i64)
///     .limit(1)
///     .build();
/// assert_eq!(sql, "SELECT * FROM caching_models WHERE id = $1 AND a > $2 LIMIT 1");
/// assert_eq!(params.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    table: String,
    /// Columns to select (empty = all)
    columns: Vec<String>,
    filters: Vec<Filter>,
    limit: Option<Limit>,
}

impl Dataset {
    /// Create a dataset selecting every row of `table`.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            filters: Vec::new(),
            limit: None,
        }
    }

    /// Create a dataset over a model's table.
    pub fn of<M: Model>() -> Self {
        Self::new(M::TABLE_NAME)
    }

    /// Select specific columns.
    pub fn select(mut self, cols: &[&str]) -> Self {
        self.columns = cols.iter().map(|&s| s.to_string()).collect();
        self
    }

    /// Add an AND-ed `column <op> value` condition.
    pub fn filter(mut self, column: &str, op: CompareOp, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::compare(column, op, value));
        self
    }

    /// Add an AND-ed `column = value` condition.
    pub fn filter_eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    /// Add an AND-ed raw SQL condition with `?` placeholders.
    pub fn where_raw(mut self, sql: &str, params: Vec<Value>) -> Self {
        self.filters.push(Filter::raw(sql, params));
        self
    }

    /// Set LIMIT.
    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(Limit(n));
        self
    }

    /// The table this dataset reads from.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The projected columns (empty = all).
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The WHERE conditions, in order.
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Build the SQL string and parameters.
    pub fn build(&self) -> (String, Vec<Value>) {
        let mut sql = String::from("SELECT ");
        let mut params = Vec::new();

        if self.columns.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.columns.join(", "));
        }

        sql.push_str(" FROM ");
        sql.push_str(&self.table);

        if !self.filters.is_empty() {
            let clauses: Vec<String> = self
                .filters
                .iter()
                .map(|f| f.build(&mut params))
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        if let Some(Limit(n)) = self.limit {
            sql.push_str(&format!(" LIMIT {n}"));
        }

        (sql, params)
    }

    /// Execute the dataset and return every row.
    pub async fn rows<C: Connection>(&self, cx: &Cx, conn: &C) -> Outcome<Vec<Row>, Error> {
        let (sql, params) = self.build();
        tracing::trace!(sql = %sql, params = params.len(), "Dataset SQL");
        conn.query(cx, &sql, &params).await
    }

    /// Execute the dataset and decode every row as `M`.
    pub async fn all<M: Model, C: Connection>(&self, cx: &Cx, conn: &C) -> Outcome<Vec<M>, Error> {
        self.rows(cx, conn).await.and_then(|rows| {
            let mut models = Vec::with_capacity(rows.len());
            for row in &rows {
                match M::from_row(row) {
                    Ok(model) => models.push(model),
                    Err(e) => return Outcome::Err(e),
                }
            }
            Outcome::Ok(models)
        })
    }

    /// Execute the dataset with `LIMIT 1` and decode the first row as `M`.
    pub async fn first<M: Model, C: Connection>(
        &self,
        cx: &Cx,
        conn: &C,
    ) -> Outcome<Option<M>, Error> {
        let (sql, params) = self.clone().limit(1).build();
        tracing::trace!(sql = %sql, params = params.len(), "Dataset SQL");
        let row = conn.query_one(cx, &sql, &params).await;

        row.and_then(|opt_row| match opt_row {
            Some(row) => match M::from_row(&row) {
                Ok(model) => Outcome::Ok(Some(model)),
                Err(e) => Outcome::Err(e),
            },
            None => Outcome::Ok(None),
        })
    }
}
