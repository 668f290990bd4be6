//! SQL clause types (WHERE filters, LIMIT).

use sqlcache_core::Value;

/// Comparison operator for a column filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    /// SQL spelling of the operator.
    pub const fn as_sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "<>",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

/// A single WHERE condition. Conditions on a dataset are AND-ed together.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column <op> $n`
    Compare {
        column: String,
        op: CompareOp,
        value: Value,
    },
    /// Raw SQL fragment; each `?` is replaced by the next positional parameter.
    Raw { sql: String, params: Vec<Value> },
}

impl Filter {
    /// `column = value`
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Compare {
            column: column.into(),
            op: CompareOp::Eq,
            value: value.into(),
        }
    }

    /// `column <op> value`
    pub fn compare(column: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Self::Compare {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    /// Raw SQL fragment with `?` placeholders.
    pub fn raw(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self::Raw {
            sql: sql.into(),
            params,
        }
    }

    /// Render this filter, numbering placeholders after `params.len()`.
    pub fn build(&self, params: &mut Vec<Value>) -> String {
        match self {
            Filter::Compare { column, op, value } => {
                params.push(value.clone());
                format!("{} {} ${}", column, op.as_sql(), params.len())
            }
            Filter::Raw { sql, params: raw } => {
                let mut out = String::with_capacity(sql.len());
                let mut pending = raw.iter();
                for ch in sql.chars() {
                    if ch == '?' {
                        if let Some(value) = pending.next() {
                            params.push(value.clone());
                            out.push_str(&format!("${}", params.len()));
                            continue;
                        }
                    }
                    out.push(ch);
                }
                out
            }
        }
    }
}

/// LIMIT clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit(pub u64);
