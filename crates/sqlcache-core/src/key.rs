//! Ordered composite keys for primary key and foreign key lookups.
//!
//! A `CompositeKey` is the tuple of column values that identifies a row. It is
//! used both to index static snapshots and to build keyed cache keys, so two
//! keys built from different sources (a source record's foreign key columns,
//! a target row's primary key columns) must compare equal whenever the
//! database would consider them equal:
//!
//! - integer widths are widened to `BigInt` on construction
//! - floats compare by bit pattern, which keeps `Eq` and `Hash` consistent
//! - order matters: `(1, 2)` and `(2, 1)` are different keys
//!
//! The `Display` form is the keyed cache encoding and is injective: integers
//! are written bare, every other component carries a type tag, and `\` and
//! `,` inside a component are backslash-escaped. `(1, 2)` renders as `1,2`,
//! `("x,y", "z")` as `s:x\,y,s:z`.

use crate::model::Model;
use crate::value::Value;
use std::fmt;
use std::hash::{Hash, Hasher};

/// An ordered tuple of non-NULL key values.
#[derive(Debug, Clone)]
pub struct CompositeKey {
    values: Vec<Value>,
}

impl CompositeKey {
    /// Build a key from values in column order.
    ///
    /// Returns `None` when the tuple is empty or any component is NULL; such a
    /// key can never match a stored row.
    pub fn new(values: impl IntoIterator<Item = Value>) -> Option<Self> {
        let values: Vec<Value> = values.into_iter().map(Value::widened).collect();
        if values.is_empty() || values.iter().any(Value::is_null) {
            return None;
        }
        Some(Self { values })
    }

    /// Build a single-column key.
    pub fn single(value: impl Into<Value>) -> Option<Self> {
        Self::new([value.into()])
    }

    /// Read `columns` from `model` in order and build a key from them.
    ///
    /// Absent columns count as NULL.
    pub fn from_model<M: Model>(model: &M, columns: &[&str]) -> Option<Self> {
        let mut values = Vec::with_capacity(columns.len());
        for column in columns {
            values.push(model.column_value(column)?);
        }
        Self::new(values)
    }

    /// The key components in column order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Number of key components.
    pub fn arity(&self) -> usize {
        self.values.len()
    }
}

impl PartialEq for CompositeKey {
    fn eq(&self, other: &Self) -> bool {
        self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .zip(&other.values)
                .all(|(a, b)| value_eq(a, b))
    }
}

impl Eq for CompositeKey {}

impl Hash for CompositeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.values.len().hash(state);
        for v in &self.values {
            hash_value(v, state);
        }
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write_component(f, v)?;
        }
        Ok(())
    }
}

fn write_component(f: &mut fmt::Formatter<'_>, v: &Value) -> fmt::Result {
    match v {
        Value::TinyInt(_) | Value::SmallInt(_) | Value::Int(_) | Value::BigInt(_) => {
            write!(f, "{v}")
        }
        Value::Double(x) => write!(f, "f:{:016x}", x.to_bits()),
        Value::Null => f.write_str("null"),
        Value::Bool(b) => write!(f, "b:{b}"),
        Value::Decimal(s) => {
            f.write_str("d:")?;
            write_escaped(f, s)
        }
        Value::Text(s) => {
            f.write_str("s:")?;
            write_escaped(f, s)
        }
        Value::Bytes(_) => write!(f, "x:{v}"),
        Value::Uuid(_) => write!(f, "u:{v}"),
        Value::Json(j) => {
            f.write_str("j:")?;
            write_escaped(f, &j.to_string())
        }
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    for ch in s.chars() {
        if matches!(ch, '\\' | ',') {
            f.write_str("\\")?;
        }
        write!(f, "{ch}")?;
    }
    Ok(())
}

fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Double(x), Value::Double(y)) => x.to_bits() == y.to_bits(),
        _ => a == b,
    }
}

fn hash_value(v: &Value, hasher: &mut impl Hasher) {
    match v {
        Value::Null => 0u8.hash(hasher),
        Value::Bool(b) => {
            1u8.hash(hasher);
            b.hash(hasher);
        }
        // Widened on construction, kept for completeness.
        Value::TinyInt(i) => {
            5u8.hash(hasher);
            i64::from(*i).hash(hasher);
        }
        Value::SmallInt(i) => {
            5u8.hash(hasher);
            i64::from(*i).hash(hasher);
        }
        Value::Int(i) => {
            5u8.hash(hasher);
            i64::from(*i).hash(hasher);
        }
        Value::BigInt(i) => {
            5u8.hash(hasher);
            i.hash(hasher);
        }
        Value::Double(f) => {
            7u8.hash(hasher);
            f.to_bits().hash(hasher);
        }
        Value::Decimal(s) => {
            8u8.hash(hasher);
            s.hash(hasher);
        }
        Value::Text(s) => {
            9u8.hash(hasher);
            s.hash(hasher);
        }
        Value::Bytes(b) => {
            10u8.hash(hasher);
            b.hash(hasher);
        }
        Value::Uuid(u) => {
            15u8.hash(hasher);
            u.hash(hasher);
        }
        Value::Json(j) => {
            16u8.hash(hasher);
            j.to_string().hash(hasher);
        }
    }
}
