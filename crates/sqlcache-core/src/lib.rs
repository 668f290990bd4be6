//! Core types and traits for SQLCache Rust.
//!
//! This crate provides the foundational abstractions shared by the query,
//! plugin and association layers:
//!
//! - `Model` trait for struct <-> row mapping
//! - `Value` and `Row` for dynamically typed column data
//! - `CompositeKey` for ordered, hashable primary/foreign key tuples
//! - `Connection` trait, the seam to whatever executes SQL
//! - `Outcome` re-export from asupersync for cancel-correct operations
//! - `Cx` context for structured concurrency

// Re-export asupersync primitives for structured concurrency
pub use asupersync::{Cx, Outcome};

pub mod connection;
pub mod error;
pub mod key;
pub mod model;
pub mod row;
pub mod value;

pub use connection::Connection;
pub use error::{CacheError, CacheErrorKind, Error, QueryError, QueryErrorKind, Result, TypeError};
pub use key::CompositeKey;
pub use model::Model;
pub use row::{ColumnInfo, FromValue, Row};
pub use value::Value;
