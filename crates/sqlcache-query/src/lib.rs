//! Dataset builder for SQLCache Rust.
//!
//! `sqlcache-query` is the **query construction layer**. A [`Dataset`] is a
//! small SELECT description (table, projection, filters, limit) that renders to
//! SQL plus parameters and executes through the `Connection` trait from
//! `sqlcache-core`.
//!
//! It backs the standard association query path, the `dataset`/`block`
//! association options, and the one-time static snapshot load.

pub mod clause;
pub mod dataset;

pub use clause::{CompareOp, Filter, Limit};
pub use dataset::Dataset;
