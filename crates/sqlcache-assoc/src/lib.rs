//! Many-to-one associations for SQLCache Rust.
//!
//! A [`ManyToOne`] association normally loads its target with a primary key
//! query. When the target class has a cache backend and the association is a
//! plain foreign key to primary key mapping, the target is read from the cache
//! instead and the database is never consulted:
//!
//! - [`analyze`] decides, once per definition, whether that is sound
//! - [`ManyToOne::resolve`] dispatches to the keyed cache, the static snapshot
//!   or the standard query
//! - [`Associated`] memoizes the result on a source record
//!
//! Eligibility can be forced either way with [`AssociationOptions::pk_lookup`].

pub mod definition;
pub mod dispatch;
pub mod eligibility;
pub mod options;
pub mod slot;


pub use definition::ManyToOne;
pub use eligibility::{Eligibility, IneligibleReason, analyze};
pub use options::{AssociationOptions, BlockFn, DatasetFn, KeyOption};
pub use slot::Associated;
