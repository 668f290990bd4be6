//! Primary key lookup eligibility.
//!
//! An association may skip the database and read the target straight from the
//! target class's cache backend only when the cached entity is guaranteed to be
//! what the default query would have returned. That holds when the foreign key
//! maps one-to-one onto the target's primary key and nothing narrows or
//! reshapes the query.

use crate::definition::ManyToOne;
use sqlcache_core::Model;
use sqlcache_plugins::ModelClass;
use std::fmt;

/// Why an association cannot use primary key cache lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IneligibleReason {
    /// `pk_lookup(false)` was set.
    DisabledByOption,
    /// The source prefers prepared statements and the target has no cache.
    PreparedStatements,
    /// The association has no foreign key columns.
    CustomKey,
    /// `conditions` narrow the target.
    Conditions,
    /// `select` changes the target projection.
    Select,
    /// `dataset` replaces the target query.
    Dataset,
    /// `block` refines the target query.
    Block,
    /// The referenced columns are not the target's primary key.
    PrimaryKeyMismatch,
    /// The target class has no cache backend.
    NoCacheBackend,
}

impl IneligibleReason {
    /// Stable identifier for logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            IneligibleReason::DisabledByOption => "disabled_by_option",
            IneligibleReason::PreparedStatements => "prepared_statements",
            IneligibleReason::CustomKey => "custom_key",
            IneligibleReason::Conditions => "conditions",
            IneligibleReason::Select => "select",
            IneligibleReason::Dataset => "dataset",
            IneligibleReason::Block => "block",
            IneligibleReason::PrimaryKeyMismatch => "primary_key_mismatch",
            IneligibleReason::NoCacheBackend => "no_cache_backend",
        }
    }
}

impl fmt::Display for IneligibleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an association resolves through the target's cache backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    /// Use the cache. `forced` when `pk_lookup(true)` bypassed the checks.
    Eligible { forced: bool },
    /// Use the standard query path.
    Ineligible(IneligibleReason),
}

impl Eligibility {
    /// Check if cache lookups are used.
    pub const fn is_eligible(self) -> bool {
        matches!(self, Eligibility::Eligible { .. })
    }

    /// The reason cache lookups are not used, if any.
    pub const fn reason(self) -> Option<IneligibleReason> {
        match self {
            Eligibility::Ineligible(reason) => Some(reason),
            Eligibility::Eligible { .. } => None,
        }
    }
}

impl fmt::Display for Eligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Eligibility::Eligible { forced: true } => f.write_str("eligible (forced)"),
            Eligibility::Eligible { forced: false } => f.write_str("eligible"),
            Eligibility::Ineligible(reason) => write!(f, "ineligible: {reason}"),
        }
    }
}

/// Decide eligibility for `assoc` against its target class.
///
/// Checks run in a fixed order and the first failure wins. Pure and
/// deterministic; [`ManyToOne::eligibility`] memoizes the result.
pub fn analyze<S: Model, T: Model>(assoc: &ManyToOne<S, T>, target: &ModelClass<T>) -> Eligibility {
    let result = evaluate(assoc, target);
    tracing::debug!(
        association = assoc.name(),
        target = target.table_name(),
        eligibility = %result,
        "Primary key lookup eligibility"
    );
    result
}

fn evaluate<S: Model, T: Model>(assoc: &ManyToOne<S, T>, target: &ModelClass<T>) -> Eligibility {
    let options = assoc.options();
    match options.pk_lookup {
        Some(false) => return Eligibility::Ineligible(IneligibleReason::DisabledByOption),
        Some(true) => return Eligibility::Eligible { forced: true },
        None => {}
    }

    let has_backend = target.cache_backend().is_some();

    // A target with its own cache wins over prepared statements.
    if assoc.prepared_statements() && !has_backend {
        return Eligibility::Ineligible(IneligibleReason::PreparedStatements);
    }

    if assoc.foreign_key().is_empty() {
        return Eligibility::Ineligible(IneligibleReason::CustomKey);
    }

    if options.conditions.is_some() {
        return Eligibility::Ineligible(IneligibleReason::Conditions);
    }
    if options.select.is_some() {
        return Eligibility::Ineligible(IneligibleReason::Select);
    }
    if options.dataset.is_some() {
        return Eligibility::Ineligible(IneligibleReason::Dataset);
    }
    if options.block.is_some() {
        return Eligibility::Ineligible(IneligibleReason::Block);
    }

    let natural = target.primary_key();
    let effective = assoc.effective_primary_key();
    if effective != natural || effective.len() != assoc.foreign_key().len() {
        return Eligibility::Ineligible(IneligibleReason::PrimaryKeyMismatch);
    }

    if !has_backend {
        return Eligibility::Ineligible(IneligibleReason::NoCacheBackend);
    }

    Eligibility::Eligible { forced: false }
}
