//! Quarry Boolean Normalizer
//!
//! Rewrites filter expressions into disjunctive or conjunctive normal form
//! ahead of index selection and query planning.
//!
//! ## Architecture
//!
//! - **Expression trees**: [`Expression`] is a closed tagged union of
//!   propositions, binary AND/OR, NOT, and opaque instructions
//! - **De Morgan distribution**: [`distribute_not`] pushes a negation one
//!   connective inward and drops double negations
//! - **Normal forms**: [`disjunctive_normalize`] and [`conjunctive_normalize`]
//!   expand cross products of clauses; [`Normalizer`] adds a clause limit and
//!   a pluggable [`NodeBuilder`]

pub mod error;
pub mod expression;
pub mod normalize;

#[cfg(test)]
mod tests;

// Re-export public API
pub use error::{NormalizeError, NormalizeResult};
pub use expression::{
    collect_clauses, Expression, LogicalOperator, NodeBuilder, NormalForm, TreeBuilder,
};
pub use normalize::{
    conjunctive_normalize, disjunctive_normalize, distribute_not, Normalizer, NormalizerConfig,
};
