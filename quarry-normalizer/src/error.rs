//! Error types for the Quarry boolean normalizer

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised by budgeted normalization
///
/// The unbudgeted entry points cannot fail.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Expression too complex: expansion would produce {clauses} clauses (limit {limit})")]
    #[diagnostic(
        code(quarry::normalizer::too_complex),
        help("Simplify the filter, or raise the clause limit of the normalizer")
    )]
    TooComplex { clauses: usize, limit: usize },
}

pub type NormalizeResult<T> = Result<T, NormalizeError>;
