//! Error types for the Quarry operator resolver
//!
//! Following the miette patterns used across the compiler for consistent
//! diagnostic reporting. Registry and catalog mutation errors are raised to
//! the caller immediately; resolution failures are only produced at the
//! `resolve_call` boundary, the match engine itself reports them as an
//! absent best match.

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

/// Main resolver error type
#[derive(Error, Diagnostic, Debug)]
pub enum ResolverError {
    #[error("Operator registration failed")]
    #[diagnostic(code(quarry::resolver::registry_failed))]
    Registry(#[from] RegistryError),

    #[error("Type conversion catalog update failed")]
    #[diagnostic(code(quarry::resolver::conversion_failed))]
    Conversion(#[from] ConversionError),

    #[error("Operator resolution failed")]
    #[diagnostic(code(quarry::resolver::resolution_failed))]
    Resolution(#[from] ResolutionError),
}

pub type ResolverResult<T> = Result<T, ResolverError>;

/// Errors raised while mutating an operator map
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Duplicate signature: {operator_name}{signature} is already registered")]
    #[diagnostic(
        code(quarry::resolver::registry::duplicate_signature),
        help("Each overload of an operator must differ in parameter types or modifiers")
    )]
    DuplicateSignature {
        operator_name: String,
        signature: String,
    },

    #[error("Signature not found: {operator_name}{signature} is not registered")]
    #[diagnostic(
        code(quarry::resolver::registry::signature_not_found),
        help("Check the operator name and the exact parameter types and modifiers")
    )]
    SignatureNotFound {
        operator_name: String,
        signature: String,
    },
}

/// Errors raised while building the type conversion catalog
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("Duplicate conversion: {from_type} to {to_type} is already declared")]
    #[diagnostic(
        code(quarry::resolver::conversion::duplicate),
        help("A pair of types can carry at most one direct conversion")
    )]
    DuplicateConversion { from_type: String, to_type: String },
}

/// Errors reported when a call cannot be bound to a single operator
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error(
        "Ambiguous operator name: {operator_name} could refer to {}",
        .candidates.join(", ")
    )]
    #[diagnostic(
        code(quarry::resolver::ambiguous_operator_name),
        help("Qualify the operator name with its library")
    )]
    AmbiguousOperatorName {
        operator_name: String,
        candidates: Vec<String>,
        #[label("ambiguous operator name")]
        span: Option<SourceSpan>,
    },

    #[error("No operator {operator_name} matches the call signature {signature}")]
    #[diagnostic(
        code(quarry::resolver::no_match),
        help("Check the argument count and types, or register a matching overload")
    )]
    NoMatch {
        operator_name: String,
        signature: String,
        #[label("no matching operator")]
        span: Option<SourceSpan>,
    },

    #[error(
        "Ambiguous call: {operator_name}{signature} matches {} equally well",
        .candidates.join(", ")
    )]
    #[diagnostic(
        code(quarry::resolver::ambiguous_call),
        help("Convert an argument explicitly so that one overload is strictly better")
    )]
    AmbiguousCall {
        operator_name: String,
        signature: String,
        candidates: Vec<String>,
        #[label("ambiguous call")]
        span: Option<SourceSpan>,
    },

    #[error(
        "Invalid operator call: {operator_name}{signature}, closest candidate is {operator_name}{closest}"
    )]
    #[diagnostic(
        code(quarry::resolver::invalid_operator_call),
        help("The arguments at the reported positions cannot be converted to the candidate's parameter types")
    )]
    InvalidOperatorCall {
        operator_name: String,
        signature: String,
        closest: String,
        failing_arguments: Vec<usize>,
        #[label("invalid call")]
        span: Option<SourceSpan>,
    },
}

impl ResolutionError {
    /// Name of the operator the failing call referred to
    pub fn operator_name(&self) -> &str {
        match self {
            Self::AmbiguousOperatorName { operator_name, .. }
            | Self::NoMatch { operator_name, .. }
            | Self::AmbiguousCall { operator_name, .. }
            | Self::InvalidOperatorCall { operator_name, .. } => operator_name,
        }
    }
}
