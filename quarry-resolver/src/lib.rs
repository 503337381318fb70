//! Quarry Operator Resolver
//!
//! Binds calls to overloaded operator names against the registered overloads,
//! honouring conversion costs and library visibility.
//!
//! ## Architecture
//!
//! - **Signature & Conversion Model**: parameter lists with passing modifiers,
//!   and a [`TypeCatalog`] oracle answering subtype and conversion-path queries
//! - **Candidate Registry**: one [`OperatorMap`] per operator name, keyed by
//!   signature so duplicate overloads are rejected at registration
//! - **Match Engine**: scores candidates per argument, keeps the running best
//!   narrowing score and shortest path, and derives the winner or ambiguity
//! - **Scope-Layered Resolution**: walks the resolution path narrowest first,
//!   letting an exact match in a nearer scope shadow farther ones
//!
//! ## Integration
//!
//! The expression compiler owns an [`OperatorCatalog`], registers operators as
//! the schema is loaded, and calls [`OperatorCatalog::resolve_call`] for each
//! operator application it binds. Failures come back as [`ResolutionError`]
//! diagnostics carrying the call-site span.

pub mod binding;
pub mod cache;
pub mod conversion;
pub mod error;
pub mod matching;
pub mod operator;
pub mod registry;
pub mod resolution;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export public API
pub use binding::{OperatorBindingContext, ResolutionPath, Scope};
pub use cache::{CacheStats, ResolutionCache, ResolutionKey};
pub use conversion::{ConversionContext, ConversionGraph, ConversionStep, Cost, TypeCatalog};
pub use error::{
    ConversionError, RegistryError, ResolutionError, ResolverError, ResolverResult,
};
pub use matching::{OperatorMatch, OperatorMatches};
pub use operator::{Operator, OperatorDefinition, OperatorId, OperatorSignature};
pub use registry::{OperatorMap, OperatorRegistry};
pub use resolution::{resolution_error, resolve_operator, CatalogState, OperatorCatalog};
pub use types::{Modifier, Parameter, Signature, TypeId};

/// Resolve one call against a catalog
///
/// Convenience wrapper building the binding context for the common case.
pub fn resolve_call(
    operators: &OperatorCatalog,
    types: &dyn TypeCatalog,
    operator_name: &str,
    call_signature: Signature,
    resolution_path: ResolutionPath,
    exact_only: bool,
) -> Result<OperatorBindingContext, ResolutionError> {
    let context = OperatorBindingContext::new(operator_name, call_signature)
        .with_path(resolution_path)
        .exact_only(exact_only);
    operators.resolve_call(types, context)
}
