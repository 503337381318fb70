//! Tests for the Quarry operator resolver
//!
//! Shared fixtures live here; each `test_*` module covers one layer of the
//! resolver, bottom-up.

#![allow(clippy::assertions_on_constants)]

mod test_property_based;
mod test_scope_resolution;

use crate::conversion::ConversionGraph;
use crate::operator::{Operator, OperatorDefinition, OperatorId};
use crate::types::Signature;
use std::sync::Arc;

/// Small numeric tower used across the resolver tests
///
/// ```text
/// Integer -> Long -> Decimal -> Money      (widening)
/// Decimal -> Long -> Integer               (narrowing)
/// Integer, Long, Decimal, String is-a Scalar; ShortString is-a String
/// ```
pub(crate) fn numeric_catalog() -> ConversionGraph {
    let mut catalog = ConversionGraph::new();

    for data_type in ["Integer", "Long", "Decimal", "String"] {
        catalog.declare_subtype(data_type, "Scalar");
    }
    catalog.declare_subtype("ShortString", "String");
    catalog.add_type("Money");
    catalog.add_type("Boolean");

    catalog.add_conversion("Integer", "Long", false).unwrap();
    catalog.add_conversion("Long", "Decimal", false).unwrap();
    catalog.add_conversion("Decimal", "Money", false).unwrap();
    catalog.add_conversion("Decimal", "Long", true).unwrap();
    catalog.add_conversion("Long", "Integer", true).unwrap();

    catalog
}

pub(crate) fn unary(data_type: &str) -> Signature {
    Signature::of_values([data_type])
}

pub(crate) fn binary(left: &str, right: &str) -> Signature {
    Signature::of_values([left, right])
}

pub(crate) fn operator(id: u64, name: &str, signature: Signature) -> Arc<Operator> {
    Arc::new(Operator::new(
        OperatorId(id),
        OperatorDefinition::new(name, signature),
    ))
}
