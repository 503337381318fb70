//! Tests for scope-layered resolution and diagnostic mapping

use super::{binary, numeric_catalog, unary};
use crate::binding::{OperatorBindingContext, ResolutionPath, Scope};
use crate::error::ResolutionError;
use crate::operator::OperatorDefinition;
use crate::resolution::{resolution_error, resolve_operator, OperatorCatalog};
use crate::types::Signature;
use crate::resolve_call;
use miette::SourceSpan;
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn path(levels: &[&[&str]]) -> ResolutionPath {
    levels
        .iter()
        .map(|libraries| libraries.iter().copied().collect::<Scope>())
        .collect()
}

fn define(catalog: &OperatorCatalog, name: &str, library: Option<&str>, signature: Signature) {
    let mut definition = OperatorDefinition::new(name, signature);
    if let Some(library) = library {
        definition = definition.in_library(library);
    }
    catalog.add_operator(definition).unwrap();
}

fn bound_name(
    catalog: &OperatorCatalog,
    name: &str,
    call: Signature,
    resolution_path: ResolutionPath,
) -> Result<String, ResolutionError> {
    let types = numeric_catalog();
    let context = resolve_call(catalog, &types, name, call, resolution_path, false)?;
    Ok(context.operator().unwrap().name.clone())
}

#[test]
fn test_inner_scope_shadows_outer_scope() {
    let catalog = OperatorCatalog::new();
    define(&catalog, "Inner.F", Some("Inner"), unary("Integer"));
    define(&catalog, "Outer.F", Some("Outer"), unary("Long"));

    let types = numeric_catalog();
    let context = resolve_call(
        &catalog,
        &types,
        "F",
        unary("Integer"),
        path(&[&["Inner"], &["Outer"]]),
        false,
    )
    .unwrap();

    assert_eq!(context.operator().unwrap().name, "Inner.F");
    assert!(context.matches().is_exact());
    assert!(!context.matches().is_ambiguous());
    assert_eq!(
        context.operator_names().iter().cloned().collect::<Vec<_>>(),
        vec!["Inner.F".to_string()]
    );
}

#[test]
fn test_identical_signatures_resolved_by_path_order() {
    let catalog = OperatorCatalog::new();
    define(&catalog, "Inner.F", Some("Inner"), unary("Integer"));
    define(&catalog, "Outer.F", Some("Outer"), unary("Integer"));

    assert_eq!(
        bound_name(&catalog, "F", unary("Integer"), path(&[&["Inner"], &["Outer"]])),
        Ok("Inner.F".to_string())
    );
    assert_eq!(
        bound_name(&catalog, "F", unary("Integer"), path(&[&["Outer"], &["Inner"]])),
        Ok("Outer.F".to_string())
    );
}

#[test]
fn test_partial_match_accepted_after_all_levels() {
    let catalog = OperatorCatalog::new();
    define(&catalog, "Inner.G", Some("Inner"), unary("Long"));
    define(&catalog, "Outer.G", Some("Outer"), unary("Decimal"));

    assert_eq!(
        bound_name(&catalog, "G", unary("Integer"), path(&[&["Inner"], &["Outer"]])),
        Ok("Inner.G".to_string())
    );
}

#[test]
fn test_partial_match_across_levels() {
    let catalog = OperatorCatalog::new();
    // The only convertible candidate lives in the outer level
    define(&catalog, "Inner.G", Some("Inner"), unary("String"));
    define(&catalog, "Outer.G", Some("Outer"), unary("Decimal"));

    assert_eq!(
        bound_name(&catalog, "G", unary("Integer"), path(&[&["Inner"], &["Outer"]])),
        Ok("Outer.G".to_string())
    );
}

#[test]
fn test_library_less_operators_visible_everywhere() {
    let catalog = OperatorCatalog::new();
    define(&catalog, "Add", None, binary("Integer", "Integer"));

    assert_eq!(
        bound_name(
            &catalog,
            "Add",
            binary("Integer", "Integer"),
            path(&[&["Sales"]])
        ),
        Ok("Add".to_string())
    );
}

#[test]
fn test_exact_match_outside_path_found_by_fallback() {
    let catalog = OperatorCatalog::new();
    define(&catalog, "Hidden.H", Some("Hidden"), unary("Integer"));

    assert_eq!(
        bound_name(&catalog, "H", unary("Integer"), path(&[&["Other"]])),
        Ok("Hidden.H".to_string())
    );
}

#[test]
fn test_partial_match_outside_path_is_not_bound() {
    let catalog = OperatorCatalog::new();
    define(&catalog, "Hidden.P", Some("Hidden"), unary("Long"));

    let error = bound_name(&catalog, "P", unary("Integer"), path(&[&["Other"]])).unwrap_err();
    assert!(matches!(error, ResolutionError::NoMatch { .. }));
}

#[test]
fn test_empty_path_sees_every_library() {
    let catalog = OperatorCatalog::new();
    define(&catalog, "Sales.Total", Some("Sales"), unary("Long"));

    assert_eq!(
        bound_name(&catalog, "Total", unary("Integer"), ResolutionPath::default()),
        Ok("Sales.Total".to_string())
    );
}

#[test]
fn test_ambiguous_operator_name() {
    let catalog = OperatorCatalog::new();
    define(&catalog, "Sales.Total", Some("Sales"), unary("Long"));
    define(&catalog, "HR.Total", Some("HR"), unary("Long"));

    let error = bound_name(&catalog, "Total", unary("Integer"), path(&[&["Sales", "HR"]]))
        .unwrap_err();

    assert_eq!(
        error,
        ResolutionError::AmbiguousOperatorName {
            operator_name: "Total".to_string(),
            candidates: vec!["HR.Total".to_string(), "Sales.Total".to_string()],
            span: None,
        }
    );
    assert_eq!(
        error.to_string(),
        "Ambiguous operator name: Total could refer to HR.Total, Sales.Total"
    );

    // Qualifying the name settles it
    assert_eq!(
        bound_name(
            &catalog,
            "Sales.Total",
            unary("Integer"),
            path(&[&["Sales", "HR"]])
        ),
        Ok("Sales.Total".to_string())
    );
}

#[test]
fn test_ambiguous_call() {
    let catalog = OperatorCatalog::new();
    define(&catalog, "Pair", None, binary("Long", "Integer"));
    define(&catalog, "Pair", None, binary("Integer", "Long"));

    let error = bound_name(
        &catalog,
        "Pair",
        binary("Integer", "Integer"),
        ResolutionPath::default(),
    )
    .unwrap_err();

    assert_eq!(
        error,
        ResolutionError::AmbiguousCall {
            operator_name: "Pair".to_string(),
            signature: "(Integer, Integer)".to_string(),
            candidates: vec![
                "Pair(Long, Integer)".to_string(),
                "Pair(Integer, Long)".to_string(),
            ],
            span: None,
        }
    );
}

#[test]
fn test_invalid_operator_call_reports_failing_arguments() {
    let catalog = OperatorCatalog::new();
    define(&catalog, "Concat", None, binary("String", "String"));

    let error = bound_name(
        &catalog,
        "Concat",
        binary("String", "Integer"),
        ResolutionPath::default(),
    )
    .unwrap_err();

    assert_eq!(
        error,
        ResolutionError::InvalidOperatorCall {
            operator_name: "Concat".to_string(),
            signature: "(String, Integer)".to_string(),
            closest: "(String, String)".to_string(),
            failing_arguments: vec![1],
            span: None,
        }
    );
}

#[test]
fn test_no_match_carries_span() {
    let catalog = OperatorCatalog::new();
    let types = numeric_catalog();
    let context =
        OperatorBindingContext::new("Missing", unary("Integer")).with_span(SourceSpan::from((5, 3)));

    let error = catalog.resolve_call(&types, context).unwrap_err();
    assert_eq!(
        error,
        ResolutionError::NoMatch {
            operator_name: "Missing".to_string(),
            signature: "(Integer)".to_string(),
            span: Some(SourceSpan::from((5, 3))),
        }
    );
    assert_eq!(error.operator_name(), "Missing");
}

#[test]
fn test_exact_only_requests() {
    let catalog = OperatorCatalog::new();
    define(&catalog, "Add", None, unary("Long"));
    let types = numeric_catalog();

    let exact = resolve_call(
        &catalog,
        &types,
        "Add",
        unary("Integer"),
        ResolutionPath::default(),
        true,
    );
    assert!(matches!(exact, Err(ResolutionError::NoMatch { .. })));

    let relaxed = resolve_call(
        &catalog,
        &types,
        "Add",
        unary("Integer"),
        ResolutionPath::default(),
        false,
    );
    assert!(relaxed.is_ok());
}

#[test]
fn test_resolved_context_has_no_error() {
    let catalog = OperatorCatalog::new();
    define(&catalog, "Add", None, unary("Integer"));
    let types = numeric_catalog();

    let mut context = OperatorBindingContext::new("Add", unary("Integer"));
    resolve_operator(catalog.lock().registry(), &types, &mut context);

    assert!(context.is_resolved());
    assert_eq!(resolution_error(&context), None);
}

#[test]
fn test_rebinding_same_operator_is_a_no_op() {
    let catalog = OperatorCatalog::new();
    let operator = catalog
        .add_operator(OperatorDefinition::new("Add", unary("Integer")))
        .unwrap();
    let other = catalog
        .add_operator(OperatorDefinition::new("Add", unary("Long")))
        .unwrap();

    let mut context = OperatorBindingContext::new("Add", unary("Integer"));
    assert!(context.bind(&operator));
    assert!(!context.bind(&Arc::clone(&operator)));
    assert!(context.bind(&other));
    assert_eq!(context.operator().map(|bound| bound.id), Some(other.id));
}

#[test]
fn test_derived_context_starts_fresh() {
    let catalog = OperatorCatalog::new();
    define(&catalog, "Add", None, unary("Integer"));
    let types = numeric_catalog();

    let resolved = resolve_call(
        &catalog,
        &types,
        "Add",
        unary("Integer"),
        path(&[&["Sales"]]),
        false,
    )
    .unwrap();
    let derived = resolved.derive();

    assert!(!derived.is_resolved());
    assert!(derived.matches().is_empty());
    assert_eq!(derived.resolution_path(), resolved.resolution_path());
    assert_eq!(derived.call_signature(), resolved.call_signature());
}

#[test]
fn test_invisible_better_candidate_does_not_hide_visible_one() {
    // Hidden.F(Long) beats Vis.F(Decimal) on path length but is out of scope
    for hidden_first in [true, false] {
        let catalog = OperatorCatalog::new();
        let hidden = || define(&catalog, "Hidden.F", Some("Hidden"), unary("Long"));
        let visible = || define(&catalog, "Vis.F", Some("Vis"), unary("Decimal"));
        if hidden_first {
            hidden();
            visible();
        } else {
            visible();
            hidden();
        }

        assert_eq!(
            bound_name(&catalog, "F", unary("Integer"), path(&[&["Vis"]])),
            Ok("Vis.F".to_string()),
            "hidden registered first: {hidden_first}"
        );
    }
}
