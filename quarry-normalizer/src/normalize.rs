//! De Morgan distribution and normal-form expansion
//!
//! Normalization walks the tree top-down. Each node first has its negation
//! pushed inward ([`distribute_not`]); a node joined by the target form's
//! outer connective is rebuilt from its normalized operands, and a node
//! joined by the inner connective is expanded into the cross product of its
//! operands' clauses.
//!
//! The expansion is exponential in the worst case: `AND` of `n` binary `OR`s
//! yields `2^n` clauses. [`Normalizer`] can be given a clause limit to fail
//! fast instead; the free functions are unbounded.

use crate::error::{NormalizeError, NormalizeResult};
use crate::expression::{
    collect_clauses, Expression, LogicalOperator, NodeBuilder, NormalForm, TreeBuilder,
};
use std::convert::Infallible;
use tracing::{debug, trace};

/// Push a top-level negation inward using De Morgan's laws
///
/// Only a `NOT` at the root is rewritten; nested negations are handled as
/// the normalizer reaches them. Double negations are removed. A negated
/// proposition is returned unchanged.
pub fn distribute_not<L>(expression: Expression<L>) -> Expression<L> {
    distribute_not_with(&TreeBuilder, expression)
}

/// Rewrite into an OR of AND-clauses
pub fn disjunctive_normalize<L: Clone>(expression: Expression<L>) -> Expression<L> {
    unbounded(&TreeBuilder, expression, NormalForm::Disjunctive)
}

/// Rewrite into an AND of OR-clauses
pub fn conjunctive_normalize<L: Clone>(expression: Expression<L>) -> Expression<L> {
    unbounded(&TreeBuilder, expression, NormalForm::Conjunctive)
}

fn unbounded<L: Clone, B: NodeBuilder<L>>(
    builder: &B,
    expression: Expression<L>,
    form: NormalForm,
) -> Expression<L> {
    let admit = |_: usize| Ok::<(), Infallible>(());
    match normalize_with(builder, expression, form, &admit) {
        Ok(normalized) => normalized,
        Err(never) => match never {},
    }
}

fn distribute_not_with<L, B>(builder: &B, expression: Expression<L>) -> Expression<L>
where
    B: NodeBuilder<L>,
{
    let operand = match expression {
        Expression::Not(operand) => operand,
        other => return other,
    };

    match *operand {
        Expression::Not(inner) => distribute_not_with(builder, *inner),
        Expression::Or(left, right) => builder.binary(
            LogicalOperator::And,
            distribute_not_with(builder, builder.negate(*left)),
            distribute_not_with(builder, builder.negate(*right)),
        ),
        Expression::And(left, right) => builder.binary(
            LogicalOperator::Or,
            distribute_not_with(builder, builder.negate(*left)),
            distribute_not_with(builder, builder.negate(*right)),
        ),
        other => Expression::Not(Box::new(other)),
    }
}

fn normalize_with<L, B, E>(
    builder: &B,
    expression: Expression<L>,
    form: NormalForm,
    admit: &impl Fn(usize) -> Result<(), E>,
) -> Result<Expression<L>, E>
where
    L: Clone,
    B: NodeBuilder<L>,
{
    let expression = distribute_not_with(builder, expression);
    let (operator, left, right) = match expression.into_binary() {
        Ok(parts) => parts,
        Err(proposition) => return Ok(proposition),
    };

    let left = normalize_with(builder, left, form, admit)?;
    let right = normalize_with(builder, right, form, admit)?;

    if operator == form.outer() {
        return Ok(builder.binary(operator, left, right));
    }

    expand(builder, &left, &right, form, admit)
}

/// Distribute the inner connective over both operands' clause lists
fn expand<L, B, E>(
    builder: &B,
    left: &Expression<L>,
    right: &Expression<L>,
    form: NormalForm,
    admit: &impl Fn(usize) -> Result<(), E>,
) -> Result<Expression<L>, E>
where
    L: Clone,
    B: NodeBuilder<L>,
{
    let outer = form.outer();
    let inner = form.inner();
    let left_clauses = collect_clauses(left, outer);
    let right_clauses = collect_clauses(right, outer);
    let clauses = left_clauses.len().saturating_mul(right_clauses.len());

    admit(clauses)?;
    trace!(
        %form,
        left = left_clauses.len(),
        right = right_clauses.len(),
        clauses,
        "expanding clause cross product"
    );

    // Every clause is cloned into each product it takes part in
    let mut products = left_clauses.iter().flat_map(|&left_clause| {
        right_clauses
            .iter()
            .map(move |&right_clause| {
                builder.binary(inner, left_clause.clone(), right_clause.clone())
            })
    });

    let Some(first) = products.next() else {
        return Ok(builder.binary(inner, left.clone(), right.clone()));
    };
    Ok(products.fold(first, |normalized, product| {
        builder.binary(outer, normalized, product)
    }))
}

/// Normalizer settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizerConfig {
    /// Largest cross product a single expansion may produce; `None` is unbounded
    pub clause_limit: Option<usize>,
}

impl NormalizerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clause_limit(mut self, limit: usize) -> Self {
        self.clause_limit = Some(limit);
        self
    }
}

/// Configurable normalizer
///
/// ```
/// use quarry_normalizer::{Expression, Normalizer};
///
/// let a = Expression::leaf("a");
/// let b = Expression::leaf("b");
/// let c = Expression::leaf("c");
///
/// let dnf = Normalizer::new()
///     .disjunctive((a | b) & c)
///     .unwrap();
/// assert!(dnf.is_disjunctive_normal());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Normalizer<B = TreeBuilder> {
    config: NormalizerConfig,
    builder: B,
}

impl Normalizer<TreeBuilder> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: NormalizerConfig) -> Self {
        Self {
            config,
            builder: TreeBuilder,
        }
    }
}

impl<B> Normalizer<B> {
    /// Emit nodes through a custom builder
    pub fn with_builder<C>(self, builder: C) -> Normalizer<C> {
        Normalizer {
            config: self.config,
            builder,
        }
    }

    pub fn with_clause_limit(mut self, limit: usize) -> Self {
        self.config.clause_limit = Some(limit);
        self
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    pub fn builder(&self) -> &B {
        &self.builder
    }

    pub fn distribute_not<L>(&self, expression: Expression<L>) -> Expression<L>
    where
        B: NodeBuilder<L>,
    {
        distribute_not_with(&self.builder, expression)
    }

    pub fn disjunctive<L: Clone>(&self, expression: Expression<L>) -> NormalizeResult<Expression<L>>
    where
        B: NodeBuilder<L>,
    {
        self.normalize(expression, NormalForm::Disjunctive)
    }

    pub fn conjunctive<L: Clone>(&self, expression: Expression<L>) -> NormalizeResult<Expression<L>>
    where
        B: NodeBuilder<L>,
    {
        self.normalize(expression, NormalForm::Conjunctive)
    }

    /// Rewrite into `form`, failing once an expansion exceeds the clause limit
    pub fn normalize<L: Clone>(
        &self,
        expression: Expression<L>,
        form: NormalForm,
    ) -> NormalizeResult<Expression<L>>
    where
        B: NodeBuilder<L>,
    {
        let limit = self.config.clause_limit;
        let admit = |clauses: usize| match limit {
            Some(limit) if clauses > limit => {
                debug!(%form, clauses, limit, "normalization exceeds clause limit");
                Err(NormalizeError::TooComplex { clauses, limit })
            }
            _ => Ok(()),
        };

        normalize_with(&self.builder, expression, form, &admit)
    }
}
