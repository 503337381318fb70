//! Tests for the Quarry boolean normalizer


use crate::expression::{Expression, LogicalOperator};

pub(crate) type Prop = Expression<&'static str>;

pub(crate) fn var(name: &'static str) -> Prop {
    Expression::leaf(name)
}

/// Whether any NOT in the tree still wraps an AND or OR
pub(crate) fn has_negated_connective<L>(expression: &Expression<L>) -> bool {
    match expression {
        Expression::Not(operand) => {
            operand.binary().is_some() || has_negated_connective(operand)
        }
        Expression::And(left, right) | Expression::Or(left, right) => {
            has_negated_connective(left) || has_negated_connective(right)
        }
        Expression::Leaf(_) | Expression::Instruction { .. } => false,
    }
}

/// Number of clauses joined by `operator` at the top of the tree
pub(crate) fn clause_count<L>(expression: &Expression<L>, operator: LogicalOperator) -> usize {
    crate::expression::collect_clauses(expression, operator).len()
}
