//! Boolean expression trees
//!
//! Interior nodes are binary AND/OR applications or unary NOT. Everything
//! else is opaque to the normalizer: either a [`Expression::Leaf`] carrying a
//! caller-defined proposition, or an [`Expression::Instruction`] standing for
//! any other compiled instruction that happens to appear in boolean position.

use std::collections::BTreeSet;
use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

/// Binary connective of an expression tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    /// The connective that De Morgan's laws swap this one for
    pub fn dual(self) -> Self {
        match self {
            Self::And => Self::Or,
            Self::Or => Self::And,
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
        }
    }
}

/// Target shape of a normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NormalForm {
    /// OR of AND-clauses
    Disjunctive,
    /// AND of OR-clauses
    Conjunctive,
}

impl NormalForm {
    /// Connective joining the clauses
    pub fn outer(self) -> LogicalOperator {
        match self {
            Self::Disjunctive => LogicalOperator::Or,
            Self::Conjunctive => LogicalOperator::And,
        }
    }

    /// Connective inside each clause
    pub fn inner(self) -> LogicalOperator {
        self.outer().dual()
    }
}

impl fmt::Display for NormalForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disjunctive => write!(f, "DNF"),
            Self::Conjunctive => write!(f, "CNF"),
        }
    }
}

/// A boolean expression over propositions of type `L`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Expression<L> {
    Leaf(L),
    And(Box<Expression<L>>, Box<Expression<L>>),
    Or(Box<Expression<L>>, Box<Expression<L>>),
    Not(Box<Expression<L>>),
    /// Any other instruction; never rewritten
    Instruction {
        name: String,
        arguments: Vec<Expression<L>>,
    },
}

impl<L> Expression<L> {
    pub fn leaf(value: L) -> Self {
        Self::Leaf(value)
    }

    pub fn and(left: Self, right: Self) -> Self {
        Self::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Self, right: Self) -> Self {
        Self::Or(Box::new(left), Box::new(right))
    }

    pub fn negate(operand: Self) -> Self {
        Self::Not(Box::new(operand))
    }

    pub fn instruction(name: impl Into<String>, arguments: Vec<Self>) -> Self {
        Self::Instruction {
            name: name.into(),
            arguments,
        }
    }

    /// Build a binary node for the given connective
    pub fn join(operator: LogicalOperator, left: Self, right: Self) -> Self {
        match operator {
            LogicalOperator::And => Self::and(left, right),
            LogicalOperator::Or => Self::or(left, right),
        }
    }

    /// Connective and operands of a binary node
    pub fn binary(&self) -> Option<(LogicalOperator, &Self, &Self)> {
        match self {
            Self::And(left, right) => Some((LogicalOperator::And, &**left, &**right)),
            Self::Or(left, right) => Some((LogicalOperator::Or, &**left, &**right)),
            _ => None,
        }
    }

    /// Take a binary node apart, or hand the node back unchanged
    pub fn into_binary(self) -> Result<(LogicalOperator, Self, Self), Self> {
        match self {
            Self::And(left, right) => Ok((LogicalOperator::And, *left, *right)),
            Self::Or(left, right) => Ok((LogicalOperator::Or, *left, *right)),
            other => Err(other),
        }
    }

    /// A proposition or the negation of one
    pub fn is_literal(&self) -> bool {
        match self {
            Self::Leaf(_) | Self::Instruction { .. } => true,
            Self::Not(operand) => matches!(**operand, Self::Leaf(_) | Self::Instruction { .. }),
            Self::And(..) | Self::Or(..) => false,
        }
    }

    /// OR of AND-chains of literals
    pub fn is_disjunctive_normal(&self) -> bool {
        self.is_normal(NormalForm::Disjunctive)
    }

    /// AND of OR-chains of literals
    pub fn is_conjunctive_normal(&self) -> bool {
        self.is_normal(NormalForm::Conjunctive)
    }

    pub fn is_normal(&self, form: NormalForm) -> bool {
        collect_clauses(self, form.outer()).into_iter().all(|clause| {
            collect_clauses(clause, form.inner())
                .into_iter()
                .all(Self::is_literal)
        })
    }

    /// Clauses of a normal-form tree as sets of literals, sorted
    ///
    /// Two trees with equal clause sets denote the same normal form up to
    /// clause order, literal order within a clause and nesting of the chains.
    pub fn clause_sets(&self, form: NormalForm) -> Vec<BTreeSet<&Self>>
    where
        L: Ord,
    {
        let mut clauses: Vec<BTreeSet<&Self>> = collect_clauses(self, form.outer())
            .into_iter()
            .map(|clause| collect_clauses(clause, form.inner()).into_iter().collect())
            .collect();
        clauses.sort();
        clauses
    }

    /// Number of leaves and instructions in the tree
    pub fn proposition_count(&self) -> usize {
        match self {
            Self::Leaf(_) | Self::Instruction { .. } => 1,
            Self::Not(operand) => operand.proposition_count(),
            Self::And(left, right) | Self::Or(left, right) => {
                left.proposition_count() + right.proposition_count()
            }
        }
    }
}

/// Flatten a chain of `operator` into its operands, left to right
///
/// A node whose top connective differs from `operator` (or that is not
/// binary at all) is a single clause. Nesting direction does not matter.
pub fn collect_clauses<L>(
    expression: &Expression<L>,
    operator: LogicalOperator,
) -> Vec<&Expression<L>> {
    let mut clauses = Vec::new();
    let mut pending = vec![expression];

    while let Some(node) = pending.pop() {
        match node.binary() {
            Some((connective, left, right)) if connective == operator => {
                pending.push(right);
                pending.push(left);
            }
            _ => clauses.push(node),
        }
    }

    clauses
}

impl<L> BitAnd for Expression<L> {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self::and(self, rhs)
    }
}

impl<L> BitOr for Expression<L> {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self::or(self, rhs)
    }
}

impl<L> Not for Expression<L> {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self::negate(self)
    }
}

impl<L: fmt::Display> fmt::Display for Expression<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(value) => write!(f, "{value}"),
            Self::And(left, right) => write!(f, "({left} AND {right})"),
            Self::Or(left, right) => write!(f, "({left} OR {right})"),
            Self::Not(operand) => write!(f, "NOT {operand}"),
            Self::Instruction { name, arguments } => {
                write!(f, "{name}(")?;
                for (index, argument) in arguments.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{argument}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Constructs the nodes the normalizer emits
///
/// Callers that intern nodes or attach metadata to them supply their own
/// builder; [`TreeBuilder`] allocates plain boxed nodes.
pub trait NodeBuilder<L> {
    fn binary(
        &self,
        operator: LogicalOperator,
        left: Expression<L>,
        right: Expression<L>,
    ) -> Expression<L>;

    fn negate(&self, operand: Expression<L>) -> Expression<L>;
}

/// Default node builder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeBuilder;

impl<L> NodeBuilder<L> for TreeBuilder {
    fn binary(
        &self,
        operator: LogicalOperator,
        left: Expression<L>,
        right: Expression<L>,
    ) -> Expression<L> {
        Expression::join(operator, left, right)
    }

    fn negate(&self, operand: Expression<L>) -> Expression<L> {
        Expression::negate(operand)
    }
}
