//! Conversion model consumed by the match engine
//!
//! The match engine asks two questions of the type system: "is A a B?" and
//! "how do I get from A to B, and at what cost?". Both are behind the
//! [`TypeCatalog`] trait. [`ConversionGraph`] is the in-memory catalog used by
//! the compiler when no schema-backed catalog is attached, and by the tests.

use crate::error::ConversionError;
use crate::types::TypeId;
use petgraph::algo::{astar, has_path_connecting};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;
use std::ops::Add;

/// Narrowing score of a single narrowing conversion step
pub const NARROWING_PENALTY: i32 = -1;

/// Cost of reaching a parameter type from an argument type
///
/// Narrowing scores are zero for widening/identity and negative for
/// information-losing conversions; they are summed across parameters, so a
/// higher (less negative) total is preferred. Path lengths count conversion
/// steps; among equally narrowing candidates the shorter total wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cost {
    Feasible { narrowing_score: i32, path_length: u32 },
    Infeasible,
}

impl Cost {
    /// Identity conversion: no narrowing, no steps
    pub const ZERO: Cost = Cost::Feasible {
        narrowing_score: 0,
        path_length: 0,
    };

    pub fn feasible(narrowing_score: i32, path_length: u32) -> Self {
        Self::Feasible {
            narrowing_score,
            path_length,
        }
    }

    pub fn is_feasible(self) -> bool {
        matches!(self, Self::Feasible { .. })
    }

    pub fn narrowing_score(self) -> Option<i32> {
        match self {
            Self::Feasible {
                narrowing_score, ..
            } => Some(narrowing_score),
            Self::Infeasible => None,
        }
    }

    pub fn path_length(self) -> Option<u32> {
        match self {
            Self::Feasible { path_length, .. } => Some(path_length),
            Self::Infeasible => None,
        }
    }

    /// Sum two costs; infeasibility is absorbing and the sums saturate
    pub fn combine(self, other: Cost) -> Cost {
        match (self, other) {
            (
                Self::Feasible {
                    narrowing_score: left_score,
                    path_length: left_length,
                },
                Self::Feasible {
                    narrowing_score: right_score,
                    path_length: right_length,
                },
            ) => Self::Feasible {
                narrowing_score: left_score.saturating_add(right_score),
                path_length: left_length.saturating_add(right_length),
            },
            _ => Self::Infeasible,
        }
    }

    /// Strictly better: higher narrowing score, or equal score and shorter path
    pub fn is_better_than(self, other: Cost) -> bool {
        match (self, other) {
            (Self::Infeasible, _) => false,
            (Self::Feasible { .. }, Self::Infeasible) => true,
            (
                Self::Feasible {
                    narrowing_score: left_score,
                    path_length: left_length,
                },
                Self::Feasible {
                    narrowing_score: right_score,
                    path_length: right_length,
                },
            ) => {
                left_score > right_score || (left_score == right_score && left_length < right_length)
            }
        }
    }
}

impl Default for Cost {
    fn default() -> Self {
        Self::ZERO
    }
}

/// One edge of a conversion path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversionStep {
    pub from_type: TypeId,
    pub to_type: TypeId,
    pub narrowing: bool,
}

impl ConversionStep {
    pub fn narrowing_score(&self) -> i32 {
        if self.narrowing {
            NARROWING_PENALTY
        } else {
            0
        }
    }
}

/// Result of asking the catalog for a conversion path between two types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionContext {
    from_type: TypeId,
    to_type: TypeId,
    steps: Vec<ConversionStep>,
    cost: Cost,
}

impl ConversionContext {
    /// A feasible path made of the given steps (empty for identity)
    pub fn from_steps(from_type: TypeId, to_type: TypeId, steps: Vec<ConversionStep>) -> Self {
        let cost = steps.iter().fold(Cost::ZERO, |cost, step| {
            cost.combine(Cost::feasible(step.narrowing_score(), 1))
        });
        Self {
            from_type,
            to_type,
            steps,
            cost,
        }
    }

    pub fn identity(data_type: TypeId) -> Self {
        Self::from_steps(data_type.clone(), data_type, Vec::new())
    }

    pub fn infeasible(from_type: TypeId, to_type: TypeId) -> Self {
        Self {
            from_type,
            to_type,
            steps: Vec::new(),
            cost: Cost::Infeasible,
        }
    }

    pub fn from_type(&self) -> &TypeId {
        &self.from_type
    }

    pub fn to_type(&self) -> &TypeId {
        &self.to_type
    }

    pub fn steps(&self) -> &[ConversionStep] {
        &self.steps
    }

    pub fn cost(&self) -> Cost {
        self.cost
    }

    pub fn can_convert(&self) -> bool {
        self.cost.is_feasible()
    }

    /// Only meaningful when [`Self::can_convert`] holds
    pub fn narrowing_score(&self) -> Option<i32> {
        self.cost.narrowing_score()
    }

    /// Only meaningful when [`Self::can_convert`] holds
    pub fn path_length(&self) -> Option<u32> {
        self.cost.path_length()
    }
}

/// Type-system facts the resolver needs from the schema catalog
pub trait TypeCatalog {
    /// Structural/nominal subtype test; reflexive
    fn is_a(&self, source: &TypeId, target: &TypeId) -> bool;

    /// Best conversion path from `source` to `target`
    fn conversion_path(&self, source: &TypeId, target: &TypeId) -> ConversionContext;
}

/// Lexicographic path cost: fewest narrowing steps first, then fewest steps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
struct PathCost {
    narrowing_steps: u32,
    steps: u32,
}

impl Add for PathCost {
    type Output = PathCost;

    fn add(self, other: PathCost) -> PathCost {
        PathCost {
            narrowing_steps: self.narrowing_steps.saturating_add(other.narrowing_steps),
            steps: self.steps.saturating_add(other.steps),
        }
    }
}

/// In-memory type catalog built on two petgraph digraphs
///
/// Both graphs share the same node set (nodes are only ever appended, and
/// always to both graphs), so a `NodeIndex` is valid in either.
#[derive(Debug, Clone, Default)]
pub struct ConversionGraph {
    /// is-a edges: subtype -> supertype
    subtypes: DiGraph<TypeId, ()>,
    /// conversion edges: source -> target, weighted by narrowing
    conversions: DiGraph<TypeId, bool>,
    /// Map from type to its node index
    nodes: HashMap<TypeId, NodeIndex>,
}

impl ConversionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type with no relationships
    pub fn add_type(&mut self, data_type: impl Into<TypeId>) {
        self.get_or_create_node(data_type.into());
    }

    pub fn contains_type(&self, data_type: &TypeId) -> bool {
        self.nodes.contains_key(data_type)
    }

    /// Declare `subtype` is-a `supertype`
    pub fn declare_subtype(&mut self, subtype: impl Into<TypeId>, supertype: impl Into<TypeId>) {
        let sub = self.get_or_create_node(subtype.into());
        let sup = self.get_or_create_node(supertype.into());
        self.subtypes.update_edge(sub, sup, ());
    }

    /// Add a direct conversion; a pair can only carry one conversion
    pub fn add_conversion(
        &mut self,
        source: impl Into<TypeId>,
        target: impl Into<TypeId>,
        narrowing: bool,
    ) -> Result<(), ConversionError> {
        let source = source.into();
        let target = target.into();

        if self.has_conversion(&source, &target) {
            return Err(ConversionError::DuplicateConversion {
                from_type: source.name().to_string(),
                to_type: target.name().to_string(),
            });
        }

        let from = self.get_or_create_node(source);
        let to = self.get_or_create_node(target);
        self.conversions.add_edge(from, to, narrowing);
        Ok(())
    }

    pub fn has_conversion(&self, source: &TypeId, target: &TypeId) -> bool {
        match (self.nodes.get(source), self.nodes.get(target)) {
            (Some(&from), Some(&to)) => self.conversions.find_edge(from, to).is_some(),
            _ => false,
        }
    }

    /// Total number of registered types
    pub fn type_count(&self) -> usize {
        self.nodes.len()
    }

    fn get_or_create_node(&mut self, data_type: TypeId) -> NodeIndex {
        if let Some(&index) = self.nodes.get(&data_type) {
            return index;
        }

        let index = self.subtypes.add_node(data_type.clone());
        let mirrored = self.conversions.add_node(data_type.clone());
        debug_assert_eq!(index, mirrored);
        self.nodes.insert(data_type, index);
        index
    }
}

impl TypeCatalog for ConversionGraph {
    fn is_a(&self, source: &TypeId, target: &TypeId) -> bool {
        if source == target {
            return true;
        }

        match (self.nodes.get(source), self.nodes.get(target)) {
            (Some(&from), Some(&to)) => has_path_connecting(&self.subtypes, from, to, None),
            _ => false,
        }
    }

    fn conversion_path(&self, source: &TypeId, target: &TypeId) -> ConversionContext {
        if source == target {
            return ConversionContext::identity(source.clone());
        }

        let (Some(&from), Some(&to)) = (self.nodes.get(source), self.nodes.get(target)) else {
            return ConversionContext::infeasible(source.clone(), target.clone());
        };

        let path = astar(
            &self.conversions,
            from,
            |node| node == to,
            |edge| PathCost {
                narrowing_steps: u32::from(*edge.weight()),
                steps: 1,
            },
            |_| PathCost::default(),
        );

        let Some((_, nodes)) = path else {
            return ConversionContext::infeasible(source.clone(), target.clone());
        };

        let steps = nodes
            .windows(2)
            .filter_map(|pair| {
                let edge = self.conversions.find_edge(pair[0], pair[1])?;
                Some(ConversionStep {
                    from_type: self.conversions[pair[0]].clone(),
                    to_type: self.conversions[pair[1]].clone(),
                    narrowing: self.conversions[edge],
                })
            })
            .collect();

        ConversionContext::from_steps(source.clone(), target.clone(), steps)
    }
}
