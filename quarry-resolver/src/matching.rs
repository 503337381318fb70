//! Match engine: scoring candidate overloads against a call
//!
//! For one call signature and one operator map the engine produces a set of
//! [`OperatorMatch`] records, each annotated with per-argument convertibility
//! and an aggregate [`Cost`]. [`OperatorMatches`] keeps the running best
//! narrowing score, the shortest path at that score, and the tied set, and
//! derives the winner (or ambiguity) from them.

use crate::binding::OperatorBindingContext;
use crate::conversion::{ConversionContext, Cost, TypeCatalog};
use crate::operator::{Operator, OperatorId, OperatorSignature};
use crate::registry::OperatorMap;
use crate::types::Signature;
use std::sync::Arc;
use tracing::trace;

/// One candidate scored against one call
#[derive(Debug, Clone)]
pub struct OperatorMatch {
    signature: OperatorSignature,
    is_exact: bool,
    /// Per-argument convertibility
    can_convert: Vec<bool>,
    /// Per-argument conversion; `None` means no conversion was needed (or tried)
    conversions: Vec<Option<ConversionContext>>,
}

impl OperatorMatch {
    /// The candidate's signature is structurally identical to the call
    pub fn exact(signature: OperatorSignature) -> Self {
        let arity = signature.signature().len();
        Self {
            signature,
            is_exact: true,
            can_convert: vec![true; arity],
            conversions: vec![None; arity],
        }
    }

    fn candidate(signature: OperatorSignature) -> Self {
        let arity = signature.signature().len();
        Self {
            signature,
            is_exact: false,
            can_convert: vec![false; arity],
            conversions: vec![None; arity],
        }
    }

    pub fn signature(&self) -> &OperatorSignature {
        &self.signature
    }

    pub fn operator(&self) -> &Arc<Operator> {
        self.signature.operator()
    }

    pub fn is_exact(&self) -> bool {
        self.is_exact
    }

    /// Feasible at all, possibly through conversions
    pub fn is_match(&self) -> bool {
        self.can_convert.iter().all(|&convertible| convertible)
    }

    /// Feasible but not exact
    pub fn is_partial(&self) -> bool {
        self.is_match() && !self.is_exact
    }

    pub fn can_convert(&self, index: usize) -> bool {
        self.can_convert.get(index).copied().unwrap_or(false)
    }

    pub fn conversion(&self, index: usize) -> Option<&ConversionContext> {
        self.conversions.get(index).and_then(Option::as_ref)
    }

    /// Number of argument positions that can be passed to this candidate
    pub fn convertible_count(&self) -> usize {
        self.can_convert
            .iter()
            .filter(|&&convertible| convertible)
            .count()
    }

    /// Argument positions that cannot be passed to this candidate
    pub fn failing_arguments(&self) -> Vec<usize> {
        self.can_convert
            .iter()
            .enumerate()
            .filter_map(|(index, &convertible)| (!convertible).then_some(index))
            .collect()
    }

    /// Aggregate cost; infeasible as soon as one position cannot convert
    pub fn cost(&self) -> Cost {
        if !self.is_match() {
            return Cost::Infeasible;
        }
        self.convertible_cost()
    }

    /// Cost summed over the convertible positions only (diagnostics)
    pub fn convertible_cost(&self) -> Cost {
        self.can_convert
            .iter()
            .zip(&self.conversions)
            .filter(|(&convertible, _)| convertible)
            .fold(Cost::ZERO, |cost, (_, conversion)| match conversion {
                Some(conversion) => cost.combine(conversion.cost()),
                None => cost,
            })
    }

    pub fn narrowing_score(&self) -> Option<i32> {
        self.cost().narrowing_score()
    }

    pub fn path_length(&self) -> Option<u32> {
        self.cost().path_length()
    }
}

/// Ordered match collection with running best-match aggregates
///
/// Aggregates are extended incrementally on insertion and rebuilt from
/// scratch on removal; a removed maximum cannot be undone incrementally.
#[derive(Debug, Clone, Default)]
pub struct OperatorMatches {
    matches: Vec<OperatorMatch>,
    best_narrowing_score: Option<i32>,
    shortest_path_length: Option<u32>,
    /// Indices of feasible matches tied at `best_narrowing_score`
    best_matches: Vec<usize>,
}

impl OperatorMatches {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OperatorMatch> {
        self.matches.iter()
    }

    pub fn get(&self, index: usize) -> Option<&OperatorMatch> {
        self.matches.get(index)
    }

    pub fn contains_operator(&self, id: OperatorId) -> bool {
        self.matches.iter().any(|entry| entry.operator().id == id)
    }

    pub fn best_narrowing_score(&self) -> Option<i32> {
        self.best_narrowing_score
    }

    pub fn shortest_path_length(&self) -> Option<u32> {
        self.shortest_path_length
    }

    /// Feasible matches tied at the best narrowing score
    pub fn best_matches(&self) -> impl Iterator<Item = &OperatorMatch> {
        self.best_matches.iter().map(|&index| &self.matches[index])
    }

    /// Append a match, extending the aggregates
    pub fn push(&mut self, entry: OperatorMatch) {
        let index = self.matches.len();
        let cost = entry.cost();
        self.matches.push(entry);
        self.record(index, cost);
    }

    /// Append every match of `other` whose operator is not already present
    pub fn merge(&mut self, other: &OperatorMatches) {
        for entry in other.iter() {
            if !self.contains_operator(entry.operator().id) {
                self.push(entry.clone());
            }
        }
    }

    /// Remove a match by position, rebuilding the aggregates
    pub fn remove(&mut self, index: usize) -> Option<OperatorMatch> {
        if index >= self.matches.len() {
            return None;
        }
        let removed = self.matches.remove(index);
        self.rebuild();
        Some(removed)
    }

    /// Keep only matches satisfying `keep`, rebuilding the aggregates
    pub fn retain(&mut self, keep: impl FnMut(&OperatorMatch) -> bool) {
        self.matches.retain(keep);
        self.rebuild();
    }

    fn rebuild(&mut self) {
        self.best_narrowing_score = None;
        self.shortest_path_length = None;
        self.best_matches.clear();

        for index in 0..self.matches.len() {
            let cost = self.matches[index].cost();
            self.record(index, cost);
        }
    }

    fn record(&mut self, index: usize, cost: Cost) {
        let Cost::Feasible {
            narrowing_score,
            path_length,
        } = cost
        else {
            return;
        };

        match self.best_narrowing_score {
            Some(best) if narrowing_score < best => {}
            Some(best) if narrowing_score == best => {
                self.best_matches.push(index);
                self.shortest_path_length = Some(
                    self.shortest_path_length
                        .map_or(path_length, |shortest| shortest.min(path_length)),
                );
            }
            _ => {
                self.best_narrowing_score = Some(narrowing_score);
                self.shortest_path_length = Some(path_length);
                self.best_matches = vec![index];
            }
        }
    }

    /// Best matches whose path length is the shortest at the best score
    fn tied_matches(&self) -> impl Iterator<Item = &OperatorMatch> {
        let shortest = self.shortest_path_length;
        self.best_matches()
            .filter(move |entry| entry.path_length().is_some() && entry.path_length() == shortest)
    }

    /// The single exact match, if there is exactly one
    pub fn exact_match(&self) -> Option<&OperatorMatch> {
        let mut exact = self.matches.iter().filter(|entry| entry.is_exact());
        match (exact.next(), exact.next()) {
            (Some(entry), None) => Some(entry),
            _ => None,
        }
    }

    /// The unique partial match at the best score and shortest path
    fn best_partial_match(&self) -> Option<&OperatorMatch> {
        let mut tied = self.tied_matches();
        match (tied.next(), tied.next()) {
            (Some(entry), None) if entry.is_partial() => Some(entry),
            _ => None,
        }
    }

    /// The winning match: the unique exact match, else the unique best partial
    pub fn best_match(&self) -> Option<&OperatorMatch> {
        self.exact_match().or_else(|| self.best_partial_match())
    }

    pub fn is_exact(&self) -> bool {
        self.exact_match().is_some()
    }

    pub fn is_partial(&self) -> bool {
        !self.is_exact() && self.best_partial_match().is_some()
    }

    /// More than one candidate ties at the best score and shortest path
    pub fn is_ambiguous(&self) -> bool {
        !self.is_exact() && self.tied_matches().nth(1).is_some()
    }

    /// Candidates that tie for the win when the set is ambiguous
    pub fn ambiguous_matches(&self) -> Vec<&OperatorMatch> {
        if self.is_ambiguous() {
            self.tied_matches().collect()
        } else {
            Vec::new()
        }
    }

    /// Diagnostic choice when there is no winner
    ///
    /// Prefers the candidate convertible in the most positions, then the best
    /// narrowing score over those positions, then the shortest path. Any tie
    /// left after that yields no closest match.
    pub fn closest_match(&self) -> Option<&OperatorMatch> {
        let mut closest: Option<&OperatorMatch> = None;
        let mut tied = false;

        for entry in &self.matches {
            let Some(current) = closest else {
                closest = Some(entry);
                continue;
            };

            let entry_count = entry.convertible_count();
            let current_count = current.convertible_count();
            let entry_cost = entry.convertible_cost();
            let current_cost = current.convertible_cost();

            if entry_count > current_count
                || (entry_count == current_count && entry_cost.is_better_than(current_cost))
            {
                closest = Some(entry);
                tied = false;
            } else if entry_count == current_count && entry_cost == current_cost {
                tied = true;
            }
        }

        if tied {
            None
        } else {
            closest
        }
    }

    /// Whether a partially scored candidate can no longer beat the best match
    pub fn should_discard(&self, running: Cost) -> bool {
        let Some(best) = self.best_narrowing_score else {
            return false;
        };

        match running {
            Cost::Infeasible => true,
            Cost::Feasible {
                narrowing_score,
                path_length,
            } => {
                narrowing_score < best
                    || (narrowing_score == best
                        && self
                            .shortest_path_length
                            .is_some_and(|shortest| path_length > shortest))
            }
        }
    }
}

impl<'a> IntoIterator for &'a OperatorMatches {
    type Item = &'a OperatorMatch;
    type IntoIter = std::slice::Iter<'a, OperatorMatch>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.iter()
    }
}

/// Score every candidate of `map` against the call in `context`
///
/// An exact key hit is recorded alone and ends the search for this map.
/// Exact-only requests stop after the key lookup.
pub fn resolve_candidates(
    map: &OperatorMap,
    catalog: &dyn TypeCatalog,
    context: &mut OperatorBindingContext,
) {
    score_map(map, catalog, context, true);
}

/// Score every candidate of `map` without pruning
///
/// Neither an exact key hit nor the running best match cuts the search
/// short. Callers that filter matches by visibility afterwards use this, so a
/// candidate no scope can see never prunes one that some scope can.
pub fn resolve_all_candidates(
    map: &OperatorMap,
    catalog: &dyn TypeCatalog,
    context: &mut OperatorBindingContext,
) {
    score_map(map, catalog, context, false);
}

fn score_map(
    map: &OperatorMap,
    catalog: &dyn TypeCatalog,
    context: &mut OperatorBindingContext,
    prune: bool,
) {
    if let Some(signature) = map.resolve_exact(context.call_signature()) {
        if !context.matches().contains_operator(signature.operator().id) {
            context.add_match(OperatorMatch::exact(signature.clone()));
        }
        if prune {
            return;
        }
    }

    if context.is_exact() {
        return;
    }

    let call = context.call_signature().clone();
    for candidate in map.signatures() {
        if candidate.signature().len() != call.len()
            || context.matches().contains_operator(candidate.operator().id)
        {
            continue;
        }

        let best = prune.then(|| context.matches());
        if let Some(entry) = score_candidate(candidate, &call, catalog, best) {
            context.add_match(entry);
        }
    }
}

/// Score a single candidate of matching arity
///
/// Returns `None` when the candidate was abandoned because its running cost
/// already lost to the best match in `best` (if given).
fn score_candidate(
    candidate: &OperatorSignature,
    call: &Signature,
    catalog: &dyn TypeCatalog,
    best: Option<&OperatorMatches>,
) -> Option<OperatorMatch> {
    let mut entry = OperatorMatch::candidate(candidate.clone());
    let mut running = Cost::ZERO;

    for (index, (argument, parameter)) in call.iter().zip(candidate.signature()).enumerate() {
        if argument.modifier.is_by_reference() || parameter.modifier.is_by_reference() {
            // No conversion is possible through a by-reference position
            entry.can_convert[index] = argument.data_type == parameter.data_type;
        } else if catalog.is_a(&argument.data_type, &parameter.data_type) {
            entry.can_convert[index] = true;
        } else {
            let conversion = catalog.conversion_path(&argument.data_type, &parameter.data_type);
            entry.can_convert[index] = conversion.can_convert();
            running = running.combine(conversion.cost());
            entry.conversions[index] = Some(conversion);
        }

        if !entry.can_convert[index] {
            running = Cost::Infeasible;
        }

        if best.is_some_and(|matches| matches.should_discard(running)) {
            trace!(
                operator = %candidate.operator(),
                argument = index,
                "discarding candidate that cannot beat the best match"
            );
            return None;
        }
    }

    Some(entry)
}
