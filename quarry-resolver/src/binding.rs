//! Resolution request/response envelope and visibility scopes

use crate::matching::{OperatorMatch, OperatorMatches};
use crate::operator::Operator;
use crate::types::Signature;
use miette::SourceSpan;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// One visibility level of a resolution path (e.g. a library boundary)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Scope {
    libraries: BTreeSet<String>,
    /// Sees every library; used when a request supplies no path
    universal: bool,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// A scope that sees every library
    pub fn universal() -> Self {
        Self {
            libraries: BTreeSet::new(),
            universal: true,
        }
    }

    pub fn with_library(mut self, library: impl Into<String>) -> Self {
        self.libraries.insert(library.into());
        self
    }

    pub fn contains_library(&self, library: &str) -> bool {
        self.universal || self.libraries.contains(library)
    }

    /// Operators without a library are visible everywhere
    pub fn can_see(&self, operator: &Operator) -> bool {
        operator
            .library
            .as_deref()
            .is_none_or(|library| self.contains_library(library))
    }

    pub fn libraries(&self) -> impl Iterator<Item = &str> {
        self.libraries.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for Scope {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            libraries: iter.into_iter().map(Into::into).collect(),
            universal: false,
        }
    }
}

/// Ordered scope levels searched narrowest first
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ResolutionPath {
    levels: Vec<Scope>,
}

impl ResolutionPath {
    pub fn new(levels: Vec<Scope>) -> Self {
        Self { levels }
    }

    pub fn push(&mut self, level: Scope) {
        self.levels.push(level);
    }

    pub fn levels(&self) -> &[Scope] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Whether any level sees the given library
    pub fn contains_library(&self, library: &str) -> bool {
        self.levels
            .iter()
            .any(|level| level.contains_library(library))
    }
}

impl FromIterator<Scope> for ResolutionPath {
    fn from_iter<I: IntoIterator<Item = Scope>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Request and accumulated result of resolving one operator call
#[derive(Debug, Clone)]
pub struct OperatorBindingContext {
    operator_name: String,
    call_signature: Signature,
    /// Only an exact match is acceptable
    is_exact: bool,
    resolution_path: ResolutionPath,
    matches: OperatorMatches,
    /// Qualified names of operators that produced feasible matches
    operator_names: BTreeSet<String>,
    operator: Option<Arc<Operator>>,
    span: Option<SourceSpan>,
}

impl OperatorBindingContext {
    pub fn new(operator_name: impl Into<String>, call_signature: Signature) -> Self {
        Self {
            operator_name: operator_name.into(),
            call_signature,
            is_exact: false,
            resolution_path: ResolutionPath::default(),
            matches: OperatorMatches::new(),
            operator_names: BTreeSet::new(),
            operator: None,
            span: None,
        }
    }

    pub fn with_path(mut self, resolution_path: ResolutionPath) -> Self {
        self.resolution_path = resolution_path;
        self
    }

    /// Require an exact match; no conversions are searched
    pub fn exact_only(mut self, is_exact: bool) -> Self {
        self.is_exact = is_exact;
        self
    }

    /// Attach the call-site span used by diagnostics
    pub fn with_span(mut self, span: SourceSpan) -> Self {
        self.span = Some(span);
        self
    }

    /// Same request, fresh result state
    pub fn derive(&self) -> Self {
        Self {
            operator_name: self.operator_name.clone(),
            call_signature: self.call_signature.clone(),
            is_exact: self.is_exact,
            resolution_path: self.resolution_path.clone(),
            matches: OperatorMatches::new(),
            operator_names: BTreeSet::new(),
            operator: None,
            span: self.span,
        }
    }

    pub fn operator_name(&self) -> &str {
        &self.operator_name
    }

    pub fn call_signature(&self) -> &Signature {
        &self.call_signature
    }

    pub fn is_exact(&self) -> bool {
        self.is_exact
    }

    pub fn resolution_path(&self) -> &ResolutionPath {
        &self.resolution_path
    }

    pub fn matches(&self) -> &OperatorMatches {
        &self.matches
    }

    pub fn operator_names(&self) -> &BTreeSet<String> {
        &self.operator_names
    }

    pub fn span(&self) -> Option<SourceSpan> {
        self.span
    }

    /// The bound operator, once resolution succeeded
    pub fn operator(&self) -> Option<&Arc<Operator>> {
        self.operator.as_ref()
    }

    pub fn is_resolved(&self) -> bool {
        self.operator.is_some()
    }

    pub(crate) fn set_span(&mut self, span: Option<SourceSpan>) {
        self.span = span;
    }

    pub(crate) fn add_match(&mut self, entry: OperatorMatch) {
        if entry.is_match() {
            self.operator_names.insert(entry.operator().name.clone());
        }
        self.matches.push(entry);
    }

    /// Fold another context's matches and names into this one
    pub(crate) fn absorb(&mut self, matches: &OperatorMatches, names: &BTreeSet<String>) {
        self.matches.merge(matches);
        self.operator_names.extend(names.iter().cloned());
    }

    /// Bind the resolved operator; returns whether the binding changed
    pub(crate) fn bind(&mut self, operator: &Arc<Operator>) -> bool {
        if self.operator.as_ref().is_some_and(|bound| bound.id == operator.id) {
            return false;
        }

        debug!(
            operator = %self.operator_name,
            resolved = %operator,
            "bound operator call"
        );
        self.operator = Some(Arc::clone(operator));
        true
    }
}
