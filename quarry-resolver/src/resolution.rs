//! Scope-layered operator resolution
//!
//! Resolution first scores every candidate regardless of visibility (the
//! "local" context, with no early discard), then walks the resolution path
//! level by level. A level whose visible matches are already exact ends the search, so a nearer scope
//! shadows farther ones. Otherwise level matches accumulate, and once every
//! level is exhausted an accumulated partial match is accepted, falling back
//! to an exact match from the unrestricted local context.
//!
//! ```text
//! Searching(level) -> Found(exact)                      [terminal]
//!                  -> Searching(level + 1)
//!                  -> FellBackToGlobal -> Found(exact or partial)
//!                                      -> Unresolved    [terminal]
//! ```

use crate::binding::{OperatorBindingContext, Scope};
use crate::cache::{CacheStats, ResolutionCache, ResolutionKey};
use crate::conversion::TypeCatalog;
use crate::error::{RegistryError, ResolutionError};
use crate::matching::OperatorMatches;
use crate::operator::{Operator, OperatorDefinition, OperatorId};
use crate::registry::OperatorRegistry;
use crate::types::{Signature, TypeId};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::trace;

/// Resolve the call in `context` against `registry`
///
/// Never fails: an unresolved context simply has no bound operator, and its
/// accumulated matches and names describe why.
pub fn resolve_operator(
    registry: &OperatorRegistry,
    catalog: &dyn TypeCatalog,
    context: &mut OperatorBindingContext,
) {
    // Full-signature data, independent of visibility; unpruned so that the
    // outcome cannot depend on which library registered first
    let mut local = context.derive();
    for map in registry.maps_named(context.operator_name()) {
        map.resolve_unpruned(catalog, &mut local);
    }

    // An empty path is one level that sees every library
    let levels = if context.resolution_path().is_empty() {
        vec![Scope::universal()]
    } else {
        context.resolution_path().levels().to_vec()
    };

    for (index, level) in levels.iter().enumerate() {
        let mut level_matches = OperatorMatches::new();
        let mut level_names = BTreeSet::new();
        for entry in local.matches() {
            if level.can_see(entry.operator()) {
                if entry.is_match() {
                    level_names.insert(entry.operator().name.clone());
                }
                level_matches.push(entry.clone());
            }
        }

        trace!(
            operator = %context.operator_name(),
            level = index,
            candidates = level_matches.len(),
            exact = level_matches.is_exact(),
            "searched resolution level"
        );

        if let Some(exact) = level_matches.exact_match() {
            let operator = Arc::clone(exact.operator());
            context.absorb(&level_matches, &level_names);
            context.bind(&operator);
            return;
        }

        context.absorb(&level_matches, &level_names);
    }

    if !context.is_exact() && context.matches().is_partial() {
        if let Some(operator) = context
            .matches()
            .best_match()
            .map(|entry| Arc::clone(entry.operator()))
        {
            context.bind(&operator);
        }
        return;
    }

    trace!(operator = %context.operator_name(), "falling back to unrestricted candidates");
    if let Some(exact) = local.matches().exact_match() {
        let operator = Arc::clone(exact.operator());
        context.bind(&operator);
        return;
    }

    let names = local.operator_names().clone();
    context.absorb(local.matches(), &names);
}

/// Translate an unresolved context into the diagnostic the compiler reports
pub fn resolution_error(context: &OperatorBindingContext) -> Option<ResolutionError> {
    if context.is_resolved() {
        return None;
    }

    let operator_name = context.operator_name().to_string();
    let signature = context.call_signature().to_string();
    let span = context.span();
    let matches = context.matches();

    let error = if context.operator_names().len() > 1 {
        ResolutionError::AmbiguousOperatorName {
            operator_name,
            candidates: context.operator_names().iter().cloned().collect(),
            span,
        }
    } else if matches.is_ambiguous() {
        ResolutionError::AmbiguousCall {
            operator_name,
            signature,
            candidates: matches
                .ambiguous_matches()
                .into_iter()
                .map(|entry| entry.operator().to_string())
                .collect(),
            span,
        }
    } else if let Some(closest) = matches
        .closest_match()
        .filter(|closest| !closest.is_match())
    {
        ResolutionError::InvalidOperatorCall {
            operator_name,
            signature,
            closest: closest.signature().signature().to_string(),
            failing_arguments: closest.failing_arguments(),
            span,
        }
    } else {
        ResolutionError::NoMatch {
            operator_name,
            signature,
            span,
        }
    };

    Some(error)
}

/// State guarded by the catalog lock
#[derive(Debug, Default)]
pub struct CatalogState {
    registry: OperatorRegistry,
    cache: Option<ResolutionCache>,
}

impl CatalogState {
    pub fn registry(&self) -> &OperatorRegistry {
        &self.registry
    }

    pub fn cache(&self) -> Option<&ResolutionCache> {
        self.cache.as_ref()
    }
}

/// Shared, thread-safe operator catalog
///
/// Registration, removal and resolution all go through one mutex; a
/// resolution holds it for the whole multi-scope walk so that concurrent
/// schema changes cannot interleave with it.
#[derive(Debug)]
pub struct OperatorCatalog {
    state: Mutex<CatalogState>,
    next_id: AtomicU64,
}

impl Default for OperatorCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl OperatorCatalog {
    /// Create an empty catalog with the resolution cache enabled
    pub fn new() -> Self {
        Self::with_cache(true)
    }

    pub fn with_cache(enabled: bool) -> Self {
        Self {
            state: Mutex::new(CatalogState {
                registry: OperatorRegistry::new(),
                cache: enabled.then(ResolutionCache::new),
            }),
            next_id: AtomicU64::new(1),
        }
    }

    /// Acquire the catalog guard; released when the guard is dropped
    pub fn lock(&self) -> MutexGuard<'_, CatalogState> {
        // Every mutation below completes before it can panic, so a poisoned
        // lock still guards consistent state.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_operator(
        &self,
        definition: OperatorDefinition,
    ) -> Result<Arc<Operator>, RegistryError> {
        let id = OperatorId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let operator = Arc::new(Operator::new(id, definition));

        let mut state = self.lock();
        state.registry.add_operator(Arc::clone(&operator))?;
        if let Some(cache) = state.cache.as_mut() {
            cache.invalidate_operator_name(&operator.name);
        }
        Ok(operator)
    }

    pub fn remove_operator(
        &self,
        name: &str,
        signature: &Signature,
    ) -> Result<Arc<Operator>, RegistryError> {
        let mut state = self.lock();
        let removed = state.registry.remove_operator(name, signature)?;
        if let Some(cache) = state.cache.as_mut() {
            cache.invalidate_operator(removed.id);
            cache.invalidate_operator_name(&removed.name);
        }
        Ok(removed)
    }

    pub fn contains_operator(&self, name: &str, signature: &Signature) -> bool {
        self.lock().registry.contains_operator(name, signature)
    }

    /// Resolve in place without translating failures into errors
    pub fn resolve(&self, catalog: &dyn TypeCatalog, context: &mut OperatorBindingContext) {
        let mut state = self.lock();
        let key = ResolutionKey::from_context(context);

        if let Some(cached) = state.cache.as_mut().and_then(|cache| cache.get(&key)) {
            let span = context.span();
            *context = cached.clone();
            context.set_span(span);
            return;
        }

        resolve_operator(&state.registry, catalog, context);

        if let Some(cache) = state.cache.as_mut() {
            cache.insert(key, context.clone());
        }
    }

    /// Resolve a call, reporting ambiguity and no-match as errors
    pub fn resolve_call(
        &self,
        catalog: &dyn TypeCatalog,
        context: OperatorBindingContext,
    ) -> Result<OperatorBindingContext, ResolutionError> {
        let mut context = context;
        self.resolve(catalog, &mut context);

        match resolution_error(&context) {
            Some(error) => Err(error),
            None => Ok(context),
        }
    }

    /// Notify the catalog that a conversion between two types changed
    ///
    /// `types` must already reflect the change.
    pub fn invalidate_conversion(
        &self,
        types: &dyn TypeCatalog,
        source: &TypeId,
        target: &TypeId,
    ) {
        if let Some(cache) = self.lock().cache.as_mut() {
            cache.invalidate_conversion(types, source, target);
        }
    }

    /// Notify the catalog that a library's scope membership changed
    pub fn invalidate_library(&self, library: &str) {
        if let Some(cache) = self.lock().cache.as_mut() {
            cache.invalidate_library(library);
        }
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.lock().cache.as_ref().map(|cache| cache.stats().clone())
    }
}
