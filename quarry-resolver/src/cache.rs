//! Resolution result cache
//!
//! Memoizes successful resolutions keyed by everything that can change the
//! outcome of a resolution. Entries never expire on their own; the owner must
//! invalidate them when operators, conversions or library visibility change.

use crate::binding::{OperatorBindingContext, ResolutionPath};
use crate::conversion::TypeCatalog;
use crate::operator::{unqualified, OperatorId};
use crate::types::{Signature, TypeId};
use std::collections::HashMap;
use tracing::debug;

/// Everything a resolution result depends on
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolutionKey {
    pub operator_name: String,
    pub call_signature: Signature,
    pub resolution_path: ResolutionPath,
    pub is_exact: bool,
}

impl ResolutionKey {
    pub fn from_context(context: &OperatorBindingContext) -> Self {
        Self {
            operator_name: context.operator_name().to_string(),
            call_signature: context.call_signature().clone(),
            resolution_path: context.resolution_path().clone(),
            is_exact: context.is_exact(),
        }
    }
}

/// Cache performance statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub cache_hits: usize,
    pub cache_misses: usize,
    /// Entries evicted by explicit invalidation
    pub invalidations: usize,
    pub total_queries: usize,
}

/// Cache of resolved binding contexts
#[derive(Debug, Clone, Default)]
pub struct ResolutionCache {
    entries: HashMap<ResolutionKey, OperatorBindingContext>,
    stats: CacheStats,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, key: &ResolutionKey) -> Option<&OperatorBindingContext> {
        self.stats.total_queries += 1;

        if let Some(context) = self.entries.get(key) {
            self.stats.cache_hits += 1;
            Some(context)
        } else {
            self.stats.cache_misses += 1;
            None
        }
    }

    /// Only resolved contexts are worth caching
    pub fn insert(&mut self, key: ResolutionKey, context: OperatorBindingContext) {
        if context.is_resolved() {
            self.entries.insert(key, context);
        }
    }

    /// Drop entries for calls that could see an operator with this name
    pub fn invalidate_operator_name(&mut self, name: &str) -> usize {
        let changed = unqualified(name);
        self.evict("operator name", |key, _| {
            key.operator_name == name || unqualified(&key.operator_name) == changed
        })
    }

    /// Drop entries bound to a specific operator
    pub fn invalidate_operator(&mut self, id: OperatorId) -> usize {
        self.evict("operator", |_, context| {
            context.operator().is_some_and(|operator| operator.id == id)
        })
    }

    /// Drop entries whose calls could use a conversion out of `source`
    ///
    /// An argument type that converts to `source`, directly or through a
    /// chain, may now reach new targets, so every such call is evicted, not
    /// only calls naming `source` itself.
    pub fn invalidate_conversion(
        &mut self,
        catalog: &dyn TypeCatalog,
        source: &TypeId,
        target: &TypeId,
    ) -> usize {
        debug!(%source, %target, "conversion changed");
        self.evict("conversion", |key, _| {
            key.call_signature.iter().any(|parameter| {
                catalog
                    .conversion_path(&parameter.data_type, source)
                    .can_convert()
            })
        })
    }

    /// Drop entries whose path sees `library` or that bound one of its operators
    pub fn invalidate_library(&mut self, library: &str) -> usize {
        self.evict("library", |key, context| {
            key.resolution_path.contains_library(library)
                || context
                    .operator()
                    .is_some_and(|operator| operator.library.as_deref() == Some(library))
        })
    }

    pub fn clear(&mut self) {
        let evicted = self.entries.len();
        self.entries.clear();
        self.stats.invalidations += evicted;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    fn evict(
        &mut self,
        reason: &str,
        mut stale: impl FnMut(&ResolutionKey, &OperatorBindingContext) -> bool,
    ) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, context| !stale(key, context));
        let evicted = before - self.entries.len();

        if evicted > 0 {
            debug!(reason, evicted, "invalidated cached resolutions");
        }
        self.stats.invalidations += evicted;
        evicted
    }
}
