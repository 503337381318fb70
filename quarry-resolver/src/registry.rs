//! Candidate registry: operator maps keyed by signature
//!
//! One [`OperatorMap`] exists per fully qualified operator name. It is
//! created by the first registration of that name and dropped once its last
//! signature is removed. Maps keep insertion order (`IndexMap`) so that
//! candidate scoring, and therefore tracing and diagnostics, is
//! deterministic.

use crate::binding::OperatorBindingContext;
use crate::conversion::TypeCatalog;
use crate::error::RegistryError;
use crate::matching;
use crate::operator::{unqualified, Operator, OperatorSignature};
use crate::types::Signature;
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::debug;

/// All overloads registered under one operator name
#[derive(Debug, Clone, Default)]
pub struct OperatorMap {
    name: String,
    signatures: IndexMap<Signature, OperatorSignature>,
}

impl OperatorMap {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            signatures: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unqualified_name(&self) -> &str {
        unqualified(&self.name)
    }

    pub fn add_signature(&mut self, signature: OperatorSignature) -> Result<(), RegistryError> {
        if self.signatures.contains_key(signature.signature()) {
            return Err(RegistryError::DuplicateSignature {
                operator_name: self.name.clone(),
                signature: signature.signature().to_string(),
            });
        }

        self.signatures
            .insert(signature.signature().clone(), signature);
        Ok(())
    }

    pub fn remove_signature(
        &mut self,
        signature: &Signature,
    ) -> Result<OperatorSignature, RegistryError> {
        self.signatures
            .shift_remove(signature)
            .ok_or_else(|| RegistryError::SignatureNotFound {
                operator_name: self.name.clone(),
                signature: signature.to_string(),
            })
    }

    pub fn contains_signature(&self, signature: &Signature) -> bool {
        self.signatures.contains_key(signature)
    }

    /// Keyed lookup of a structurally identical signature
    pub fn resolve_exact(&self, call_signature: &Signature) -> Option<&OperatorSignature> {
        self.signatures.get(call_signature)
    }

    /// Score every candidate of this map against the context's call
    pub fn resolve_all(&self, catalog: &dyn TypeCatalog, context: &mut OperatorBindingContext) {
        matching::resolve_candidates(self, catalog, context);
    }

    /// Score every candidate with no pruning, for visibility-filtered passes
    pub fn resolve_unpruned(
        &self,
        catalog: &dyn TypeCatalog,
        context: &mut OperatorBindingContext,
    ) {
        matching::resolve_all_candidates(self, catalog, context);
    }

    pub fn signatures(&self) -> impl Iterator<Item = &OperatorSignature> {
        self.signatures.values()
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

/// Operator maps for every registered operator name
#[derive(Debug, Clone, Default)]
pub struct OperatorRegistry {
    maps: IndexMap<String, OperatorMap>,
}

impl OperatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an operator under its qualified name
    pub fn add_operator(&mut self, operator: Arc<Operator>) -> Result<(), RegistryError> {
        let name = operator.name.clone();
        let map = self
            .maps
            .entry(name.clone())
            .or_insert_with(|| OperatorMap::new(name.clone()));

        let result = map.add_signature(OperatorSignature::new(Arc::clone(&operator)));
        if map.is_empty() {
            // A rejected first registration must not leave an empty map behind
            self.maps.shift_remove(&name);
        }
        result?;

        debug!(operator = %operator, "registered operator");
        Ok(())
    }

    pub fn remove_operator(
        &mut self,
        name: &str,
        signature: &Signature,
    ) -> Result<Arc<Operator>, RegistryError> {
        let map = self
            .maps
            .get_mut(name)
            .ok_or_else(|| RegistryError::SignatureNotFound {
                operator_name: name.to_string(),
                signature: signature.to_string(),
            })?;

        let removed = map.remove_signature(signature)?;
        if map.is_empty() {
            self.maps.shift_remove(name);
        }

        debug!(operator = %removed.operator(), "removed operator");
        Ok(Arc::clone(removed.operator()))
    }

    pub fn contains_operator(&self, name: &str, signature: &Signature) -> bool {
        self.maps
            .get(name)
            .is_some_and(|map| map.contains_signature(signature))
    }

    pub fn get(&self, name: &str) -> Option<&OperatorMap> {
        self.maps.get(name)
    }

    /// Maps a call to `name` can refer to
    ///
    /// A qualified name (`Library.Name`) selects exactly that map; an
    /// unqualified name is compared against the final segment of every map
    /// name.
    pub fn maps_named<'a>(
        &'a self,
        name: &'a str,
    ) -> Box<dyn Iterator<Item = &'a OperatorMap> + 'a> {
        if name.contains('.') {
            return Box::new(self.maps.get(name).into_iter());
        }

        Box::new(
            self.maps
                .values()
                .filter(move |map| map.unqualified_name() == name),
        )
    }

    pub fn maps(&self) -> impl Iterator<Item = &OperatorMap> {
        self.maps.values()
    }

    /// Number of registered operator names
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}
