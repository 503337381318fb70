//! Operator definitions and their signature wrappers

use crate::types::{Signature, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Catalog-assigned operator identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperatorId(pub u64);

/// Everything needed to register an operator overload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorDefinition {
    /// Fully qualified name, e.g. `Sales.Add`
    pub name: String,
    /// Declaring library; `None` means visible from every scope (built-ins)
    pub library: Option<String>,
    pub signature: Signature,
    pub return_type: Option<TypeId>,
}

impl OperatorDefinition {
    pub fn new(name: impl Into<String>, signature: Signature) -> Self {
        Self {
            name: name.into(),
            library: None,
            signature,
            return_type: None,
        }
    }

    pub fn in_library(mut self, library: impl Into<String>) -> Self {
        self.library = Some(library.into());
        self
    }

    pub fn returning(mut self, return_type: impl Into<TypeId>) -> Self {
        self.return_type = Some(return_type.into());
        self
    }
}

/// A registered operator overload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator {
    pub id: OperatorId,
    pub name: String,
    pub library: Option<String>,
    pub signature: Signature,
    pub return_type: Option<TypeId>,
}

impl Operator {
    pub fn new(id: OperatorId, definition: OperatorDefinition) -> Self {
        Self {
            id,
            name: definition.name,
            library: definition.library,
            signature: definition.signature,
            return_type: definition.return_type,
        }
    }

    /// Final segment of the qualified name (`Sales.Add` -> `Add`)
    pub fn unqualified_name(&self) -> &str {
        unqualified(&self.name)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.signature)?;
        if let Some(return_type) = &self.return_type {
            write!(f, ": {return_type}")?;
        }
        Ok(())
    }
}

/// Final segment of a dotted operator name
pub fn unqualified(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// An operator keyed by its signature
///
/// Equality and hashing look at the signature only, so an operator map can
/// never hold two overloads that a call could not tell apart.
#[derive(Debug, Clone)]
pub struct OperatorSignature {
    operator: Arc<Operator>,
}

impl OperatorSignature {
    pub fn new(operator: Arc<Operator>) -> Self {
        Self { operator }
    }

    pub fn operator(&self) -> &Arc<Operator> {
        &self.operator
    }

    pub fn signature(&self) -> &Signature {
        &self.operator.signature
    }
}

impl PartialEq for OperatorSignature {
    fn eq(&self, other: &Self) -> bool {
        self.signature() == other.signature()
    }
}

impl Eq for OperatorSignature {}

impl Hash for OperatorSignature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.signature().hash(state);
    }
}
