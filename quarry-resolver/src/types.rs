//! Parameter and signature model for operator overloads
//!
//! A signature is the ordered list of formal parameters that identifies one
//! overload of an operator. Signatures are immutable once built and compare
//! structurally, which is what lets the operator maps key on them directly.

use std::fmt;

/// Semantic type handle as seen by the resolver
///
/// The resolver never inspects a type beyond its identity; subtype and
/// conversion questions are answered by a [`crate::TypeCatalog`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub String);

impl TypeId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TypeId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TypeId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How an argument is passed to a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Modifier {
    /// Passed by value (the default)
    #[default]
    Value,
    /// Passed by reference; the callee may read and write it
    Var,
    /// Passed by reference; the callee only writes it
    Out,
}

impl Modifier {
    /// By-reference positions never accept a converted argument
    pub fn is_by_reference(self) -> bool {
        matches!(self, Self::Var | Self::Out)
    }

    fn prefix(self) -> &'static str {
        match self {
            Self::Value => "",
            Self::Var => "var ",
            Self::Out => "out ",
        }
    }
}

/// A single formal (or actual) parameter: a type plus its passing modifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Parameter {
    pub data_type: TypeId,
    pub modifier: Modifier,
}

impl Parameter {
    pub fn new(data_type: impl Into<TypeId>, modifier: Modifier) -> Self {
        Self {
            data_type: data_type.into(),
            modifier,
        }
    }

    pub fn value(data_type: impl Into<TypeId>) -> Self {
        Self::new(data_type, Modifier::Value)
    }

    pub fn var(data_type: impl Into<TypeId>) -> Self {
        Self::new(data_type, Modifier::Var)
    }

    pub fn out(data_type: impl Into<TypeId>) -> Self {
        Self::new(data_type, Modifier::Out)
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.modifier.prefix(), self.data_type)
    }
}

/// Ordered parameter list identifying an operator overload
///
/// Two signatures are equal iff every position has the same type and the
/// same modifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Signature {
    parameters: Vec<Parameter>,
}

impl Signature {
    pub fn new(parameters: Vec<Parameter>) -> Self {
        Self { parameters }
    }

    /// Build a signature where every parameter is passed by value
    pub fn of_values<I, T>(types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TypeId>,
    {
        types.into_iter().map(Parameter::value).collect()
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn get(&self, index: usize) -> Option<&Parameter> {
        self.parameters.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Parameter> {
        self.parameters.iter()
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

impl FromIterator<Parameter> for Signature {
    fn from_iter<I: IntoIterator<Item = Parameter>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Signature {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.parameters.iter()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (index, parameter) in self.parameters.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{parameter}")?;
        }
        f.write_str(")")
    }
}
