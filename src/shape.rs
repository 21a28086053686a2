//! Declared result shapes
//!
//! The caller describes what a query is supposed to return: either a record
//! (named fields, each with a set of admissible host types) or a single
//! scalar. Shapes are explicit builder values constructed at the call site;
//! there is no runtime reflection to recover them from a struct definition.

use crate::types::HostType;

/// The set of host types a declared field admits, with the null marker kept
/// as a separate flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSet {
    allowed: Vec<HostType>,
    nullable: bool,
}

impl TypeSet {
    /// A set containing exactly one type.
    pub fn of(ty: impl Into<HostType>) -> Self {
        Self {
            allowed: vec![ty.into()],
            nullable: false,
        }
    }

    /// A union of several types, in declaration order.
    pub fn any_of(types: impl IntoIterator<Item = HostType>) -> Self {
        Self {
            allowed: types.into_iter().collect(),
            nullable: false,
        }
    }

    /// Mark the set as also admitting null.
    pub fn or_null(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn allows(&self, ty: &HostType) -> bool {
        self.allowed.contains(ty)
    }

    pub fn allows_null(&self) -> bool {
        self.nullable
    }

    /// The non-null members, in declaration order.
    pub fn allowed(&self) -> &[HostType] {
        &self.allowed
    }
}

/// One field of a record shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub types: TypeSet,
}

/// The declared result shape of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    Scalar(TypeSet),
    Record(Vec<Field>),
}

impl Shape {
    pub fn scalar(types: TypeSet) -> Self {
        Shape::Scalar(types)
    }

    /// A record shape; field order is the declaration order used for error
    /// reporting, matching itself is by name.
    pub fn record<N: Into<String>>(fields: impl IntoIterator<Item = (N, TypeSet)>) -> Self {
        Shape::Record(
            fields
                .into_iter()
                .map(|(name, types)| Field {
                    name: name.into(),
                    types,
                })
                .collect(),
        )
    }
}

/// An expected result column extracted from a record shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedColumn {
    pub name: String,
    pub types: TypeSet,
}

/// The expectation for a scalar shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedScalar {
    pub types: TypeSet,
}

/// What the checker runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expectation {
    Scalar(ExpectedScalar),
    Record(Vec<ExpectedColumn>),
}

/// Turn a declared shape into checker expectations.
///
/// Shapes already carry `(name, allowed types, nullable)` per field, so this
/// is a structural pass-through.
pub fn extract_expected(shape: &Shape) -> Expectation {
    match shape {
        Shape::Scalar(types) => Expectation::Scalar(ExpectedScalar {
            types: types.clone(),
        }),
        Shape::Record(fields) => Expectation::Record(
            fields
                .iter()
                .map(|f| ExpectedColumn {
                    name: f.name.clone(),
                    types: f.types.clone(),
                })
                .collect(),
        ),
    }
}
