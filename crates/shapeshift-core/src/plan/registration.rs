//! Registration-time configuration of a type pair
//!
//! This module provides the fluent builder used to skip members, override
//! them with constants, expressions or computed values, or replace the
//! whole construction of the destination.
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use crate::projection::Expr;
use crate::shape::{Shape, TypeKey};
use crate::{Error, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A function of the whole source value
pub type ValueFn = Arc<dyn Fn(&Value) -> Result<Value> + Send + Sync>;

/// Replacement for the default handling of one destination member
#[derive(Clone)]
pub enum MemberOverride {
    /// Leave the member at its default value
    Skip,
    /// Always assign this value
    Constant(Value),
    /// Evaluate a projection expression over the source
    Expression(Expr),
    /// Call a function of the source (eager mapping only)
    Compute(ValueFn),
}

impl fmt::Debug for MemberOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberOverride::Skip => write!(f, "Skip"),
            MemberOverride::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            MemberOverride::Expression(e) => f.debug_tuple("Expression").field(e).finish(),
            MemberOverride::Compute(_) => write!(f, "Compute(<fn>)"),
        }
    }
}

impl fmt::Display for MemberOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberOverride::Skip => write!(f, "skip"),
            MemberOverride::Constant(v) => write!(f, "constant {}", v),
            MemberOverride::Expression(e) => write!(f, "{}", e),
            MemberOverride::Compute(_) => write!(f, "<fn>"),
        }
    }
}

/// Replacement for the whole construction of the destination
#[derive(Clone)]
pub enum Construction {
    /// Projection-capable construction
    Expression(Expr),
    /// Opaque function, eager mapping only
    Function(ValueFn),
}

impl fmt::Debug for Construction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Construction::Expression(e) => f.debug_tuple("Expression").field(e).finish(),
            Construction::Function(_) => write!(f, "Function(<fn>)"),
        }
    }
}

impl fmt::Display for Construction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Construction::Expression(e) => write!(f, "{}", e),
            Construction::Function(_) => write!(f, "<fn>"),
        }
    }
}

/// Untyped registration handed to the registry
#[derive(Debug, Clone, Default)]
pub struct MappingRegistration {
    construction: Option<Construction>,
    overrides: BTreeMap<String, MemberOverride>,
}

impl MappingRegistration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registration consisting of a construction override only
    pub fn constructed(construction: Construction) -> Self {
        Self {
            construction: Some(construction),
            overrides: BTreeMap::new(),
        }
    }

    /// Override one member; a later override of the same member wins
    pub fn with_override(mut self, member: impl Into<String>, rule: MemberOverride) -> Self {
        self.overrides.insert(member.into(), rule);
        self
    }

    pub fn with_construction(mut self, construction: Construction) -> Self {
        self.construction = Some(construction);
        self
    }

    pub fn construction(&self) -> Option<&Construction> {
        self.construction.as_ref()
    }

    /// Member overrides, ordered by member name
    pub fn overrides(&self) -> &BTreeMap<String, MemberOverride> {
        &self.overrides
    }

    pub fn override_for(&self, member: &str) -> Option<&MemberOverride> {
        self.overrides.get(member)
    }
}

/// Typed fluent builder for a registration of `S` to `D`
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use shapeshift_core::{shape, MapBuilder};
///
/// shape! {
///     #[derive(Debug, Default, Serialize, Deserialize)]
///     pub struct Person { pub first: String, pub last: String }
/// }
///
/// shape! {
///     #[derive(Debug, Default, Serialize, Deserialize)]
///     pub struct PersonDto { pub first: String, pub full_name: String, pub source: String }
/// }
///
/// let registration = MapBuilder::<Person, PersonDto>::new()
///     .skip("first")
///     .constant("source", "crm")
///     .compute("full_name", |p: &Person| Ok(format!("{} {}", p.first, p.last)))
///     .build();
///
/// assert_eq!(registration.overrides().len(), 3);
/// ```
pub struct MapBuilder<S, D> {
    registration: MappingRegistration,
    _pair: PhantomData<fn(S) -> D>,
}

impl<S: Shape, D: Shape> MapBuilder<S, D> {
    pub fn new() -> Self {
        Self {
            registration: MappingRegistration::new(),
            _pair: PhantomData,
        }
    }

    /// Leave `member` at its default value
    pub fn skip(mut self, member: &str) -> Self {
        self.registration = self.registration.with_override(member, MemberOverride::Skip);
        self
    }

    /// Assign a constant to `member`
    pub fn constant(mut self, member: &str, value: impl Into<Value>) -> Self {
        self.registration = self
            .registration
            .with_override(member, MemberOverride::Constant(value.into()));
        self
    }

    /// Assign the value of a projection expression over the source
    pub fn expression(mut self, member: &str, expr: Expr) -> Self {
        self.registration = self
            .registration
            .with_override(member, MemberOverride::Expression(expr));
        self
    }

    /// Assign a value computed from the typed source
    pub fn compute<T, F>(mut self, member: &str, f: F) -> Self
    where
        T: Serialize + 'static,
        F: Fn(&S) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        let member_name = member.to_string();
        let compute: ValueFn = Arc::new(move |value: &Value| {
            let source: S = typed_source::<S>(value)?;
            let computed = f(&source).map_err(|e| {
                Error::construction(format!("{}.{}", TypeKey::of::<D>().short_name(), member_name), e)
            })?;
            serde_json::to_value(computed).map_err(|e| Error::Materialization {
                type_name: TypeKey::of::<T>().short_name().to_string(),
                message: e.to_string(),
            })
        });
        self.registration = self
            .registration
            .with_override(member, MemberOverride::Compute(compute));
        self
    }

    /// Construct the destination with a function of the typed source
    pub fn construct_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&S) -> anyhow::Result<D> + Send + Sync + 'static,
    {
        self.registration = self
            .registration
            .with_construction(Construction::Function(construction_fn(f)));
        self
    }

    /// Construct the destination from a projection expression
    pub fn construct_from(mut self, expr: Expr) -> Self {
        self.registration = self
            .registration
            .with_construction(Construction::Expression(expr));
        self
    }

    pub fn build(self) -> MappingRegistration {
        self.registration
    }
}

impl<S: Shape, D: Shape> Default for MapBuilder<S, D> {
    fn default() -> Self {
        Self::new()
    }
}

/// Wrap a typed construction closure as a value function
pub(crate) fn construction_fn<S, D, F>(f: F) -> ValueFn
where
    S: Shape,
    D: Shape,
    F: Fn(&S) -> anyhow::Result<D> + Send + Sync + 'static,
{
    Arc::new(move |value: &Value| {
        let source: S = typed_source::<S>(value)?;
        let built = f(&source).map_err(|e| Error::construction(TypeKey::of::<D>().short_name(), e))?;
        serde_json::to_value(built).map_err(|e| Error::Materialization {
            type_name: TypeKey::of::<D>().short_name().to_string(),
            message: e.to_string(),
        })
    })
}

fn typed_source<S: Shape>(value: &Value) -> Result<S> {
    serde_json::from_value(value.clone()).map_err(|e| Error::Materialization {
        type_name: TypeKey::of::<S>().short_name().to_string(),
        message: e.to_string(),
    })
}
