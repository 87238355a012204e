//! Typed mapping façade
//!
//! `Mapper` converts typed values to and from the engine's value form and
//! forwards to a shared [`Registry`]. Cloning a mapper shares its registry.
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use crate::config::EngineConfig;
use crate::coerce::Coercion;
use crate::plan::registration::construction_fn;
use crate::plan::{Construction, MapBuilder, MappingPlan, MappingRegistration, TypePair};
use crate::projection::{Expr, IncludePath, Projection};
use crate::registry::{Registry, RegistryStats};
use crate::shape::{finite, Describe, Shape, ShapeRef, TypeDescriptor, TypeKey};
use crate::transformer::{MapContext, MapMode};
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Instance façade over a mapping registry
#[derive(Debug, Clone, Default)]
pub struct Mapper {
    registry: Arc<Registry>,
}

impl Mapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            registry: Arc::new(Registry::with_config(config)),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Register `S` to `D` with default member correspondence
    pub fn register_pair<S: Shape, D: Shape>(&self) -> Result<()> {
        self.register::<S, D>(MappingRegistration::new())
    }

    /// Register `S` to `D` with an untyped registration
    pub fn register<S: Shape, D: Shape>(&self, registration: MappingRegistration) -> Result<()> {
        self.registry
            .register(TypePair::of::<S, D>(), registration)
            .map(|_| ())
    }

    /// Register `S` to `D`, configured through the fluent builder
    pub fn register_with<S, D, F>(&self, configure: F) -> Result<()>
    where
        S: Shape,
        D: Shape,
        F: FnOnce(MapBuilder<S, D>) -> MapBuilder<S, D>,
    {
        self.register::<S, D>(configure(MapBuilder::new()).build())
    }

    /// Register `S` to `D` with a construction function (eager mapping only)
    pub fn register_construction<S, D, F>(&self, construct: F) -> Result<()>
    where
        S: Shape,
        D: Shape,
        F: Fn(&S) -> anyhow::Result<D> + Send + Sync + 'static,
    {
        let construction = Construction::Function(construction_fn(construct));
        self.register::<S, D>(MappingRegistration::constructed(construction))
    }

    /// Register `S` to `D` with a construction expression (projection capable)
    pub fn register_projection<S: Shape, D: Shape>(&self, expr: Expr) -> Result<()> {
        self.register::<S, D>(MappingRegistration::constructed(Construction::Expression(expr)))
    }

    /// Map one value
    pub fn map<S: Shape, D: Shape>(&self, source: &S) -> Result<D> {
        let value = self.transform(TypePair::of::<S, D>(), &source_value(source)?, MapMode::Deep)?;
        from_value(value)
    }

    /// Map only the top level of a value
    pub fn map_shallow<S: Shape, D: Shape>(&self, source: &S) -> Result<D> {
        let value = self.transform(TypePair::of::<S, D>(), &source_value(source)?, MapMode::Shallow)?;
        from_value(value)
    }

    /// Map into an existing destination, returning the same destination
    pub fn map_into<'d, S: Shape, D: Shape>(&self, source: &S, destination: &'d mut D) -> Result<&'d mut D> {
        let entry = self.registry.resolve(TypePair::of::<S, D>())?;
        let mut target = to_value(&*destination)?;
        entry
            .transformer()
            .transform_into(&source_value(source)?, &mut target, &MapContext::deep(&self.registry))?;
        *destination = from_value(target)?;
        Ok(destination)
    }

    /// Map every element of a sequence, in order
    pub fn map_all<'a, S, D, I>(&self, sources: I) -> Result<Vec<D>>
    where
        S: Shape,
        D: Shape,
        I: IntoIterator<Item = &'a S>,
    {
        self.map_to_collection::<S, D, I, Vec<D>>(sources)
    }

    /// Map a sequence into a fixed-size array
    pub fn map_to_array<S: Shape, D: Shape, const N: usize>(&self, sources: &[S]) -> Result<[D; N]> {
        let mapped = self.map_all::<S, D, _>(sources)?;
        let len = mapped.len();
        mapped.try_into().map_err(|_| Error::Materialization {
            type_name: format!("[{}; {}]", TypeKey::of::<D>().short_name(), N),
            message: format!("expected {} elements, found {}", N, len),
        })
    }

    /// Map a sequence into any collection buildable from an iterator
    pub fn map_to_collection<'a, S, D, I, C>(&self, sources: I) -> Result<C>
    where
        S: Shape,
        D: Shape,
        I: IntoIterator<Item = &'a S>,
        C: FromIterator<D>,
    {
        let entry = self.registry.resolve(TypePair::of::<S, D>())?;
        let ctx = MapContext::deep(&self.registry);
        sources
            .into_iter()
            .map(|source| {
                let value = entry.transformer().transform(&source_value(source)?, &ctx)?;
                from_value::<D>(value)
            })
            .collect()
    }

    /// Map a dictionary, converting keys as scalars and values as shapes
    pub fn map_dictionary<'a, KS, S, KD, D, I, C>(&self, source: I) -> Result<C>
    where
        KS: Describe + Serialize + 'static,
        KD: Describe + DeserializeOwned + 'static,
        S: Shape,
        D: Shape,
        I: IntoIterator<Item = (&'a KS, &'a S)>,
        C: FromIterator<(KD, D)>,
    {
        let pair = TypePair::of::<S, D>();
        let coercion = key_coercion::<KS, KD>(pair, self.registry.config())?;
        let entry = self.registry.resolve(pair)?;
        let ctx = MapContext::deep(&self.registry);

        source
            .into_iter()
            .map(|(key, value)| {
                let key = source_value(key)?;
                let key = match &coercion {
                    Some(coercion) => coercion.apply(&key, "key")?,
                    None => key,
                };
                let value = entry.transformer().transform(&source_value(value)?, &ctx)?;
                Ok::<(KD, D), Error>((from_value(key)?, from_value(value)?))
            })
            .collect()
    }

    /// Map to a destination chosen at runtime
    pub fn map_dynamic<S: Shape>(&self, source: &S, destination: ShapeRef) -> Result<Value> {
        self.transform(TypePair::new(ShapeRef::of::<S>(), destination), &source_value(source)?, MapMode::Deep)
    }

    /// Map to the single destination registered for `S`
    pub fn map_to_registered<S: Shape>(&self, source: &S) -> Result<Value> {
        let shape = ShapeRef::of::<S>();
        let destinations = self.registry.registered_destinations(shape.key());
        match destinations.as_slice() {
            [destination] => self.map_dynamic(source, *destination),
            [] => Err(Error::configuration(
                shape.name(),
                None,
                "no destination is registered for this source",
            )),
            _ => Err(Error::configuration(
                shape.name(),
                None,
                format!(
                    "ambiguous destination: {} are registered",
                    destinations.iter().map(|d| d.name()).collect::<Vec<_>>().join(", ")
                ),
            )),
        }
    }

    /// Mapping plan of `S` to `D`
    pub fn plan<S: Shape, D: Shape>(&self) -> Result<Arc<MappingPlan>> {
        self.registry.plan(TypePair::of::<S, D>())
    }

    /// Default projection of `S` to `D`
    pub fn projection<S: Shape, D: Shape>(&self) -> Result<Arc<Projection>> {
        self.registry.projection(TypePair::of::<S, D>())
    }

    /// Projection of `S` to `D` with include paths
    pub fn project_with<S, D, I, P>(&self, includes: I) -> Result<Projection>
    where
        S: Shape,
        D: Shape,
        I: IntoIterator<Item = P>,
        P: Into<IncludePath>,
    {
        self.registry.project_with(TypePair::of::<S, D>(), includes)
    }

    /// Project in-memory sources through the default projection
    pub fn project_to<'a, S, D, I>(&self, sources: I) -> Result<Vec<D>>
    where
        S: Shape,
        D: Shape,
        I: IntoIterator<Item = &'a S>,
    {
        let projection = self.projection::<S, D>()?;
        evaluate_all(&projection, sources)
    }

    /// Project in-memory sources, expanding recursive members along `includes`
    pub fn project_to_with_includes<'a, S, D, I, J, P>(&self, sources: I, includes: J) -> Result<Vec<D>>
    where
        S: Shape,
        D: Shape,
        I: IntoIterator<Item = &'a S>,
        J: IntoIterator<Item = P>,
        P: Into<IncludePath>,
    {
        let projection = self.project_with::<S, D, _, _>(includes)?;
        evaluate_all(&projection, sources)
    }

    pub fn stats(&self) -> RegistryStats {
        self.registry.stats()
    }

    fn transform(&self, pair: TypePair, source: &Value, mode: MapMode) -> Result<Value> {
        let entry = self.registry.resolve(pair)?;
        entry
            .transformer()
            .transform(source, &MapContext::new(&self.registry, mode))
    }
}

fn evaluate_all<'a, S, D, I>(projection: &Projection, sources: I) -> Result<Vec<D>>
where
    S: Shape,
    D: Shape,
    I: IntoIterator<Item = &'a S>,
{
    sources
        .into_iter()
        .map(|source| from_value::<D>(projection.evaluate(&source_value(source)?)?))
        .collect()
}

fn key_coercion<KS: Describe, KD: Describe>(pair: TypePair, config: &EngineConfig) -> Result<Option<Coercion>> {
    let (source, destination) = (TypeDescriptor::of::<KS>(), TypeDescriptor::of::<KD>());
    let (Some(from), Some(to)) = (source.as_scalar(), destination.as_scalar()) else {
        return Err(Error::configuration(
            pair.to_string(),
            None,
            format!("dictionary keys must be scalar, found {} and {}", source, destination),
        ));
    };
    if from == to {
        return Ok(None);
    }
    Coercion::between(from, to, config.float_to_int)
        .map(Some)
        .ok_or_else(|| {
            Error::configuration(
                pair.to_string(),
                None,
                format!("no conversion from {} to {} for dictionary keys", from, to),
            )
        })
}

fn to_value<T: Serialize + 'static>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| Error::Materialization {
        type_name: TypeKey::of::<T>().short_name().to_string(),
        message: e.to_string(),
    })
}

/// Value form of a source, rejecting floats the value model cannot hold
fn source_value<T: Serialize + 'static>(value: &T) -> Result<Value> {
    let converted = to_value(value)?;
    if finite::contains_null(&converted) {
        finite::ensure_finite(value, TypeKey::of::<T>().short_name())?;
    }
    Ok(converted)
}

fn from_value<T: DeserializeOwned + 'static>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| Error::Materialization {
        type_name: TypeKey::of::<T>().short_name().to_string(),
        message: e.to_string(),
    })
}
