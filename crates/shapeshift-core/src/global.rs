//! Process-wide static façade
//!
//! Mirrors [`Mapper`] over one shared instance, created on first use with
//! the default configuration merged with environment overrides. Use
//! [`init`] before any other call to choose the configuration explicitly.
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use crate::config::EngineConfig;
use crate::mapper::Mapper;
use crate::plan::{MapBuilder, MappingPlan, MappingRegistration};
use crate::projection::{Expr, IncludePath, Projection};
use crate::registry::RegistryStats;
use crate::shape::{Describe, Shape};
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, OnceLock};

static MAPPER: OnceLock<Mapper> = OnceLock::new();

/// Install the shared mapper with an explicit configuration
///
/// Fails when the shared mapper already exists.
pub fn init(config: EngineConfig) -> Result<()> {
    MAPPER.set(Mapper::with_config(config)).map_err(|_| Error::Unsupported {
        message: "the shared mapper is already initialized".to_string(),
        feature: Some("global init".to_string()),
    })
}

/// The shared mapper
pub fn mapper() -> &'static Mapper {
    MAPPER.get_or_init(|| {
        let mut config = EngineConfig::default();
        config.merge_with_env();
        tracing::debug!(?config, "Initializing shared mapper");
        Mapper::with_config(config)
    })
}

pub fn register_pair<S: Shape, D: Shape>() -> Result<()> {
    mapper().register_pair::<S, D>()
}

pub fn register<S: Shape, D: Shape>(registration: MappingRegistration) -> Result<()> {
    mapper().register::<S, D>(registration)
}

pub fn register_with<S, D, F>(configure: F) -> Result<()>
where
    S: Shape,
    D: Shape,
    F: FnOnce(MapBuilder<S, D>) -> MapBuilder<S, D>,
{
    mapper().register_with(configure)
}

pub fn register_construction<S, D, F>(construct: F) -> Result<()>
where
    S: Shape,
    D: Shape,
    F: Fn(&S) -> anyhow::Result<D> + Send + Sync + 'static,
{
    mapper().register_construction(construct)
}

pub fn register_projection<S: Shape, D: Shape>(expr: Expr) -> Result<()> {
    mapper().register_projection::<S, D>(expr)
}

pub fn map<S: Shape, D: Shape>(source: &S) -> Result<D> {
    mapper().map(source)
}

pub fn map_shallow<S: Shape, D: Shape>(source: &S) -> Result<D> {
    mapper().map_shallow(source)
}

pub fn map_into<'d, S: Shape, D: Shape>(source: &S, destination: &'d mut D) -> Result<&'d mut D> {
    mapper().map_into(source, destination)
}

pub fn map_all<'a, S, D, I>(sources: I) -> Result<Vec<D>>
where
    S: Shape,
    D: Shape,
    I: IntoIterator<Item = &'a S>,
{
    mapper().map_all(sources)
}

pub fn map_to_array<S: Shape, D: Shape, const N: usize>(sources: &[S]) -> Result<[D; N]> {
    mapper().map_to_array(sources)
}

pub fn map_to_collection<'a, S, D, I, C>(sources: I) -> Result<C>
where
    S: Shape,
    D: Shape,
    I: IntoIterator<Item = &'a S>,
    C: FromIterator<D>,
{
    mapper().map_to_collection::<S, D, I, C>(sources)
}

pub fn map_dictionary<'a, KS, S, KD, D, I, C>(source: I) -> Result<C>
where
    KS: Describe + Serialize + 'static,
    KD: Describe + DeserializeOwned + 'static,
    S: Shape,
    D: Shape,
    I: IntoIterator<Item = (&'a KS, &'a S)>,
    C: FromIterator<(KD, D)>,
{
    mapper().map_dictionary::<KS, S, KD, D, I, C>(source)
}

pub fn map_dynamic<S: Shape>(source: &S, destination: crate::ShapeRef) -> Result<Value> {
    mapper().map_dynamic(source, destination)
}

pub fn map_to_registered<S: Shape>(source: &S) -> Result<Value> {
    mapper().map_to_registered(source)
}

pub fn plan<S: Shape, D: Shape>() -> Result<Arc<MappingPlan>> {
    mapper().plan::<S, D>()
}

pub fn projection<S: Shape, D: Shape>() -> Result<Arc<Projection>> {
    mapper().projection::<S, D>()
}

pub fn project_with<S, D, I, P>(includes: I) -> Result<Projection>
where
    S: Shape,
    D: Shape,
    I: IntoIterator<Item = P>,
    P: Into<IncludePath>,
{
    mapper().project_with::<S, D, I, P>(includes)
}

pub fn project_to<'a, S, D, I>(sources: I) -> Result<Vec<D>>
where
    S: Shape,
    D: Shape,
    I: IntoIterator<Item = &'a S>,
{
    mapper().project_to(sources)
}

pub fn project_to_with_includes<'a, S, D, I, J, P>(sources: I, includes: J) -> Result<Vec<D>>
where
    S: Shape,
    D: Shape,
    I: IntoIterator<Item = &'a S>,
    J: IntoIterator<Item = P>,
    P: Into<IncludePath>,
{
    mapper().project_to_with_includes(sources, includes)
}

pub fn stats() -> RegistryStats {
    mapper().stats()
}
