//! Mapping registry and cache
//!
//! The registry owns every artifact built for a type pair: the mapping
//! plan, the compiled eager transformer and the lazily built default
//! projection. Entries are built at most once per pair and never evicted.
//!
//! Lookups take a lock-free path over the table of completed entries;
//! builds are serialized per pair through a slot mutex, so racing callers
//! wait for the first build and observe the same entry.
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use crate::config::EngineConfig;
use crate::plan::{MappingPlan, MappingRegistration, PlanBuilder, TypePair};
use crate::projection::{IncludePath, Projection, ProjectionBuilder};
use crate::shape::{ShapeIntrospector, ShapeRef, TypeKey};
use crate::transformer::CompiledTransformer;
use crate::{Error, Result};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, instrument};


/// Cached artifacts of one type pair
pub struct CacheEntry {
    pair: TypePair,
    registered: bool,
    plan: Arc<MappingPlan>,
    transformer: CompiledTransformer,
    projection: OnceLock<Result<Arc<Projection>>>,
}

impl CacheEntry {
    pub fn pair(&self) -> TypePair {
        self.pair
    }

    /// Whether the pair was explicitly registered (as opposed to built on first use)
    pub fn is_registered(&self) -> bool {
        self.registered
    }

    pub fn plan(&self) -> &Arc<MappingPlan> {
        &self.plan
    }

    pub fn transformer(&self) -> &CompiledTransformer {
        &self.transformer
    }

    /// Whether the default projection has been built (successfully or not)
    pub fn has_projection(&self) -> bool {
        self.projection.get().is_some()
    }
}

impl fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("pair", &self.pair)
            .field("registered", &self.registered)
            .field("members", &self.plan.members().len())
            .field("projection", &self.has_projection())
            .finish()
    }
}

#[derive(Default)]
struct Slot {
    registration: Option<Arc<MappingRegistration>>,
    entry: Option<Arc<CacheEntry>>,
}

/// Registry statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    /// Completed cache entries
    pub entries: usize,
    /// Explicitly registered pairs
    pub registrations: usize,
    /// Successful plan builds; never exceeds one per pair
    pub plans_built: usize,
    /// Distinct shapes introspected
    pub shapes_described: usize,
}

/// Owned, shareable table of mapping artifacts keyed by type pair
pub struct Registry {
    config: EngineConfig,
    introspector: ShapeIntrospector,
    entries: DashMap<TypePair, Arc<CacheEntry>>,
    slots: DashMap<TypePair, Arc<Mutex<Slot>>>,
    plans_built: AtomicUsize,
    registrations: AtomicUsize,
}

impl Registry {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            introspector: ShapeIntrospector::new(),
            entries: DashMap::new(),
            slots: DashMap::new(),
            plans_built: AtomicUsize::new(0),
            registrations: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn introspector(&self) -> &ShapeIntrospector {
        &self.introspector
    }

    /// Register a pair, building its plan and transformer immediately
    ///
    /// Fails when the pair is already registered or was already built on
    /// first use. A failing build leaves the pair unregistered.
    #[instrument(skip_all, fields(pair = %pair))]
    pub fn register(&self, pair: TypePair, registration: MappingRegistration) -> Result<Arc<CacheEntry>> {
        let slot = self.slot(pair);
        let mut slot = slot.lock();

        if slot.registration.is_some() || slot.entry.is_some() {
            return Err(Error::DuplicateRegistration {
                source_type: pair.source.name().to_string(),
                destination_type: pair.destination.name().to_string(),
            });
        }

        let registration = Arc::new(registration);
        let entry = self.build_entry(pair, Some(&registration))?;

        slot.registration = Some(registration);
        slot.entry = Some(Arc::clone(&entry));
        self.entries.insert(pair, Arc::clone(&entry));
        self.registrations.fetch_add(1, Ordering::Relaxed);

        info!("Registered mapping");
        Ok(entry)
    }

    /// Cached entry of a pair, building it on first use
    pub fn resolve(&self, pair: TypePair) -> Result<Arc<CacheEntry>> {
        if let Some(entry) = self.entries.get(&pair) {
            return Ok(Arc::clone(entry.value()));
        }

        let slot = self.slot(pair);
        let mut slot = slot.lock();

        // Another caller may have finished the build while we waited
        if let Some(entry) = &slot.entry {
            return Ok(Arc::clone(entry));
        }

        let registration = slot.registration.clone();
        let entry = self.build_entry(pair, registration.as_deref())?;
        slot.entry = Some(Arc::clone(&entry));
        self.entries.insert(pair, Arc::clone(&entry));
        Ok(entry)
    }

    /// Mapping plan of a pair
    pub fn plan(&self, pair: TypePair) -> Result<Arc<MappingPlan>> {
        Ok(Arc::clone(self.resolve(pair)?.plan()))
    }

    /// Default projection of a pair, built once on first request
    pub fn projection(&self, pair: TypePair) -> Result<Arc<Projection>> {
        let entry = self.resolve(pair)?;
        entry
            .projection
            .get_or_init(|| ProjectionBuilder::new(self).build(pair).map(Arc::new))
            .clone()
    }

    /// Projection with include paths forcing expansion of recursive members
    ///
    /// Built per call; the cached default projection is left untouched.
    pub fn project_with<I, P>(&self, pair: TypePair, includes: I) -> Result<Projection>
    where
        I: IntoIterator<Item = P>,
        P: Into<IncludePath>,
    {
        ProjectionBuilder::new(self).with_includes(includes).build(pair)
    }

    /// Whether a completed entry exists for the pair
    pub fn contains(&self, pair: TypePair) -> bool {
        self.entries.contains_key(&pair)
    }

    /// Destination shapes with a cached or registered entry for `source`
    pub fn destinations_for(&self, source: TypeKey) -> Vec<ShapeRef> {
        self.collect_destinations(source, |_| true)
    }

    /// Destination shapes explicitly registered for `source`
    pub fn registered_destinations(&self, source: TypeKey) -> Vec<ShapeRef> {
        self.collect_destinations(source, CacheEntry::is_registered)
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            entries: self.entries.len(),
            registrations: self.registrations.load(Ordering::Relaxed),
            plans_built: self.plans_built.load(Ordering::Relaxed),
            shapes_described: self.introspector.described_count(),
        }
    }

    fn collect_destinations(&self, source: TypeKey, filter: impl Fn(&CacheEntry) -> bool) -> Vec<ShapeRef> {
        let mut destinations: Vec<ShapeRef> = self
            .entries
            .iter()
            .filter(|entry| entry.key().source.key() == source && filter(entry.value()))
            .map(|entry| entry.key().destination)
            .collect();
        destinations.sort_by_key(|shape| shape.key().name());
        destinations
    }

    fn slot(&self, pair: TypePair) -> Arc<Mutex<Slot>> {
        Arc::clone(self.slots.entry(pair).or_default().value())
    }

    #[instrument(skip_all, fields(pair = %pair))]
    fn build_entry(&self, pair: TypePair, registration: Option<&MappingRegistration>) -> Result<Arc<CacheEntry>> {
        let plan = PlanBuilder::new(&self.introspector, &self.config).build(pair, registration)?;
        let transformer = CompiledTransformer::compile(&plan)?;
        let built = self.plans_built.fetch_add(1, Ordering::Relaxed) + 1;

        debug!(members = plan.members().len(), plans_built = built, "Built mapping");
        Ok(Arc::new(CacheEntry {
            pair,
            registered: registration.is_some(),
            plan: Arc::new(plan),
            transformer,
            projection: OnceLock::new(),
        }))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}
