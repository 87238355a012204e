//! Per-call mapping context
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use crate::plan::TypePair;
use crate::registry::Registry;
use crate::{Error, Result};
use serde_json::Value;
use std::fmt;

/// How far a transformation descends into navigation members
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapMode {
    /// Nested objects and collections are mapped recursively
    Deep,
    /// Only the top level is mapped; navigation members are copied verbatim
    /// when their declared types are identical, otherwise left at default
    Shallow,
}

/// Context threaded through one transformation
#[derive(Clone, Copy)]
pub struct MapContext<'r> {
    registry: &'r Registry,
    mode: MapMode,
    depth: usize,
}

impl<'r> MapContext<'r> {
    pub fn new(registry: &'r Registry, mode: MapMode) -> Self {
        Self {
            registry,
            mode,
            depth: 0,
        }
    }

    pub fn deep(registry: &'r Registry) -> Self {
        Self::new(registry, MapMode::Deep)
    }

    pub fn shallow(registry: &'r Registry) -> Self {
        Self::new(registry, MapMode::Shallow)
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    pub fn mode(&self) -> MapMode {
        self.mode
    }

    /// Nesting level of the object currently being mapped
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Map `value` through the cached transformer of `pair`
    pub fn map_nested(&self, pair: TypePair, value: &Value) -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        let child = self.descend()?;
        let entry = self.registry.resolve(pair)?;
        entry.transformer().transform(value, &child)
    }

    fn descend(&self) -> Result<Self> {
        if let Some(limit) = self.registry.config().max_depth {
            if self.depth >= limit {
                log::warn!("Mapping depth limit of {} reached", limit);
                return Err(Error::DepthExceeded { limit });
            }
        }
        Ok(Self {
            registry: self.registry,
            mode: MapMode::Deep,
            depth: self.depth + 1,
        })
    }
}

impl fmt::Debug for MapContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapContext")
            .field("mode", &self.mode)
            .field("depth", &self.depth)
            .finish()
    }
}
