//! Memoized shape introspection
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use super::types::{Shape, ShapeDescriptor, ShapeRef, TypeKey};
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Enumerates the members of shapes, once per type
#[derive(Debug, Default)]
pub struct ShapeIntrospector {
    cache: DashMap<TypeKey, Arc<ShapeDescriptor>>,
    described: AtomicUsize,
}

impl ShapeIntrospector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Describe a shape; repeated calls return the same descriptor
    pub fn describe(&self, shape: ShapeRef) -> Arc<ShapeDescriptor> {
        if let Some(descriptor) = self.cache.get(&shape.key()) {
            return Arc::clone(descriptor.value());
        }

        let entry = self.cache.entry(shape.key()).or_insert_with(|| {
            self.described.fetch_add(1, Ordering::Relaxed);
            Arc::new(ShapeDescriptor::new(shape, shape.members()))
        });
        Arc::clone(entry.value())
    }

    /// Describe `T`
    pub fn describe_type<T: Shape>(&self) -> Arc<ShapeDescriptor> {
        self.describe(ShapeRef::of::<T>())
    }

    /// Number of distinct shapes described so far
    pub fn described_count(&self) -> usize {
        self.described.load(Ordering::Relaxed)
    }
}
