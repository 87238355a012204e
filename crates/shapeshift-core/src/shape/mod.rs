//! Shape introspection
//!
//! A shape is a type's ordered set of mappable members. Shapes are declared
//! ahead of time through the [`Shape`] trait (usually via the `shape!`
//! macro); member types are described through [`Describe`], which covers
//! scalars, chrono temporals, `Option`, `Box`, the standard collections,
//! maps and key/value pairs.
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

pub mod describe;
pub mod finite;
pub mod introspector;
pub mod macros;
pub mod types;

pub use introspector::ShapeIntrospector;
pub use types::{
    CollectionKind, Describe, MapKind, MemberClass, MemberDescriptor, ScalarKind, Shape,
    ShapeDescriptor, ShapeRef, TypeDescriptor, TypeKey,
};
