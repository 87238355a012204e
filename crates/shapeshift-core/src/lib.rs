//! Shapeshift Core - Plan-driven object graph mapping and query projection
//!
//! This crate maps values of one declared shape onto another. For every
//! (source, destination) pair it builds a member-by-member mapping plan once,
//! then turns that plan into either an eager transformer or an analyzable
//! projection expression that a query engine can translate.
//!
//! # Main Components
//!
//! - **Shapes**: Declared member lists and type descriptors (`shape!`, [`Describe`])
//! - **Plans**: Structural compatibility rules, overrides and construction
//! - **Transformers**: Compiled eager mapping in deep and shallow modes
//! - **Projections**: Expression trees with bounded recursion and include paths
//! - **Registry**: Build-once, thread-safe cache of every artifact per pair
//! - **Façades**: [`Mapper`] instances and the process-wide [`global`] mapper
//!
//! # Example
//!
//! ```
//! use serde::{Deserialize, Serialize};
//! use shapeshift_core::{shape, Mapper, Result};
//!
//! shape! {
//!     #[derive(Debug, Default, Serialize, Deserialize)]
//!     pub struct Customer {
//!         pub id: i32,
//!         pub name: String,
//!     }
//! }
//!
//! shape! {
//!     #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
//!     pub struct CustomerDto {
//!         pub id: i64,
//!         pub name: String,
//!     }
//! }
//!
//! fn example() -> Result<()> {
//!     let mapper = Mapper::new();
//!     let dto: CustomerDto = mapper.map(&Customer { id: 7, name: "Ada".into() })?;
//!     assert_eq!(dto, CustomerDto { id: 7, name: "Ada".into() });
//!     Ok(())
//! }
//! # example().unwrap();
//! ```
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

pub mod coerce;
pub mod config;
pub mod error;
pub mod global;
pub mod mapper;
pub mod plan;
pub mod projection;
pub mod registry;
pub mod shape;
pub mod transformer;

// Re-export main types for convenience
pub use error::{Error, Result};
pub use shape::{
    // Shape declarations
    Describe, Shape, ShapeRef, TypeKey,

    // Type descriptors
    CollectionKind, MapKind, MemberClass, MemberDescriptor, ScalarKind,
    ShapeDescriptor, TypeDescriptor,

    ShapeIntrospector,
};

pub use coerce::Coercion;
pub use config::{EngineConfig, FloatToInt};
pub use plan::{
    Construction, MapBuilder, MapSource, MapTarget, MappingPlan, MappingRegistration,
    MemberOverride, MemberRule, PlannedMember, TypePair,
};
pub use projection::{Binding, Expr, IncludePath, Projection, ProjectionMetadata};
pub use registry::{CacheEntry, Registry, RegistryStats};
pub use mapper::Mapper;
pub use transformer::{CompiledTransformer, MapContext, MapMode};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
