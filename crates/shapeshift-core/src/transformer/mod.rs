//! Eager transformers
//!
//! Compiles a mapping plan into a reusable callable that produces fully
//! materialized destination values, including nested objects, sequences,
//! sets, arrays, custom collections and maps.
//!
//! # Module Organization
//!
//! - [`compiled`] - Compiled transformer and its plan emitter
//! - [`context`] - Per-call context (mode and depth)
//! - [`materialize`] - Collection building shared with the projection interpreter
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

pub mod compiled;
pub mod context;
pub mod materialize;


pub use compiled::{CompiledTransformer, Converter, EagerEmitter};
pub use context::{MapContext, MapMode};
