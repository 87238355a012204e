//! Query projections
//!
//! A projection is the analyzable form of a mapping: an [`Expr`] tree built
//! only from engine-safe operations (member access, null-propagating access,
//! per-element transforms, scalar conversion, constants and member-initialized
//! construction), so a host query engine can splice it into its own query.
//! The in-memory interpreter in [`eval`] evaluates the same tree directly.
//!
//! # Module Organization
//!
//! - [`ast`] - Expression nodes and formula rendering
//! - [`builder`] - Builds a projection from cached mapping plans
//! - [`eval`] - In-memory interpreter
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

pub mod ast;
pub mod builder;
pub mod eval;


pub use ast::{Binding, Expr};
pub use builder::ProjectionBuilder;
pub use eval::Evaluator;

use crate::plan::TypePair;
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Dotted member path forcing expansion of recursive members
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IncludePath {
    segments: Vec<String>,
}

impl IncludePath {
    pub fn parse(path: &str) -> Self {
        Self {
            segments: path
                .split('.')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Whether `path` lies on this include path
    pub fn covers(&self, path: &[&str]) -> bool {
        path.len() <= self.segments.len() && path.iter().zip(&self.segments).all(|(a, b)| *a == b.as_str())
    }
}

impl From<&str> for IncludePath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl From<String> for IncludePath {
    fn from(path: String) -> Self {
        Self::parse(&path)
    }
}

impl fmt::Display for IncludePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

/// What a projection contains, for inspection and diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionMetadata {
    /// Deepest level of nested expansion
    pub depth: usize,
    /// Source member reads bound to destination members
    pub member_accesses: usize,
    /// Scalar conversions
    pub conversions: usize,
    /// Sequence, map and pair re-shapes
    pub element_transforms: usize,
    /// Member paths left out to cut recursion
    pub deferred: Vec<String>,
}

/// A built projection of one type pair
#[derive(Debug, Clone)]
pub struct Projection {
    pair: TypePair,
    root: Expr,
    metadata: ProjectionMetadata,
}

impl Projection {
    pub(crate) fn new(pair: TypePair, root: Expr, metadata: ProjectionMetadata) -> Self {
        Self { pair, root, metadata }
    }

    pub fn pair(&self) -> TypePair {
        self.pair
    }

    /// The expression tree, with `Param` standing for one source instance
    pub fn root(&self) -> &Expr {
        &self.root
    }

    pub fn metadata(&self) -> &ProjectionMetadata {
        &self.metadata
    }

    /// Evaluate the projection against one source value
    pub fn evaluate(&self, source: &Value) -> Result<Value> {
        if source.is_null() {
            return Ok(Value::Null);
        }
        eval::evaluate(&self.root, source)
    }

    /// Evaluate the projection against every source value, in order
    pub fn evaluate_all<'a, I>(&self, sources: I) -> Result<Vec<Value>>
    where
        I: IntoIterator<Item = &'a Value>,
    {
        sources.into_iter().map(|source| self.evaluate(source)).collect()
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x0 => {}", self.root)
    }
}
