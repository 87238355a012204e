//! Mapping plans
//!
//! A mapping plan is the per-member decision table of a type pair. It is
//! built once by [`PlanBuilder`], optionally shaped by a
//! [`MappingRegistration`], and walked by [`emit`] to produce either an
//! eager transformer or a projection expression.
//!
//! # Module Organization
//!
//! - [`types`] - Plan, member rules and type pairs
//! - [`registration`] - Member and construction overrides, fluent builder
//! - [`builder`] - Structural compatibility rules
//! - [`emit`] - Plan walker shared by both emission targets
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

pub mod builder;
pub mod emit;
pub mod registration;
pub mod types;


pub use builder::PlanBuilder;
pub use emit::{emit, PlanEmitter};
pub use registration::{Construction, MapBuilder, MappingRegistration, MemberOverride, ValueFn};
pub use types::{MapSource, MapTarget, MappingPlan, MemberRule, PlannedMember, TypePair};
