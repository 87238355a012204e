//! Core types of the mapping plan
//!
//! A plan is the per-member decision table for one (source, destination)
//! pair. It is built once, shared by both emission targets and never mutated.
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use super::registration::{Construction, MemberOverride};
use crate::coerce::Coercion;
use crate::shape::{
    CollectionKind, MapKind, MemberDescriptor, ScalarKind, Shape, ShapeRef, TypeDescriptor,
};
use std::fmt;

/// The unit of caching: a source shape and a destination shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypePair {
    pub source: ShapeRef,
    pub destination: ShapeRef,
}

impl TypePair {
    pub fn new(source: ShapeRef, destination: ShapeRef) -> Self {
        Self { source, destination }
    }

    /// Pair of `S` to `D`
    pub fn of<S: Shape, D: Shape>() -> Self {
        Self::new(ShapeRef::of::<S>(), ShapeRef::of::<D>())
    }
}

impl fmt::Display for TypePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.destination)
    }
}

/// How entries are read from a source map member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapSource {
    /// A map, read as an object whose keys are parsed back as `key`
    Object { key: ScalarKind },
    /// A sequence of `[key, value]` pairs
    Pairs,
}

/// How entries are written to a destination map member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapTarget {
    Map(MapKind),
    Pairs(CollectionKind),
}

impl fmt::Display for MapTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapTarget::Map(MapKind::Hash) => write!(f, "HashMap"),
            MapTarget::Map(MapKind::Ordered) => write!(f, "OrderedMap"),
            MapTarget::Pairs(kind) => write!(f, "{}<Pair>", kind),
        }
    }
}

/// Decision for one destination member (or one element of a collection)
#[derive(Debug, Clone)]
pub enum MemberRule {
    /// Copy the value, converting when the scalar kinds differ
    DirectCopy { coerce: Option<Coercion> },
    /// Map through the cached transformer of another pair
    NestedMap(TypePair),
    /// Transform each element and rebuild the destination collection
    SequenceReshape {
        source_element: TypeDescriptor,
        destination_element: TypeDescriptor,
        element: Box<MemberRule>,
        kind: CollectionKind,
    },
    /// Re-key and re-value every entry of a map or pair sequence
    MapReshape {
        source: MapSource,
        target: MapTarget,
        key: Box<MemberRule>,
        value: Box<MemberRule>,
    },
    /// Re-shape both slots of a key/value pair
    PairReshape {
        key: Box<MemberRule>,
        value: Box<MemberRule>,
    },
    Skip,
    Override(MemberOverride),
}

impl MemberRule {
    /// Whether this rule, or any rule nested in it, records a conversion
    pub fn has_coercion(&self) -> bool {
        match self {
            MemberRule::DirectCopy { coerce } => coerce.is_some(),
            MemberRule::SequenceReshape { element, .. } => element.has_coercion(),
            MemberRule::MapReshape { key, value, .. } | MemberRule::PairReshape { key, value } => {
                key.has_coercion() || value.has_coercion()
            }
            _ => false,
        }
    }
}

impl fmt::Display for MemberRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberRule::DirectCopy { coerce: None } => write!(f, "copy"),
            MemberRule::DirectCopy { coerce: Some(c) } => write!(f, "convert({})", c),
            MemberRule::NestedMap(pair) => write!(f, "map({})", pair),
            MemberRule::SequenceReshape { element, kind, .. } => {
                write!(f, "each({}) into {}", element, kind)
            }
            MemberRule::MapReshape { target, key, value, .. } => {
                write!(f, "entries({}: {}) into {}", key, value, target)
            }
            MemberRule::PairReshape { key, value } => write!(f, "pair({}, {})", key, value),
            MemberRule::Skip => write!(f, "skip"),
            MemberRule::Override(o) => write!(f, "override({})", o),
        }
    }
}

/// One planned destination member
#[derive(Debug, Clone)]
pub struct PlannedMember {
    destination: &'static str,
    destination_type: TypeDescriptor,
    source: Option<&'static str>,
    source_type: Option<TypeDescriptor>,
    rule: MemberRule,
}

impl PlannedMember {
    pub(crate) fn new(
        destination: &MemberDescriptor,
        source: Option<&MemberDescriptor>,
        rule: MemberRule,
    ) -> Self {
        Self {
            destination: destination.name(),
            destination_type: destination.ty().clone(),
            source: source.map(|s| s.name()),
            source_type: source.map(|s| s.ty().clone()),
            rule,
        }
    }

    /// Destination member name
    pub fn name(&self) -> &'static str {
        self.destination
    }

    /// Corresponding source member; `None` for overrides
    pub fn source(&self) -> Option<&'static str> {
        self.source
    }

    pub fn destination_type(&self) -> &TypeDescriptor {
        &self.destination_type
    }

    pub fn source_type(&self) -> Option<&TypeDescriptor> {
        self.source_type.as_ref()
    }

    pub fn rule(&self) -> &MemberRule {
        &self.rule
    }

    /// Whether the destination member accepts absence
    pub fn is_nullable(&self) -> bool {
        self.destination_type.is_optional()
    }

    /// Nested object, sequence or map
    pub fn is_navigation(&self) -> bool {
        self.destination_type.is_navigation()
    }

    /// Source and destination are declared with the same type
    pub fn has_identical_types(&self) -> bool {
        self.source_type.as_ref() == Some(&self.destination_type)
    }
}

/// Per-member decision table for a type pair
#[derive(Debug, Clone)]
pub struct MappingPlan {
    pair: TypePair,
    members: Vec<PlannedMember>,
    construction: Option<Construction>,
}

impl MappingPlan {
    pub(crate) fn new(pair: TypePair, members: Vec<PlannedMember>) -> Self {
        Self {
            pair,
            members,
            construction: None,
        }
    }

    pub(crate) fn constructed(pair: TypePair, construction: Construction) -> Self {
        Self {
            pair,
            members: Vec::new(),
            construction: Some(construction),
        }
    }

    pub fn pair(&self) -> TypePair {
        self.pair
    }

    /// Planned members in destination declaration order
    pub fn members(&self) -> &[PlannedMember] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&PlannedMember> {
        self.members.iter().find(|m| m.destination == name)
    }

    /// Explicit construction override, which replaces every member rule
    pub fn construction(&self) -> Option<&Construction> {
        self.construction.as_ref()
    }
}

impl fmt::Display for MappingPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.pair)?;
        if let Some(construction) = &self.construction {
            return writeln!(f, "  constructed by {}", construction);
        }
        for member in &self.members {
            match member.source {
                Some(source) => writeln!(f, "  {} <- {}: {}", member.destination, source, member.rule)?,
                None => writeln!(f, "  {}: {}", member.destination, member.rule)?,
            }
        }
        Ok(())
    }
}
