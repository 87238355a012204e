//! Mapping plan builder
//!
//! Decides, per destination member, which rule applies and rejects
//! structurally incompatible members before anything is compiled.
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use super::registration::{MappingRegistration, MemberOverride};
use super::types::{MapSource, MapTarget, MappingPlan, MemberRule, PlannedMember, TypePair};
use crate::coerce::Coercion;
use crate::config::EngineConfig;
use crate::shape::{CollectionKind, ShapeIntrospector, TypeDescriptor};
use crate::{Error, Result};

type RuleResult = std::result::Result<MemberRule, String>;

/// Builds mapping plans from shape descriptors
pub struct PlanBuilder<'a> {
    introspector: &'a ShapeIntrospector,
    config: &'a EngineConfig,
}

impl<'a> PlanBuilder<'a> {
    pub fn new(introspector: &'a ShapeIntrospector, config: &'a EngineConfig) -> Self {
        Self { introspector, config }
    }

    /// Build the plan of `pair`, failing on the first offending member
    pub fn build(&self, pair: TypePair, registration: Option<&MappingRegistration>) -> Result<MappingPlan> {
        log::debug!("Building mapping plan for {}", pair);

        if let Some(construction) = registration.and_then(|r| r.construction()) {
            log::debug!("{} uses a construction override", pair);
            return Ok(MappingPlan::constructed(pair, construction.clone()));
        }

        let source = self.introspector.describe(pair.source);
        let destination = self.introspector.describe(pair.destination);

        if let Some(registration) = registration {
            for name in registration.overrides().keys() {
                if destination.member(name).is_none() {
                    return Err(Error::configuration(
                        pair.to_string(),
                        Some(name),
                        format!("{} has no member named '{}'", destination.name(), name),
                    ));
                }
            }
        }

        let mut members = Vec::with_capacity(destination.members().len());
        for member in destination.members() {
            if let Some(rule) = registration.and_then(|r| r.override_for(member.name())) {
                let rule = match rule {
                    MemberOverride::Skip => MemberRule::Skip,
                    other => MemberRule::Override(other.clone()),
                };
                members.push(PlannedMember::new(member, None, rule));
                continue;
            }

            let Some(source_member) = source.member(member.name()) else {
                log::trace!("{}: no source member for '{}'", pair, member.name());
                continue;
            };

            let rule = self
                .rule_for(source_member.ty(), member.ty())
                .map_err(|message| Error::configuration(pair.to_string(), Some(member.name()), message))?;

            if rule.has_coercion() {
                log::debug!("{}: member '{}' needs a conversion ({})", pair, member.name(), rule);
            }
            members.push(PlannedMember::new(member, Some(source_member), rule));
        }

        Ok(MappingPlan::new(pair, members))
    }

    fn rule_for(&self, source: &TypeDescriptor, destination: &TypeDescriptor) -> RuleResult {
        use TypeDescriptor as T;

        match (source.strip_optional(), destination.strip_optional()) {
            (T::Scalar(from), T::Scalar(to)) => {
                if from == to {
                    return Ok(MemberRule::DirectCopy { coerce: None });
                }
                Coercion::between(*from, *to, self.config.float_to_int)
                    .map(|c| MemberRule::DirectCopy { coerce: Some(c) })
                    .ok_or_else(|| format!("no conversion from {} to {}", from, to))
            }
            (T::Pair(sk, sv), T::Pair(dk, dv)) => Ok(MemberRule::PairReshape {
                key: Box::new(self.rule_for(sk, dk)?),
                value: Box::new(self.rule_for(sv, dv)?),
            }),
            (T::Object(s), T::Object(d)) => Ok(MemberRule::NestedMap(TypePair::new(*s, *d))),
            (
                T::Sequence { element: se, .. },
                T::Sequence { element: de, kind },
            ) => {
                check_destination_kind(*kind)?;
                Ok(MemberRule::SequenceReshape {
                    source_element: (**se).clone(),
                    destination_element: (**de).clone(),
                    element: Box::new(self.rule_for(se, de)?),
                    kind: *kind,
                })
            }
            (T::Map { key: sk, value: sv, .. }, T::Map { key: dk, value: dv, kind }) => {
                Ok(MemberRule::MapReshape {
                    source: object_source(sk)?,
                    target: MapTarget::Map(*kind),
                    key: Box::new(self.map_key_rule(sk, dk)?),
                    value: Box::new(self.rule_for(sv, dv)?),
                })
            }
            (T::Map { key: sk, value: sv, .. }, T::Sequence { element, kind }) => {
                let T::Pair(dk, dv) = element.strip_optional() else {
                    return Err(format!("cannot reshape {} into {}: elements are not key/value pairs", source, destination));
                };
                check_destination_kind(*kind)?;
                Ok(MemberRule::MapReshape {
                    source: object_source(sk)?,
                    target: MapTarget::Pairs(*kind),
                    key: Box::new(self.rule_for(sk, dk)?),
                    value: Box::new(self.rule_for(sv, dv)?),
                })
            }
            (T::Sequence { element, .. }, T::Map { key: dk, value: dv, kind }) => {
                let T::Pair(sk, sv) = element.strip_optional() else {
                    return Err(format!("cannot reshape {} into {}: elements are not key/value pairs", source, destination));
                };
                Ok(MemberRule::MapReshape {
                    source: MapSource::Pairs,
                    target: MapTarget::Map(*kind),
                    key: Box::new(self.map_key_rule(sk, dk)?),
                    value: Box::new(self.rule_for(sv, dv)?),
                })
            }
            (s, d) if s.class().is_collection() != d.class().is_collection() => Err(format!(
                "navigation type mismatch: cannot map {} to {}",
                source, destination
            )),
            _ => Err(format!("incompatible member types: cannot map {} to {}", source, destination)),
        }
    }

    fn map_key_rule(&self, source: &TypeDescriptor, destination: &TypeDescriptor) -> RuleResult {
        if destination.as_scalar().is_none() {
            return Err(format!("map keys must be scalar, found {}", destination));
        }
        self.rule_for(source, destination)
    }
}

fn object_source(key: &TypeDescriptor) -> std::result::Result<MapSource, String> {
    key.as_scalar()
        .map(|key| MapSource::Object { key })
        .ok_or_else(|| format!("map keys must be scalar, found {}", key))
}

fn check_destination_kind(kind: CollectionKind) -> std::result::Result<(), String> {
    match kind {
        CollectionKind::Heap => Err(format!("{} is not a supported destination collection", kind)),
        _ => Ok(()),
    }
}
