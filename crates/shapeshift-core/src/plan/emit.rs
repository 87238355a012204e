//! Plan walker shared by the eager transformer and the projection builder
//!
//! Both output forms are produced by walking the same `MappingPlan`; an
//! emitter only decides what each rule turns into.
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use super::registration::{Construction, MemberOverride};
use super::types::{MapSource, MapTarget, MappingPlan, MemberRule, PlannedMember, TypePair};
use crate::coerce::Coercion;
use crate::shape::CollectionKind;
use crate::{Error, Result};

/// Target of a plan walk
///
/// `Value` is what a single rule compiles to (a converter, an expression);
/// `Output` is what a whole plan compiles to.
pub trait PlanEmitter {
    type Value;
    type Output;

    /// Copy a value, applying the recorded conversion if any
    fn direct(&mut self, coerce: Option<Coercion>) -> Result<Self::Value>;

    /// Map through another pair; `None` defers the member entirely
    fn nested(&mut self, pair: TypePair) -> Result<Option<Self::Value>>;

    fn sequence(&mut self, element: Self::Value, kind: CollectionKind) -> Result<Self::Value>;

    fn map(
        &mut self,
        key: Self::Value,
        value: Self::Value,
        source: MapSource,
        target: MapTarget,
    ) -> Result<Self::Value>;

    fn pair(&mut self, key: Self::Value, value: Self::Value) -> Result<Self::Value>;

    /// A registered member override, evaluated against the whole source
    fn override_member(&mut self, member: &PlannedMember, rule: &MemberOverride) -> Result<Self::Value>;

    /// Called before the rule of `member` is walked
    fn enter(&mut self, _member: &PlannedMember) {}

    /// Called after the rule of `member` is walked, bound or not
    fn leave(&mut self, _member: &PlannedMember) {}

    /// Attach the compiled rule to the destination member
    fn bind(&mut self, member: &PlannedMember, value: Self::Value) -> Result<()>;

    /// The plan is a construction override
    fn construction(self, pair: TypePair, construction: &Construction) -> Result<Self::Output>;

    fn finish(self, pair: TypePair) -> Result<Self::Output>;
}

/// Walk `plan` against `emitter`
pub fn emit<E: PlanEmitter>(plan: &MappingPlan, mut emitter: E) -> Result<E::Output> {
    if let Some(construction) = plan.construction() {
        return emitter.construction(plan.pair(), construction);
    }

    for member in plan.members() {
        let value = match member.rule() {
            MemberRule::Skip => continue,
            MemberRule::Override(rule) => {
                emitter.enter(member);
                Some(emitter.override_member(member, rule)?)
            }
            rule => {
                emitter.enter(member);
                emit_rule(rule, &mut emitter)?
            }
        };

        if let Some(value) = value {
            emitter.bind(member, value)?;
        }
        emitter.leave(member);
    }

    emitter.finish(plan.pair())
}

fn emit_rule<E: PlanEmitter>(rule: &MemberRule, emitter: &mut E) -> Result<Option<E::Value>> {
    match rule {
        MemberRule::DirectCopy { coerce } => emitter.direct(*coerce).map(Some),
        MemberRule::NestedMap(pair) => emitter.nested(*pair),
        MemberRule::SequenceReshape { element, kind, .. } => match emit_rule(element, emitter)? {
            Some(element) => emitter.sequence(element, *kind).map(Some),
            None => Ok(None),
        },
        MemberRule::MapReshape {
            source,
            target,
            key,
            value,
        } => {
            let key = emit_rule(key, emitter)?;
            let value = emit_rule(value, emitter)?;
            match (key, value) {
                (Some(key), Some(value)) => emitter.map(key, value, *source, *target).map(Some),
                _ => Ok(None),
            }
        }
        MemberRule::PairReshape { key, value } => {
            let key = emit_rule(key, emitter)?;
            let value = emit_rule(value, emitter)?;
            match (key, value) {
                (Some(key), Some(value)) => emitter.pair(key, value).map(Some),
                _ => Ok(None),
            }
        }
        MemberRule::Skip => Ok(None),
        MemberRule::Override(_) => Err(Error::Unsupported {
            message: "overrides apply to whole members only".to_string(),
            feature: Some("element override".to_string()),
        }),
    }
}
