//! Compiled eager transformers
//!
//! A plan is compiled once into a list of member steps, each holding a
//! converter closure built from the member's rule.
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use super::context::{MapContext, MapMode};
use super::materialize;
use crate::coerce::Coercion;
use crate::plan::{
    emit, Construction, MapSource, MapTarget, MappingPlan, MemberOverride, MemberRule,
    PlanEmitter, PlannedMember, TypePair, ValueFn,
};
use crate::projection::eval;
use crate::shape::CollectionKind;
use crate::{Error, Result};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// A compiled conversion of one member (or element) value
pub type Converter = Arc<dyn Fn(&Value, &MapContext<'_>) -> Result<Value> + Send + Sync>;

static ABSENT: Value = Value::Null;

fn converter<F>(f: F) -> Converter
where
    F: Fn(&Value, &MapContext<'_>) -> Result<Value> + Send + Sync + 'static,
{
    Arc::new(f)
}

enum Input {
    /// The value of a source member
    Member(&'static str),
    /// The whole source object (overrides)
    Whole,
}

struct MemberStep {
    destination: &'static str,
    input: Input,
    nullable: bool,
    navigational: bool,
    identical: bool,
    convert: Converter,
}

enum Body {
    Members(Vec<MemberStep>),
    Construct(ValueFn),
}

/// Reusable eager transformer of one type pair
pub struct CompiledTransformer {
    pair: TypePair,
    body: Body,
}

impl CompiledTransformer {
    /// Compile a plan
    pub fn compile(plan: &MappingPlan) -> Result<Self> {
        emit(plan, EagerEmitter::default())
    }

    pub fn pair(&self) -> TypePair {
        self.pair
    }

    /// Number of compiled member steps (zero for construction overrides)
    pub fn step_count(&self) -> usize {
        match &self.body {
            Body::Members(steps) => steps.len(),
            Body::Construct(_) => 0,
        }
    }

    /// Map a source value into a new destination value
    pub fn transform(&self, source: &Value, ctx: &MapContext<'_>) -> Result<Value> {
        if source.is_null() {
            return Ok(Value::Null);
        }

        match &self.body {
            Body::Construct(construct) => construct(source),
            Body::Members(_) => {
                let mut destination = self.pair.destination.instantiate()?;
                self.transform_into(source, &mut destination, ctx)?;
                Ok(destination)
            }
        }
    }

    /// Map a source value into an existing destination value
    ///
    /// Members without a planned rule keep their current value. A
    /// construction override replaces the destination wholesale.
    pub fn transform_into(&self, source: &Value, destination: &mut Value, ctx: &MapContext<'_>) -> Result<()> {
        let steps = match &self.body {
            Body::Construct(construct) => {
                if !source.is_null() {
                    *destination = construct(source)?;
                }
                return Ok(());
            }
            Body::Members(steps) => steps,
        };

        let source_members = match source {
            Value::Null => return Ok(()),
            Value::Object(map) => map,
            _ => {
                return Err(Error::Materialization {
                    type_name: self.pair.source.name().to_string(),
                    message: "source value is not an object".to_string(),
                })
            }
        };

        if !destination.is_object() {
            *destination = self.pair.destination.instantiate()?;
        }
        let Some(target) = destination.as_object_mut() else {
            return Err(Error::Materialization {
                type_name: self.pair.destination.name().to_string(),
                message: "default instance is not an object".to_string(),
            });
        };

        for step in steps {
            let value = match step.input {
                Input::Member(name) if step.navigational && ctx.mode() == MapMode::Shallow => {
                    if step.identical && ctx.registry().config().shallow_copies_identical {
                        source_members.get(name).cloned().unwrap_or(Value::Null)
                    } else {
                        log::trace!("{}: shallow mapping leaves '{}' at its default", self.pair, step.destination);
                        continue;
                    }
                }
                Input::Member(name) => {
                    let value = source_members.get(name).unwrap_or(&ABSENT);
                    (step.convert)(value, ctx)?
                }
                Input::Whole => (step.convert)(source, ctx)?,
            };

            if value.is_null() && !step.nullable {
                log::trace!("{}: absent value keeps the default of '{}'", self.pair, step.destination);
                continue;
            }
            target.insert(step.destination.to_string(), value);
        }

        Ok(())
    }
}

impl fmt::Debug for CompiledTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledTransformer")
            .field("pair", &self.pair)
            .field("steps", &self.step_count())
            .field("constructed", &matches!(self.body, Body::Construct(_)))
            .finish()
    }
}

/// Emits converter closures for a plan
#[derive(Default)]
pub struct EagerEmitter {
    steps: Vec<MemberStep>,
    current: Option<&'static str>,
}

impl PlanEmitter for EagerEmitter {
    type Value = Converter;
    type Output = CompiledTransformer;

    fn direct(&mut self, coerce: Option<Coercion>) -> Result<Converter> {
        let Some(coercion) = coerce else {
            return Ok(converter(|value, _| Ok(value.clone())));
        };
        let path = self.current.unwrap_or_default().to_string();
        Ok(converter(move |value, _| coercion.apply(value, &path)))
    }

    fn nested(&mut self, pair: TypePair) -> Result<Option<Converter>> {
        Ok(Some(converter(move |value, ctx| ctx.map_nested(pair, value))))
    }

    fn sequence(&mut self, element: Converter, kind: CollectionKind) -> Result<Converter> {
        Ok(converter(move |value, ctx| {
            materialize::reshape_sequence(value, kind, |item| element(item, ctx))
        }))
    }

    fn map(&mut self, key: Converter, value: Converter, source: MapSource, target: MapTarget) -> Result<Converter> {
        Ok(converter(move |map, ctx| {
            materialize::reshape_map(map, source, target, |k| key(k, ctx), |v| value(v, ctx))
        }))
    }

    fn pair(&mut self, key: Converter, value: Converter) -> Result<Converter> {
        Ok(converter(move |pair, ctx| {
            materialize::reshape_pair(pair, |k| key(k, ctx), |v| value(v, ctx))
        }))
    }

    fn override_member(&mut self, member: &PlannedMember, rule: &MemberOverride) -> Result<Converter> {
        let compiled = match rule {
            MemberOverride::Constant(constant) => {
                let constant = constant.clone();
                converter(move |_, _| Ok(constant.clone()))
            }
            MemberOverride::Expression(expr) => {
                let expr = expr.clone();
                converter(move |source, _| eval::evaluate(&expr, source))
            }
            MemberOverride::Compute(compute) => {
                let compute = Arc::clone(compute);
                converter(move |source, _| compute(source))
            }
            MemberOverride::Skip => {
                return Err(Error::Unsupported {
                    message: format!("member '{}' is skipped and has no converter", member.name()),
                    feature: None,
                })
            }
        };
        Ok(compiled)
    }

    fn enter(&mut self, member: &PlannedMember) {
        self.current = Some(member.name());
    }

    fn leave(&mut self, _member: &PlannedMember) {
        self.current = None;
    }

    fn bind(&mut self, member: &PlannedMember, value: Converter) -> Result<()> {
        let input = match (member.rule(), member.source()) {
            (MemberRule::Override(_), _) | (_, None) => Input::Whole,
            (_, Some(source)) => Input::Member(source),
        };
        self.steps.push(MemberStep {
            destination: member.name(),
            input,
            nullable: member.is_nullable(),
            navigational: member.is_navigation(),
            identical: member.has_identical_types(),
            convert: value,
        });
        Ok(())
    }

    fn construction(self, pair: TypePair, construction: &Construction) -> Result<CompiledTransformer> {
        let construct: ValueFn = match construction {
            Construction::Function(f) => Arc::clone(f),
            Construction::Expression(expr) => {
                let expr = expr.clone();
                Arc::new(move |source: &Value| eval::evaluate(&expr, source))
            }
        };
        Ok(CompiledTransformer {
            pair,
            body: Body::Construct(construct),
        })
    }

    fn finish(self, pair: TypePair) -> Result<CompiledTransformer> {
        log::debug!("Compiled {} with {} member steps", pair, self.steps.len());
        Ok(CompiledTransformer {
            pair,
            body: Body::Members(self.steps),
        })
    }
}
