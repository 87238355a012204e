//! Projection fragment builder
//!
//! Walks the cached mapping plans of a pair (and of every nested pair it
//! reaches) and emits one `Expr` tree. Nested pairs are expanded inline
//! until a pair recurs too often on the current path; include paths force
//! expansion along their members.
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use super::ast::{Binding, Expr};
use super::{IncludePath, Projection, ProjectionMetadata};
use crate::coerce::Coercion;
use crate::plan::{
    emit, Construction, MapSource, MapTarget, MemberOverride, MemberRule, PlanEmitter,
    PlannedMember, TypePair,
};
use crate::registry::Registry;
use crate::shape::CollectionKind;
use crate::{Error, Result};
use tracing::{debug, instrument};

/// Builds projections against a registry's cached plans
pub struct ProjectionBuilder<'r> {
    registry: &'r Registry,
    includes: Vec<IncludePath>,
}

impl<'r> ProjectionBuilder<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            includes: Vec::new(),
        }
    }

    /// Force expansion along a dotted member path
    pub fn include(mut self, path: impl Into<IncludePath>) -> Self {
        self.includes.push(path.into());
        self
    }

    pub fn with_includes<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<IncludePath>,
    {
        self.includes.extend(paths.into_iter().map(Into::into));
        self
    }

    #[instrument(skip_all, fields(pair = %pair, includes = self.includes.len()))]
    pub fn build(&self, pair: TypePair) -> Result<Projection> {
        let entry = self.registry.resolve(pair)?;

        let mut state = BuildState {
            registry: self.registry,
            includes: &self.includes,
            recursion: self.registry.config().projection_recursion,
            stack: vec![pair],
            path: Vec::new(),
            metadata: ProjectionMetadata::default(),
        };
        let root = emit(entry.plan(), ProjectionEmitter::new(&mut state))?;

        debug!(
            depth = state.metadata.depth,
            deferred = state.metadata.deferred.len(),
            "Built projection"
        );
        Ok(Projection::new(pair, root, state.metadata))
    }
}

struct BuildState<'b> {
    registry: &'b Registry,
    includes: &'b [IncludePath],
    recursion: usize,
    stack: Vec<TypePair>,
    path: Vec<&'static str>,
    metadata: ProjectionMetadata,
}

impl BuildState<'_> {
    fn forced(&self) -> bool {
        self.includes.iter().any(|include| include.covers(&self.path))
    }

    fn current_path(&self) -> String {
        self.path.join(".")
    }
}

/// Emits projection expressions for one plan
struct ProjectionEmitter<'s, 'b> {
    state: &'s mut BuildState<'b>,
    bindings: Vec<Binding>,
}

impl<'s, 'b> ProjectionEmitter<'s, 'b> {
    fn new(state: &'s mut BuildState<'b>) -> Self {
        Self {
            state,
            bindings: Vec::new(),
        }
    }
}

impl PlanEmitter for ProjectionEmitter<'_, '_> {
    type Value = Expr;
    type Output = Expr;

    fn direct(&mut self, coerce: Option<Coercion>) -> Result<Expr> {
        Ok(match coerce {
            Some(coercion) => {
                self.state.metadata.conversions += 1;
                Expr::Param.convert(coercion)
            }
            None => Expr::Param,
        })
    }

    fn nested(&mut self, pair: TypePair) -> Result<Option<Expr>> {
        let occurrences = self.state.stack.iter().filter(|p| **p == pair).count();
        if occurrences >= self.state.recursion && !self.state.forced() {
            let path = self.state.current_path();
            debug!(pair = %pair, path = %path, "Deferring recursive member");
            self.state.metadata.deferred.push(path);
            return Ok(None);
        }

        let entry = self.state.registry.resolve(pair)?;
        self.state.stack.push(pair);
        self.state.metadata.depth = self.state.metadata.depth.max(self.state.stack.len() - 1);
        let body = emit(entry.plan(), ProjectionEmitter::new(&mut *self.state));
        self.state.stack.pop();

        Ok(Some(Expr::NullSafe {
            source: Box::new(Expr::Param),
            body: Box::new(body?),
        }))
    }

    fn sequence(&mut self, element: Expr, kind: CollectionKind) -> Result<Expr> {
        self.state.metadata.element_transforms += 1;
        Ok(Expr::Select {
            source: Box::new(Expr::Param),
            body: Box::new(element),
            kind,
        })
    }

    fn map(&mut self, key: Expr, value: Expr, source: MapSource, target: MapTarget) -> Result<Expr> {
        self.state.metadata.element_transforms += 1;
        Ok(Expr::SelectPairs {
            source: Box::new(Expr::Param),
            key: Box::new(key),
            value: Box::new(value),
            source_form: source,
            target,
        })
    }

    fn pair(&mut self, key: Expr, value: Expr) -> Result<Expr> {
        self.state.metadata.element_transforms += 1;
        Ok(Expr::Pair {
            source: Box::new(Expr::Param),
            key: Box::new(key),
            value: Box::new(value),
        })
    }

    fn override_member(&mut self, member: &PlannedMember, rule: &MemberOverride) -> Result<Expr> {
        match rule {
            MemberOverride::Constant(value) => Ok(Expr::Constant(value.clone())),
            MemberOverride::Expression(expr) => Ok(expr.clone()),
            MemberOverride::Compute(_) => Err(Error::Unsupported {
                message: format!(
                    "member '{}' is computed by a function and cannot be projected",
                    self.state.current_path()
                ),
                feature: Some("compute override".to_string()),
            }),
            MemberOverride::Skip => Err(Error::Unsupported {
                message: format!("member '{}' is skipped and has no expression", member.name()),
                feature: None,
            }),
        }
    }

    fn enter(&mut self, member: &PlannedMember) {
        self.state.path.push(member.name());
    }

    fn leave(&mut self, _member: &PlannedMember) {
        self.state.path.pop();
    }

    fn bind(&mut self, member: &PlannedMember, value: Expr) -> Result<()> {
        let expr = match (member.rule(), member.source()) {
            (MemberRule::Override(_), _) | (_, None) => value,
            (_, Some(source)) => {
                self.state.metadata.member_accesses += 1;
                value.substitute(&Expr::Param.member(source))
            }
        };
        self.bindings.push(Binding::new(member.name(), member.is_nullable(), expr));
        Ok(())
    }

    fn construction(self, pair: TypePair, construction: &Construction) -> Result<Expr> {
        match construction {
            Construction::Expression(expr) => Ok(expr.clone()),
            Construction::Function(_) => Err(Error::Unsupported {
                message: format!("{} is constructed by a function and cannot be projected", pair.destination),
                feature: Some("construction function".to_string()),
            }),
        }
    }

    fn finish(self, pair: TypePair) -> Result<Expr> {
        Ok(Expr::New {
            shape: pair.destination,
            bindings: self.bindings,
        })
    }
}
