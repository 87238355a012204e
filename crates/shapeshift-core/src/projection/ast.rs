//! Expression tree of projection fragments
//!
//! This module defines the engine-safe operations a projection is composed
//! of, and the formula rendering used for inspection.
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use crate::coerce::Coercion;
use crate::plan::{MapSource, MapTarget};
use crate::shape::{CollectionKind, ShapeRef};
use serde_json::Value;
use std::fmt;

/// A projection expression over a single input (`Param`)
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// The input of the current scope
    Param,
    /// Member access; fails on an absent base
    Member { base: Box<Expr>, name: String },
    /// Scalar conversion
    Convert { operand: Box<Expr>, coercion: Coercion },
    Constant(Value),
    /// Member-initialized construction, starting from the default instance
    New { shape: ShapeRef, bindings: Vec<Binding> },
    /// Evaluate `body` with `source` as its input, or absent when it is absent
    NullSafe { source: Box<Expr>, body: Box<Expr> },
    /// Transform every element of a sequence
    Select {
        source: Box<Expr>,
        body: Box<Expr>,
        kind: CollectionKind,
    },
    /// Re-key and re-value every entry of a map or pair sequence
    SelectPairs {
        source: Box<Expr>,
        key: Box<Expr>,
        value: Box<Expr>,
        source_form: MapSource,
        target: MapTarget,
    },
    /// Re-shape both slots of a `[key, value]` pair
    Pair {
        source: Box<Expr>,
        key: Box<Expr>,
        value: Box<Expr>,
    },
}

/// One member assignment of a `New` expression
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub member: String,
    /// Whether absence may be assigned; otherwise the default is kept
    pub nullable: bool,
    pub expr: Expr,
}

impl Binding {
    pub fn new(member: impl Into<String>, nullable: bool, expr: Expr) -> Self {
        Self {
            member: member.into(),
            nullable,
            expr,
        }
    }
}

impl Expr {
    pub fn param() -> Self {
        Expr::Param
    }

    pub fn constant(value: impl Into<Value>) -> Self {
        Expr::Constant(value.into())
    }

    /// Access `name` on this expression
    pub fn member(self, name: impl Into<String>) -> Self {
        Expr::Member {
            base: Box::new(self),
            name: name.into(),
        }
    }

    /// Access a dotted member path on the scope input, null-safe between steps
    ///
    /// `Expr::path("address.city")` reads `address` and, when present, its
    /// `city`.
    pub fn path(path: &str) -> Self {
        let mut segments = path.split('.').filter(|s| !s.is_empty()).rev();
        let Some(last) = segments.next() else {
            return Expr::Param;
        };
        segments.fold(Expr::Param.member(last), |body, segment| Expr::NullSafe {
            source: Box::new(Expr::Param.member(segment)),
            body: Box::new(body),
        })
    }

    pub fn convert(self, coercion: Coercion) -> Self {
        Expr::Convert {
            operand: Box::new(self),
            coercion,
        }
    }

    /// Construct `shape` from bindings
    pub fn construct(shape: ShapeRef, bindings: Vec<Binding>) -> Self {
        Expr::New { shape, bindings }
    }

    /// Replace the current scope's `Param` with `replacement`
    ///
    /// Bodies that rebind `Param` (null-safe bodies, element and entry
    /// bodies) are left untouched; only their sources are rewritten.
    pub fn substitute(self, replacement: &Expr) -> Expr {
        let rebase = |e: Box<Expr>| Box::new(e.substitute(replacement));
        match self {
            Expr::Param => replacement.clone(),
            Expr::Member { base, name } => Expr::Member {
                base: rebase(base),
                name,
            },
            Expr::Convert { operand, coercion } => Expr::Convert {
                operand: rebase(operand),
                coercion,
            },
            Expr::Constant(v) => Expr::Constant(v),
            Expr::New { shape, bindings } => Expr::New {
                shape,
                bindings: bindings
                    .into_iter()
                    .map(|b| Binding {
                        expr: b.expr.substitute(replacement),
                        ..b
                    })
                    .collect(),
            },
            Expr::NullSafe { source, body } => Expr::NullSafe {
                source: rebase(source),
                body,
            },
            Expr::Select { source, body, kind } => Expr::Select {
                source: rebase(source),
                body,
                kind,
            },
            Expr::SelectPairs {
                source,
                key,
                value,
                source_form,
                target,
            } => Expr::SelectPairs {
                source: rebase(source),
                key,
                value,
                source_form,
                target,
            },
            Expr::Pair { source, key, value } => Expr::Pair {
                source: rebase(source),
                key,
                value,
            },
        }
    }

    /// Whether the expression reads its scope input at all
    pub fn uses_param(&self) -> bool {
        match self {
            Expr::Param => true,
            Expr::Constant(_) => false,
            Expr::Member { base, .. } => base.uses_param(),
            Expr::Convert { operand, .. } => operand.uses_param(),
            Expr::New { bindings, .. } => bindings.iter().any(|b| b.expr.uses_param()),
            Expr::NullSafe { source, .. }
            | Expr::Select { source, .. }
            | Expr::SelectPairs { source, .. }
            | Expr::Pair { source, .. } => source.uses_param(),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Formula { expr: self, scope: 0 })
    }
}

/// Renders an expression with one parameter name per scope
struct Formula<'a> {
    expr: &'a Expr,
    scope: usize,
}

impl Formula<'_> {
    fn same<'b>(&self, expr: &'b Expr) -> Formula<'b> {
        Formula { expr, scope: self.scope }
    }

    fn inner<'b>(&self, expr: &'b Expr) -> Formula<'b> {
        Formula {
            expr,
            scope: self.scope + 1,
        }
    }
}

impl fmt::Display for Formula<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let next = self.scope + 1;
        match self.expr {
            Expr::Param => write!(f, "x{}", self.scope),
            Expr::Member { base, name } => write!(f, "{}.{}", self.same(base), name),
            Expr::Convert { operand, coercion } => {
                write!(f, "({} as {})", self.same(operand), coercion.to())
            }
            Expr::Constant(v) => write!(f, "{}", v),
            Expr::New { shape, bindings } => {
                write!(f, "new {} {{ ", shape)?;
                for (i, binding) in bindings.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} = {}", binding.member, self.same(&binding.expr))?;
                }
                write!(f, " }}")
            }
            Expr::NullSafe { source, body } => {
                write!(f, "{}?.let(x{} => {})", self.same(source), next, self.inner(body))
            }
            Expr::Select { source, body, kind } => write!(
                f,
                "{}.select(x{} => {}).to_{}()",
                self.same(source),
                next,
                self.inner(body),
                kind.to_string().to_lowercase()
            ),
            Expr::SelectPairs {
                source,
                key,
                value,
                target,
                ..
            } => write!(
                f,
                "{}.select_pairs(x{n} => {}, x{n} => {}).to({})",
                self.same(source),
                self.inner(key),
                self.inner(value),
                target,
                n = next
            ),
            Expr::Pair { source, key, value } => write!(
                f,
                "{}.pair(x{n} => {}, x{n} => {})",
                self.same(source),
                self.inner(key),
                self.inner(value),
                n = next
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::ScalarKind;
    use crate::config::FloatToInt;

    #[test]
    fn test_substitute_leaves_rebound_bodies_alone() {
        let nested = Expr::NullSafe {
            source: Box::new(Expr::Param),
            body: Box::new(Expr::Param.member("city")),
        };
        let bound = nested.substitute(&Expr::Param.member("address"));

        assert_eq!(
            bound,
            Expr::NullSafe {
                source: Box::new(Expr::Param.member("address")),
                body: Box::new(Expr::Param.member("city")),
            }
        );
    }

    #[test]
    fn test_path_is_null_safe_between_steps() {
        let expr = Expr::path("address.city");
        assert_eq!(expr.to_string(), "x0.address?.let(x1 => x1.city)");
        assert_eq!(Expr::path("id"), Expr::Param.member("id"));
    }

    #[test]
    fn test_formula_rendering() {
        let coercion = Coercion::between(ScalarKind::I32, ScalarKind::I64, FloatToInt::Truncate).unwrap();
        let expr = Expr::Select {
            source: Box::new(Expr::Param.member("lines")),
            body: Box::new(Expr::Param.convert(coercion)),
            kind: CollectionKind::List,
        };
        assert_eq!(expr.to_string(), "x0.lines.select(x1 => (x1 as i64)).to_list()");
    }

    #[test]
    fn test_uses_param() {
        assert!(!Expr::constant(3).uses_param());
        assert!(Expr::path("a.b").uses_param());
    }
}
