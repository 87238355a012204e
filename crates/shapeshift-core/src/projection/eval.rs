//! In-memory interpreter for projection fragments
//!
//! Evaluates an [`Expr`] directly against a value tree. Collection steps go
//! through the same materialization helpers as the eager transformer.
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use super::ast::Expr;
use crate::transformer::materialize;
use crate::{Error, Result};
use serde_json::Value;

static ABSENT: Value = Value::Null;

/// Interpreter state
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    max_depth: Option<usize>,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the number of nested scopes an evaluation may open
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            max_depth: Some(max_depth),
        }
    }

    /// Evaluate `expr` with `input` bound to `Param`
    pub fn evaluate(&self, expr: &Expr, input: &Value) -> Result<Value> {
        self.eval(expr, input, 0)
    }

    fn eval(&self, expr: &Expr, input: &Value, depth: usize) -> Result<Value> {
        match expr {
            Expr::Param => Ok(input.clone()),
            Expr::Constant(value) => Ok(value.clone()),
            Expr::Member { base, name } => match borrowed(base, input)? {
                Some(base) => member_of(base, name).cloned(),
                None => {
                    let base = self.eval(base, input, depth)?;
                    member_of(&base, name).cloned()
                }
            },
            Expr::Convert { operand, coercion } => {
                let value = self.eval(operand, input, depth)?;
                coercion.apply(&value, &path_of(operand))
            }
            Expr::New { shape, bindings } => {
                let mut instance = shape.instantiate()?;
                let Value::Object(map) = &mut instance else {
                    return Err(Error::Materialization {
                        type_name: shape.name().to_string(),
                        message: "default instance is not an object".to_string(),
                    });
                };
                for binding in bindings {
                    let value = self.eval(&binding.expr, input, depth)?;
                    if value.is_null() && !binding.nullable {
                        continue;
                    }
                    map.insert(binding.member.clone(), value);
                }
                Ok(instance)
            }
            Expr::NullSafe { source, body } => {
                let value = self.eval(source, input, depth)?;
                if value.is_null() {
                    return Ok(Value::Null);
                }
                self.eval(body, &value, self.descend(depth)?)
            }
            Expr::Select { source, body, kind } => {
                let value = self.eval(source, input, depth)?;
                let inner = self.descend(depth)?;
                materialize::reshape_sequence(&value, *kind, |item| self.eval(body, item, inner))
            }
            Expr::SelectPairs {
                source,
                key,
                value,
                source_form,
                target,
            } => {
                let map = self.eval(source, input, depth)?;
                let inner = self.descend(depth)?;
                materialize::reshape_map(
                    &map,
                    *source_form,
                    *target,
                    |k| self.eval(key, k, inner),
                    |v| self.eval(value, v, inner),
                )
            }
            Expr::Pair { source, key, value } => {
                let pair = self.eval(source, input, depth)?;
                let inner = self.descend(depth)?;
                materialize::reshape_pair(&pair, |k| self.eval(key, k, inner), |v| self.eval(value, v, inner))
            }
        }
    }

    fn descend(&self, depth: usize) -> Result<usize> {
        match self.max_depth {
            Some(limit) if depth >= limit => Err(Error::DepthExceeded { limit }),
            _ => Ok(depth + 1),
        }
    }
}

/// Convenience wrapper around a default [`Evaluator`]
pub fn evaluate(expr: &Expr, input: &Value) -> Result<Value> {
    Evaluator::new().evaluate(expr, input)
}

/// Resolve a member chain rooted at `Param` without copying the input
fn borrowed<'v>(expr: &Expr, input: &'v Value) -> Result<Option<&'v Value>> {
    match expr {
        Expr::Param => Ok(Some(input)),
        Expr::Member { base, name } => match borrowed(base, input)? {
            Some(base) => member_of(base, name).map(Some),
            None => Ok(None),
        },
        _ => Ok(None),
    }
}

fn member_of<'v>(base: &'v Value, name: &str) -> Result<&'v Value> {
    match base {
        Value::Object(map) => Ok(map.get(name).unwrap_or(&ABSENT)),
        Value::Null => Err(Error::evaluation(format!("member access '{}' on an absent value", name))),
        other => Err(Error::evaluation(format!("member access '{}' on a non-object value {}", name, other))),
    }
}

fn path_of(expr: &Expr) -> String {
    match expr {
        Expr::Member { name, .. } => name.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::Coercion;
    use crate::config::FloatToInt;
    use crate::plan::{MapSource, MapTarget};
    use crate::shape::{CollectionKind, MapKind, ScalarKind};
    use serde_json::json;

    #[test]
    fn test_member_access() {
        let value = evaluate(&Expr::path("a.b"), &json!({"a": {"b": 4}})).unwrap();
        assert_eq!(value, json!(4));
    }

    #[test]
    fn test_member_access_over_computed_base() {
        let expr = Expr::Member {
            base: Box::new(Expr::Constant(json!({"total": 12, "lines": [1, 2, 3]}))),
            name: "total".to_string(),
        };
        assert_eq!(evaluate(&expr, &Value::Null).unwrap(), json!(12));

        let input = json!({"order": {"total": 12}});
        assert_eq!(evaluate(&Expr::Param.member("order").member("total"), &input).unwrap(), json!(12));
        assert_eq!(evaluate(&Expr::Param.member("missing"), &input).unwrap(), Value::Null);
    }

    #[test]
    fn test_member_access_on_scalar_fails() {
        let err = evaluate(&Expr::Param.member("a").member("b"), &json!({"a": 3})).unwrap_err();
        assert!(matches!(err, Error::Evaluation { ref message } if message.contains("non-object")));
    }

    #[test]
    fn test_member_access_on_absent_fails() {
        let err = evaluate(&Expr::Param.member("a").member("b"), &json!({"a": null})).unwrap_err();
        assert!(matches!(err, Error::Evaluation { .. }));
    }

    #[test]
    fn test_null_safe_short_circuits() {
        let value = evaluate(&Expr::path("a.b"), &json!({"a": null})).unwrap();
        assert!(value.is_null());
    }

    #[test]
    fn test_select_converts_elements() {
        let coercion = Coercion::between(ScalarKind::I64, ScalarKind::String, FloatToInt::Truncate).unwrap();
        let expr = Expr::Select {
            source: Box::new(Expr::Param.member("ids")),
            body: Box::new(Expr::Param.convert(coercion)),
            kind: CollectionKind::Set,
        };
        let value = evaluate(&expr, &json!({"ids": [1, 2, 1]})).unwrap();
        assert_eq!(value, json!(["1", "2"]));
    }

    #[test]
    fn test_select_pairs_rekeys() {
        let coercion = Coercion::between(ScalarKind::I32, ScalarKind::String, FloatToInt::Truncate).unwrap();
        let expr = Expr::SelectPairs {
            source: Box::new(Expr::Param),
            key: Box::new(Expr::Param.convert(coercion)),
            value: Box::new(Expr::Param),
            source_form: MapSource::Pairs,
            target: MapTarget::Map(MapKind::Ordered),
        };
        let value = evaluate(&expr, &json!([[1, "a"], [2, "b"]])).unwrap();
        assert_eq!(value, json!({"1": "a", "2": "b"}));
    }

    #[test]
    fn test_conversion_failure_names_member() {
        let coercion = Coercion::between(ScalarKind::I64, ScalarKind::U8, FloatToInt::Truncate).unwrap();
        let err = evaluate(&Expr::Param.member("age").convert(coercion), &json!({"age": 999})).unwrap_err();
        assert!(matches!(err, Error::Conversion { ref path, .. } if path == "age"));
    }

    #[test]
    fn test_depth_limit() {
        let expr = Expr::path("a.b.c");
        let err = Evaluator::with_max_depth(1)
            .evaluate(&expr, &json!({"a": {"b": {"c": 1}}}))
            .unwrap_err();
        assert_eq!(err, Error::DepthExceeded { limit: 1 });
    }
}
