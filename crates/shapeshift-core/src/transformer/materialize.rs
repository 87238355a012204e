//! Collection materialization shared by the eager transformer and the
//! projection interpreter
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use crate::plan::{MapSource, MapTarget};
use crate::shape::{CollectionKind, ScalarKind};
use crate::{Error, Result};
use serde_json::{Map, Number, Value};
use std::collections::HashSet;

/// Transform every element of `value` into a `kind` collection
///
/// Absent stays absent. Sets keep the first occurrence of each element.
pub fn reshape_sequence<F>(value: &Value, kind: CollectionKind, mut element: F) -> Result<Value>
where
    F: FnMut(&Value) -> Result<Value>,
{
    let items = match value {
        Value::Null => return Ok(Value::Null),
        Value::Array(items) => items,
        other => return Err(Error::evaluation(format!("expected a sequence, found {}", kind_of(other)))),
    };

    let mapped = items.iter().map(&mut element).collect::<Result<Vec<_>>>()?;
    Ok(collect_sequence(mapped, kind))
}

/// Re-key and re-value every entry of a map or pair sequence
pub fn reshape_map<K, V>(
    value: &Value,
    source: MapSource,
    target: MapTarget,
    mut key: K,
    mut val: V,
) -> Result<Value>
where
    K: FnMut(&Value) -> Result<Value>,
    V: FnMut(&Value) -> Result<Value>,
{
    if value.is_null() {
        return Ok(Value::Null);
    }

    let mut mapped = Vec::new();
    for (k, v) in entries(value, source)? {
        mapped.push((key(&k)?, val(&v)?));
    }
    collect_map(mapped, target)
}

/// Re-shape both slots of a `[key, value]` pair
pub fn reshape_pair<K, V>(value: &Value, mut key: K, mut val: V) -> Result<Value>
where
    K: FnMut(&Value) -> Result<Value>,
    V: FnMut(&Value) -> Result<Value>,
{
    match value {
        Value::Null => Ok(Value::Null),
        Value::Array(slots) if slots.len() == 2 => Ok(Value::Array(vec![key(&slots[0])?, val(&slots[1])?])),
        other => Err(Error::evaluation(format!("expected a key/value pair, found {}", kind_of(other)))),
    }
}

/// Build a collection value of `kind` from already mapped elements
pub fn collect_sequence(items: Vec<Value>, kind: CollectionKind) -> Value {
    match kind {
        CollectionKind::Set => {
            let mut seen = HashSet::with_capacity(items.len());
            Value::Array(
                items
                    .into_iter()
                    .filter(|item| seen.insert(item.to_string()))
                    .collect(),
            )
        }
        _ => Value::Array(items),
    }
}

/// Build a map (or pair sequence) from mapped entries; on key collision the
/// last entry wins
pub fn collect_map(entries: Vec<(Value, Value)>, target: MapTarget) -> Result<Value> {
    match target {
        MapTarget::Map(_) => {
            let mut map = Map::new();
            for (k, v) in entries {
                map.insert(key_to_string(&k)?, v);
            }
            Ok(Value::Object(map))
        }
        MapTarget::Pairs(kind) => Ok(collect_sequence(
            entries
                .into_iter()
                .map(|(k, v)| Value::Array(vec![k, v]))
                .collect(),
            kind,
        )),
    }
}

/// Read the entries of a map value in its source form
pub fn entries(value: &Value, source: MapSource) -> Result<Vec<(Value, Value)>> {
    match (source, value) {
        (MapSource::Object { key }, Value::Object(map)) => Ok(map
            .iter()
            .map(|(k, v)| (key_from_str(k, key), v.clone()))
            .collect()),
        (MapSource::Pairs, Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::Array(slots) if slots.len() == 2 => Ok((slots[0].clone(), slots[1].clone())),
                other => Err(Error::evaluation(format!(
                    "expected a key/value pair, found {}",
                    kind_of(other)
                ))),
            })
            .collect(),
        (_, other) => Err(Error::evaluation(format!("expected a map, found {}", kind_of(other)))),
    }
}

/// Recover a typed key from its serialized object key
pub fn key_from_str(key: &str, kind: ScalarKind) -> Value {
    let typed = if kind.is_integer() {
        key.parse::<i64>()
            .map(Value::from)
            .or_else(|_| key.parse::<u64>().map(Value::from))
            .ok()
    } else if kind.is_float() {
        key.parse::<f64>().ok().and_then(Number::from_f64).map(Value::Number)
    } else if kind == ScalarKind::Bool {
        key.parse::<bool>().ok().map(Value::Bool)
    } else {
        None
    };
    typed.unwrap_or_else(|| Value::String(key.to_string()))
}

/// Serialized object key of a scalar value
pub fn key_to_string(key: &Value) -> Result<String> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(Error::evaluation(format!("map keys must be scalar, found {}", kind_of(other)))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::MapKind;
    use serde_json::json;

    #[test]
    fn test_set_keeps_first_occurrence_order() {
        let value = collect_sequence(vec![json!(3), json!(1), json!(3), json!(2), json!(1)], CollectionKind::Set);
        assert_eq!(value, json!([3, 1, 2]));
    }

    #[test]
    fn test_reshape_sequence_absent_stays_absent() {
        let value = reshape_sequence(&Value::Null, CollectionKind::List, |v| Ok(v.clone())).unwrap();
        assert!(value.is_null());
    }

    #[test]
    fn test_reshape_sequence_rejects_scalars() {
        assert!(reshape_sequence(&json!(5), CollectionKind::List, |v| Ok(v.clone())).is_err());
    }

    #[test]
    fn test_map_to_pairs() {
        let value = reshape_map(
            &json!({"1": "a", "2": "b"}),
            MapSource::Object { key: ScalarKind::I32 },
            MapTarget::Pairs(CollectionKind::List),
            |k| Ok(k.clone()),
            |v| Ok(v.clone()),
        )
        .unwrap();
        assert_eq!(value, json!([[1, "a"], [2, "b"]]));
    }

    #[test]
    fn test_pairs_to_map_last_write_wins() {
        let value = reshape_map(
            &json!([["a", 1], ["b", 2], ["a", 3]]),
            MapSource::Pairs,
            MapTarget::Map(MapKind::Hash),
            |k| Ok(k.clone()),
            |v| Ok(v.clone()),
        )
        .unwrap();
        assert_eq!(value, json!({"a": 3, "b": 2}));
    }

    #[test]
    fn test_key_round_trip() {
        assert_eq!(key_from_str("-4", ScalarKind::I16), json!(-4));
        assert_eq!(key_from_str("true", ScalarKind::Bool), json!(true));
        assert_eq!(key_from_str("x", ScalarKind::String), json!("x"));
        assert_eq!(key_to_string(&json!(7)).unwrap(), "7");
        assert!(key_to_string(&json!([1])).is_err());
    }
}
