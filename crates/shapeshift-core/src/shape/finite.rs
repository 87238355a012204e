//! Finite float check for typed sources
//!
//! The value model has no form for NaN or the infinities, which serde_json
//! writes as null. A source holding one would otherwise map to the
//! destination's default, so sources are walked once more through a
//! serializer that only looks at floats.
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use crate::Error;
use serde::ser::{self, Serialize};
use serde_json::Value;
use std::fmt;

/// Whether a value tree holds a null anywhere
///
/// Non-finite floats only ever surface as nulls, so trees without one need
/// no further check.
pub fn contains_null(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.iter().any(contains_null),
        Value::Object(map) => map.values().any(contains_null),
        _ => false,
    }
}

/// Fail with [`Error::Conversion`] when `value` holds a NaN or infinite float
pub fn ensure_finite<T: ?Sized + Serialize>(value: &T, type_name: &str) -> Result<(), Error> {
    match value.serialize(&mut Checker::default()) {
        Ok(()) => Ok(()),
        Err(CheckError::NonFinite { path, kind, value }) => Err(Error::Conversion {
            path,
            from: kind.to_string(),
            to: "a finite number".to_string(),
            value,
        }),
        Err(CheckError::Custom(message)) => Err(Error::Materialization {
            type_name: type_name.to_string(),
            message,
        }),
    }
}

#[derive(Debug)]
enum CheckError {
    NonFinite {
        path: String,
        kind: &'static str,
        value: String,
    },
    Custom(String),
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckError::NonFinite { path, value, .. } => write!(f, "non-finite float {} at '{}'", value, path),
            CheckError::Custom(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for CheckError {}

impl ser::Error for CheckError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        CheckError::Custom(msg.to_string())
    }
}

#[derive(Default)]
struct Checker {
    path: Vec<String>,
}

impl Checker {
    fn float(&self, finite: bool, kind: &'static str, value: String) -> Result<(), CheckError> {
        if finite {
            return Ok(());
        }
        Err(CheckError::NonFinite {
            path: self.path.join("."),
            kind,
            value,
        })
    }

    fn nested<T: ?Sized + Serialize>(&mut self, segment: String, value: &T) -> Result<(), CheckError> {
        self.path.push(segment);
        value.serialize(&mut *self)?;
        self.path.pop();
        Ok(())
    }
}

struct Compound<'a> {
    checker: &'a mut Checker,
    index: usize,
}

impl Compound<'_> {
    fn element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), CheckError> {
        let segment = self.index.to_string();
        self.index += 1;
        self.checker.nested(segment, value)
    }
}

impl<'a> ser::Serializer for &'a mut Checker {
    type Ok = ();
    type Error = CheckError;
    type SerializeSeq = Compound<'a>;
    type SerializeTuple = Compound<'a>;
    type SerializeTupleStruct = Compound<'a>;
    type SerializeTupleVariant = Compound<'a>;
    type SerializeMap = Compound<'a>;
    type SerializeStruct = Compound<'a>;
    type SerializeStructVariant = Compound<'a>;

    fn serialize_f32(self, v: f32) -> Result<(), CheckError> {
        self.float(v.is_finite(), "f32", v.to_string())
    }

    fn serialize_f64(self, v: f64) -> Result<(), CheckError> {
        self.float(v.is_finite(), "f64", v.to_string())
    }

    fn serialize_bool(self, _v: bool) -> Result<(), CheckError> {
        Ok(())
    }

    fn serialize_i8(self, _v: i8) -> Result<(), CheckError> {
        Ok(())
    }

    fn serialize_i16(self, _v: i16) -> Result<(), CheckError> {
        Ok(())
    }

    fn serialize_i32(self, _v: i32) -> Result<(), CheckError> {
        Ok(())
    }

    fn serialize_i64(self, _v: i64) -> Result<(), CheckError> {
        Ok(())
    }

    fn serialize_i128(self, _v: i128) -> Result<(), CheckError> {
        Ok(())
    }

    fn serialize_u8(self, _v: u8) -> Result<(), CheckError> {
        Ok(())
    }

    fn serialize_u16(self, _v: u16) -> Result<(), CheckError> {
        Ok(())
    }

    fn serialize_u32(self, _v: u32) -> Result<(), CheckError> {
        Ok(())
    }

    fn serialize_u64(self, _v: u64) -> Result<(), CheckError> {
        Ok(())
    }

    fn serialize_u128(self, _v: u128) -> Result<(), CheckError> {
        Ok(())
    }

    fn serialize_char(self, _v: char) -> Result<(), CheckError> {
        Ok(())
    }

    fn serialize_str(self, _v: &str) -> Result<(), CheckError> {
        Ok(())
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<(), CheckError> {
        Ok(())
    }

    fn serialize_none(self) -> Result<(), CheckError> {
        Ok(())
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<(), CheckError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<(), CheckError> {
        Ok(())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<(), CheckError> {
        Ok(())
    }

    fn serialize_unit_variant(self, _name: &'static str, _index: u32, _variant: &'static str) -> Result<(), CheckError> {
        Ok(())
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(self, _name: &'static str, value: &T) -> Result<(), CheckError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<(), CheckError> {
        self.nested(variant.to_string(), value)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Compound<'a>, CheckError> {
        Ok(Compound { checker: self, index: 0 })
    }

    fn serialize_tuple(self, _len: usize) -> Result<Compound<'a>, CheckError> {
        Ok(Compound { checker: self, index: 0 })
    }

    fn serialize_tuple_struct(self, _name: &'static str, _len: usize) -> Result<Compound<'a>, CheckError> {
        Ok(Compound { checker: self, index: 0 })
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Compound<'a>, CheckError> {
        Ok(Compound { checker: self, index: 0 })
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Compound<'a>, CheckError> {
        Ok(Compound { checker: self, index: 0 })
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Compound<'a>, CheckError> {
        Ok(Compound { checker: self, index: 0 })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Compound<'a>, CheckError> {
        Ok(Compound { checker: self, index: 0 })
    }
}

impl ser::SerializeSeq for Compound<'_> {
    type Ok = ();
    type Error = CheckError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), CheckError> {
        self.element(value)
    }

    fn end(self) -> Result<(), CheckError> {
        Ok(())
    }
}

impl ser::SerializeTuple for Compound<'_> {
    type Ok = ();
    type Error = CheckError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), CheckError> {
        self.element(value)
    }

    fn end(self) -> Result<(), CheckError> {
        Ok(())
    }
}

impl ser::SerializeTupleStruct for Compound<'_> {
    type Ok = ();
    type Error = CheckError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), CheckError> {
        self.element(value)
    }

    fn end(self) -> Result<(), CheckError> {
        Ok(())
    }
}

impl ser::SerializeTupleVariant for Compound<'_> {
    type Ok = ();
    type Error = CheckError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), CheckError> {
        self.element(value)
    }

    fn end(self) -> Result<(), CheckError> {
        Ok(())
    }
}

impl ser::SerializeMap for Compound<'_> {
    type Ok = ();
    type Error = CheckError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<(), CheckError> {
        key.serialize(&mut *self.checker)
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), CheckError> {
        self.element(value)
    }

    fn end(self) -> Result<(), CheckError> {
        Ok(())
    }
}

impl ser::SerializeStruct for Compound<'_> {
    type Ok = ();
    type Error = CheckError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, key: &'static str, value: &T) -> Result<(), CheckError> {
        self.checker.nested(key.to_string(), value)
    }

    fn end(self) -> Result<(), CheckError> {
        Ok(())
    }
}

impl ser::SerializeStructVariant for Compound<'_> {
    type Ok = ();
    type Error = CheckError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, key: &'static str, value: &T) -> Result<(), CheckError> {
        self.checker.nested(key.to_string(), value)
    }

    fn end(self) -> Result<(), CheckError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use serde_json::json;

    #[derive(Serialize)]
    struct Sample {
        label: String,
        readings: Vec<f64>,
        peak: Option<f32>,
    }

    #[test]
    fn test_contains_null() {
        assert!(!contains_null(&json!({"a": [1, 2], "b": "x"})));
        assert!(contains_null(&json!({"a": [1, null]})));
    }

    #[test]
    fn test_finite_values_pass() {
        let sample = Sample {
            label: "ok".to_string(),
            readings: vec![1.0, -2.5],
            peak: None,
        };
        assert!(ensure_finite(&sample, "Sample").is_ok());
    }

    #[test]
    fn test_nan_in_sequence_reports_path() {
        let sample = Sample {
            label: "bad".to_string(),
            readings: vec![1.0, f64::NAN],
            peak: None,
        };
        let err = ensure_finite(&sample, "Sample").unwrap_err();
        match err {
            Error::Conversion { path, from, value, .. } => {
                assert_eq!(path, "readings.1");
                assert_eq!(from, "f64");
                assert_eq!(value, "NaN");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_infinite_option_is_rejected() {
        let sample = Sample {
            label: "bad".to_string(),
            readings: Vec::new(),
            peak: Some(f32::INFINITY),
        };
        let err = ensure_finite(&sample, "Sample").unwrap_err();
        assert!(matches!(err, Error::Conversion { ref path, .. } if path == "peak"));
    }
}
