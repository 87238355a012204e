//! Scalar coercions between mismatched primitive members
//!
//! The plan builder only records that a coercion is required; the eager
//! transformer and the projection interpreter both apply it through
//! [`Coercion::apply`], so the two forms convert values identically.
//!
//! Policy: widening always succeeds, narrowing is range checked, textual
//! conversions parse, and pairs with no sensible conversion are rejected
//! when the plan is built.
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use crate::config::FloatToInt;
use crate::shape::ScalarKind;
use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde_json::{Number, Value};
use std::fmt;

const NAIVE_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// A recorded conversion from one scalar kind to another
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coercion {
    from: ScalarKind,
    to: ScalarKind,
    float_to_int: FloatToInt,
}

impl Coercion {
    /// Plan a coercion, or `None` when no conversion exists between the kinds
    pub fn between(from: ScalarKind, to: ScalarKind, float_to_int: FloatToInt) -> Option<Self> {
        if convertible(from, to) {
            Some(Self { from, to, float_to_int })
        } else {
            None
        }
    }

    pub fn from(&self) -> ScalarKind {
        self.from
    }

    pub fn to(&self) -> ScalarKind {
        self.to
    }

    /// Whether some source values cannot be represented in the target
    pub fn is_narrowing(&self) -> bool {
        let (from, to) = (self.from, self.to);
        match (from.integer_bounds(), to.integer_bounds()) {
            (Some((fmin, fmax)), Some((tmin, tmax))) => fmin < tmin || fmax > tmax,
            (None, Some(_)) => true,
            (Some(_), None) if to == ScalarKind::F32 => {
                !matches!(from, ScalarKind::I8 | ScalarKind::I16 | ScalarKind::U8 | ScalarKind::U16)
            }
            (Some(_), None) if to == ScalarKind::F64 => matches!(from, ScalarKind::I64 | ScalarKind::U64),
            _ => match (from, to) {
                (_, ScalarKind::String) => false,
                (ScalarKind::F64, ScalarKind::F32) => true,
                (ScalarKind::DateTime, ScalarKind::Date)
                | (ScalarKind::NaiveDateTime, ScalarKind::Date) => true,
                (ScalarKind::String, _) => true,
                (ScalarKind::Enum(_), ScalarKind::Enum(_)) => true,
                _ => false,
            },
        }
    }

    /// Convert one value; absence stays absent
    pub fn apply(&self, value: &Value, path: &str) -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }

        match self.to {
            to if to.is_integer() => self.to_integer(value, path),
            ScalarKind::F32 | ScalarKind::F64 => self.to_float(value, path),
            ScalarKind::String => self.to_text(value, path),
            ScalarKind::Bool => self.to_bool(value, path),
            ScalarKind::Char => self.to_char(value, path),
            ScalarKind::DateTime => {
                let ts = self.to_timestamp(value, path)?;
                Ok(Value::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)))
            }
            ScalarKind::NaiveDateTime => {
                let ts = self.to_timestamp(value, path)?;
                Ok(Value::String(ts.naive_utc().format(NAIVE_DATETIME_FORMAT).to_string()))
            }
            ScalarKind::Date => {
                let ts = self.to_timestamp(value, path)?;
                Ok(Value::String(ts.date_naive().format(DATE_FORMAT).to_string()))
            }
            ScalarKind::Enum(_) => match value {
                Value::String(_) => Ok(value.clone()),
                _ => Err(self.failure(value, path)),
            },
            _ => Err(self.failure(value, path)),
        }
    }

    fn to_integer(&self, value: &Value, path: &str) -> Result<Value> {
        let n: i128 = match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    i as i128
                } else if let Some(u) = n.as_u64() {
                    u as i128
                } else {
                    let f = n.as_f64().ok_or_else(|| self.failure(value, path))?;
                    self.truncate(f, value, path)?
                }
            }
            Value::String(s) => {
                let s = s.trim();
                match s.parse::<i128>() {
                    Ok(i) => i,
                    Err(_) => {
                        let f = s.parse::<f64>().map_err(|_| self.failure(value, path))?;
                        self.truncate(f, value, path)?
                    }
                }
            }
            _ => return Err(self.failure(value, path)),
        };

        let (min, max) = self.to.integer_bounds().ok_or_else(|| self.failure(value, path))?;
        if n < min || n > max {
            return Err(self.failure(value, path));
        }

        if n < 0 {
            Ok(Value::from(n as i64))
        } else {
            Ok(Value::from(n as u64))
        }
    }

    fn truncate(&self, f: f64, value: &Value, path: &str) -> Result<i128> {
        if !f.is_finite() {
            return Err(self.failure(value, path));
        }
        if self.float_to_int == FloatToInt::Reject && f.fract() != 0.0 {
            return Err(self.failure(value, path));
        }
        let truncated = f.trunc();
        if truncated < i128::MIN as f64 || truncated > i128::MAX as f64 {
            return Err(self.failure(value, path));
        }
        Ok(truncated as i128)
    }

    fn to_float(&self, value: &Value, path: &str) -> Result<Value> {
        let f = match value {
            Value::Number(n) => n.as_f64().ok_or_else(|| self.failure(value, path))?,
            Value::String(s) => s.trim().parse::<f64>().map_err(|_| self.failure(value, path))?,
            _ => return Err(self.failure(value, path)),
        };

        if self.to == ScalarKind::F32 {
            if !f.is_finite() || f.abs() > f32::MAX as f64 {
                return Err(self.failure(value, path));
            }
            return Ok(Value::from(f as f32));
        }

        Number::from_f64(f)
            .map(Value::Number)
            .ok_or_else(|| self.failure(value, path))
    }

    fn to_text(&self, value: &Value, path: &str) -> Result<Value> {
        match value {
            Value::String(_) => Ok(value.clone()),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            _ => Err(self.failure(value, path)),
        }
    }

    fn to_bool(&self, value: &Value, path: &str) -> Result<Value> {
        match value {
            Value::Bool(_) => Ok(value.clone()),
            Value::String(s) => match s.trim().to_lowercase().as_str() {
                "true" | "yes" | "1" | "on" => Ok(Value::Bool(true)),
                "false" | "no" | "0" | "off" => Ok(Value::Bool(false)),
                _ => Err(self.failure(value, path)),
            },
            _ => Err(self.failure(value, path)),
        }
    }

    fn to_char(&self, value: &Value, path: &str) -> Result<Value> {
        let s = value.as_str().ok_or_else(|| self.failure(value, path))?;
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(Value::String(c.to_string())),
            _ => Err(self.failure(value, path)),
        }
    }

    fn to_timestamp(&self, value: &Value, path: &str) -> Result<DateTime<Utc>> {
        let s = value.as_str().ok_or_else(|| self.failure(value, path))?;
        parse_timestamp(s.trim()).ok_or_else(|| self.failure(value, path))
    }

    fn failure(&self, value: &Value, path: &str) -> Error {
        Error::Conversion {
            path: path.to_string(),
            from: self.from.to_string(),
            to: self.to.to_string(),
            value: value.to_string(),
        }
    }
}

impl fmt::Display for Coercion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

fn convertible(from: ScalarKind, to: ScalarKind) -> bool {
    if from == to {
        return true;
    }
    match (from, to) {
        (f, t) if f.is_numeric() && t.is_numeric() => true,
        (_, ScalarKind::String) => true,
        (ScalarKind::String, _) => true,
        (f, t) if f.is_temporal() && t.is_temporal() => true,
        (ScalarKind::Enum(_), ScalarKind::Enum(_)) => true,
        _ => false,
    }
}

/// Accepts RFC 3339, naive date-time and plain date text (naive values are UTC)
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, NAIVE_DATETIME_FORMAT) {
        return Some(Utc.from_utc_datetime(&naive));
    }
    let date = NaiveDate::parse_from_str(s, DATE_FORMAT).ok()?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}
