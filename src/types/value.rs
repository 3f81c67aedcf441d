//! # Runtime Value Representation
//!
//! `Value` is the tagged union used everywhere rows flow: scan decoding,
//! predicate evaluation, projection output, and the JSON wire form.
//!
//! Exactly one payload is active per value. Coercion follows the engine's
//! calculus:
//!
//! - `can_int` / `can_float` ask whether a value participates in integer or
//!   float arithmetic. Floats never coerce to integers (lossy truncation is
//!   reserved for explicit scan decoding of INTEGER columns).
//! - `to_int` / `to_float` are lossy and default to zero when the payload
//!   cannot be converted.
//! - `to_bool` implements SQL-ish truthiness: nonzero numbers, the usual
//!   true/false word table for strings, and false for everything else.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::{self, Deserializer};
use serde::ser::{self, SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminant of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Invalid,
    String,
    Int,
    Float,
    Bool,
    DateTime,
    GeoPoint,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Invalid => "invalid",
            ValueKind::String => "string",
            ValueKind::Int => "int64",
            ValueKind::Float => "float64",
            ValueKind::Bool => "boolean",
            ValueKind::DateTime => "datetime",
            ValueKind::GeoPoint => "geopoint",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tagged scalar value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Invalid,
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(DateTime<Utc>),
    GeoPoint {
        lat: f64,
        lon: f64,
    },
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Invalid => ValueKind::Invalid,
            Value::String(_) => ValueKind::String,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Bool(_) => ValueKind::Bool,
            Value::DateTime(_) => ValueKind::DateTime,
            Value::GeoPoint { .. } => ValueKind::GeoPoint,
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, Value::Invalid)
    }

    // Checked accessors. Each returns None when the kind does not match.

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::DateTime(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_geo_point(&self) -> Option<(f64, f64)> {
        match self {
            Value::GeoPoint { lat, lon } => Some((*lat, *lon)),
            _ => None,
        }
    }

    /// True when this value participates in integer arithmetic.
    pub fn can_int(&self) -> bool {
        match self {
            Value::Int(_) | Value::Bool(_) => true,
            Value::Float(_) => false,
            Value::String(s) => s.trim().parse::<i64>().is_ok(),
            _ => false,
        }
    }

    /// True when this value participates in float arithmetic.
    pub fn can_float(&self) -> bool {
        match self {
            Value::Int(_) | Value::Float(_) | Value::Bool(_) => true,
            Value::String(s) => s.trim().parse::<f64>().is_ok(),
            _ => false,
        }
    }

    /// Lossy integer conversion; defaults to zero on failure.
    pub fn to_int(&self) -> i64 {
        match self {
            Value::Int(i) => *i,
            Value::Float(f) => *f as i64,
            Value::Bool(b) => i64::from(*b),
            Value::String(s) => s.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }

    /// Lossy float conversion; defaults to zero on failure.
    pub fn to_float(&self) -> f64 {
        match self {
            Value::Int(i) => *i as f64,
            Value::Float(f) => *f,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::String(s) => s.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// Truthiness. Nonzero numbers are true (NaN is false); strings match a
    /// case-insensitive word table, then parse as integer, then as float;
    /// everything else is false.
    pub fn to_bool(&self) -> bool {
        match self {
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0 && !f.is_nan(),
            Value::Bool(b) => *b,
            Value::String(s) => {
                let s = s.trim().to_ascii_lowercase();
                match s.as_str() {
                    "true" | "t" | "yes" | "y" | "on" => return true,
                    "false" | "f" | "no" | "n" | "off" => return false,
                    _ => {}
                }
                if let Ok(i) = s.parse::<i64>() {
                    return i != 0;
                }
                if let Ok(f) = s.parse::<f64>() {
                    return f != 0.0 && !f.is_nan();
                }
                false
            }
            _ => false,
        }
    }

    /// Plain text rendering without quoting, used by LIKE matching and the
    /// SHOW TABLES output. `Display` quotes strings to keep them apart from
    /// numbers in logs; this does not.
    pub fn to_text(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::DateTime(t) => t.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            Value::GeoPoint { lat, lon } => format!("{:.6},{:.6}", lat, lon),
            Value::Invalid => String::new(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Bool(b) => write!(f, "{}", b),
            Value::DateTime(t) => write!(f, "{}", t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::GeoPoint { lat, lon } => write!(f, "{:.6},{:.6}", lat, lon),
            Value::Invalid => write!(f, "<invalid>"),
        }
    }
}

// Wire form: {"kind": "...", "value": ...}. Datetimes travel as RFC 3339
// strings, geopoints as {"lat": .., "lon": ..}.

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut out = serializer.serialize_struct("Value", 2)?;
        out.serialize_field("kind", self.kind().as_str())?;
        match self {
            Value::Invalid => out.serialize_field("value", &serde_json::Value::Null)?,
            Value::String(s) => out.serialize_field("value", s)?,
            Value::Int(i) => out.serialize_field("value", i)?,
            Value::Float(f) => {
                if !f.is_finite() {
                    return Err(ser::Error::custom("non-finite float"));
                }
                out.serialize_field("value", f)?;
            }
            Value::Bool(b) => out.serialize_field("value", b)?,
            Value::DateTime(t) => {
                out.serialize_field("value", &t.to_rfc3339_opts(SecondsFormat::AutoSi, true))?
            }
            Value::GeoPoint { lat, lon } => {
                out.serialize_field("value", &serde_json::json!({ "lat": lat, "lon": lon }))?
            }
        }
        out.end()
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Wire {
            kind: String,
            #[serde(default)]
            value: serde_json::Value,
        }

        let wire = Wire::deserialize(deserializer)?;
        let kind = wire.kind.trim().to_ascii_lowercase();
        let v = wire.value;

        match kind.as_str() {
            "invalid" => Ok(Value::Invalid),
            "string" => match v {
                serde_json::Value::String(s) => Ok(Value::String(s)),
                other => Err(de::Error::custom(format!(
                    "value(kind=string) must be a JSON string, got {}",
                    other
                ))),
            },
            "int" | "int64" => match v {
                serde_json::Value::Number(n) => n
                    .as_i64()
                    .map(Value::Int)
                    .ok_or_else(|| de::Error::custom("value(kind=int64) not an int64")),
                serde_json::Value::String(s) => s
                    .trim()
                    .parse()
                    .map(Value::Int)
                    .map_err(|e| de::Error::custom(format!("value(kind=int64): {}", e))),
                _ => Err(de::Error::custom(
                    "value(kind=int64) must be a number or base-10 string",
                )),
            },
            "float" | "float64" => match v {
                serde_json::Value::Number(n) => n
                    .as_f64()
                    .filter(|f| f.is_finite())
                    .map(Value::Float)
                    .ok_or_else(|| de::Error::custom("value(kind=float64) must be finite")),
                serde_json::Value::String(s) => match s.trim().parse::<f64>() {
                    Ok(f) if f.is_finite() => Ok(Value::Float(f)),
                    _ => Err(de::Error::custom("value(kind=float64) invalid float string")),
                },
                _ => Err(de::Error::custom(
                    "value(kind=float64) must be a number or numeric string",
                )),
            },
            "bool" | "boolean" => match v {
                serde_json::Value::Bool(b) => Ok(Value::Bool(b)),
                serde_json::Value::Number(n) => Ok(Value::Bool(n.as_i64().unwrap_or(0) != 0)),
                serde_json::Value::String(s) => {
                    match s.trim().to_ascii_lowercase().as_str() {
                        "true" | "t" | "yes" | "y" | "on" | "1" => Ok(Value::Bool(true)),
                        "false" | "f" | "no" | "n" | "off" | "0" => Ok(Value::Bool(false)),
                        other => Err(de::Error::custom(format!(
                            "value(kind=boolean) invalid boolean string {:?}",
                            other
                        ))),
                    }
                }
                _ => Err(de::Error::custom(
                    "value(kind=boolean) must be bool, boolean string, or 0/1",
                )),
            },
            "datetime" | "time" => match v {
                serde_json::Value::String(s) => DateTime::parse_from_rfc3339(&s)
                    .map(|t| Value::DateTime(t.with_timezone(&Utc)))
                    .map_err(|e| de::Error::custom(format!("value(kind=datetime): {}", e))),
                _ => Err(de::Error::custom(
                    "value(kind=datetime) must be an RFC 3339 string",
                )),
            },
            "geopoint" | "geo" | "point" => {
                if let Some(obj) = v.as_object() {
                    let lat = obj.get("lat").and_then(|v| v.as_f64());
                    let lon = obj.get("lon").and_then(|v| v.as_f64());
                    if let (Some(lat), Some(lon)) = (lat, lon) {
                        return Ok(Value::GeoPoint { lat, lon });
                    }
                }
                if let Some(arr) = v.as_array() {
                    if arr.len() == 2 {
                        if let (Some(lat), Some(lon)) = (arr[0].as_f64(), arr[1].as_f64()) {
                            return Ok(Value::GeoPoint { lat, lon });
                        }
                    }
                }
                Err(de::Error::custom(
                    "value(kind=geopoint) must be {\"lat\":..,\"lon\":..} or [lat,lon]",
                ))
            }
            other => Err(de::Error::custom(format!("unknown kind {:?}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn can_int_excludes_floats() {
        assert!(Value::Int(3).can_int());
        assert!(!Value::Float(3.0).can_int());
        assert!(Value::String("42".into()).can_int());
        assert!(!Value::String("4.2".into()).can_int());
        assert!(!Value::String("apple".into()).can_int());
        assert!(Value::Bool(true).can_int());
    }

    #[test]
    fn can_float_accepts_numeric_strings() {
        assert!(Value::String("1.5".into()).can_float());
        assert!(Value::String(" 7 ".into()).can_float());
        assert!(!Value::String("pie".into()).can_float());
        assert!(!Value::Invalid.can_float());
    }

    #[test]
    fn conversions_default_to_zero() {
        assert_eq!(Value::String("apple".into()).to_int(), 0);
        assert_eq!(Value::String("apple".into()).to_float(), 0.0);
        assert_eq!(Value::Invalid.to_int(), 0);
    }

    #[test]
    fn bool_word_table() {
        for s in ["true", "T", "yes", "Y", "ON"] {
            assert!(Value::String(s.into()).to_bool(), "{}", s);
        }
        for s in ["false", "F", "no", "N", "off", "", "pumpkin"] {
            assert!(!Value::String(s.into()).to_bool(), "{:?}", s);
        }
        assert!(Value::String("12".into()).to_bool());
        assert!(!Value::String("0.0".into()).to_bool());
        assert!(!Value::Float(f64::NAN).to_bool());
    }

    #[test]
    fn checked_accessors_require_matching_kind() {
        assert_eq!(Value::Int(5).as_int(), Some(5));
        assert_eq!(Value::Int(5).as_float(), None);
        assert_eq!(Value::Float(1.5).as_float(), Some(1.5));
        assert_eq!(Value::String("x".into()).as_str(), Some("x"));
        assert_eq!(Value::String("x".into()).as_int(), None);
    }

    #[test]
    fn wire_round_trip() {
        let values = vec![
            Value::String("hello".into()),
            Value::Int(-3),
            Value::Float(2.25),
            Value::Bool(true),
            Value::DateTime(Utc.with_ymd_and_hms(2021, 6, 1, 12, 0, 0).unwrap()),
            Value::GeoPoint {
                lat: 51.5,
                lon: -0.12,
            },
        ];
        for v in values {
            let json = serde_json::to_string(&v).unwrap();
            let back: Value = serde_json::from_str(&json).unwrap();
            assert_eq!(back, v, "{}", json);
        }
    }

    #[test]
    fn wire_rejects_non_finite_floats() {
        assert!(serde_json::to_string(&Value::Float(f64::INFINITY)).is_err());
    }

    #[test]
    fn wire_accepts_numeric_strings() {
        let v: Value = serde_json::from_str(r#"{"kind":"int64","value":"12"}"#).unwrap();
        assert_eq!(v, Value::Int(12));
        let v: Value = serde_json::from_str(r#"{"kind":"float64","value":"1.5"}"#).unwrap();
        assert_eq!(v, Value::Float(1.5));
    }
}
