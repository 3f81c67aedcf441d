//! # Column Data Types
//!
//! The closed set of logical types a column may be declared with. The wire
//! encoding (catalog JSON, CREATE TABLE grammar) is the uppercase type name.

use crate::error::{Error, Result};
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Logical column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Keyword,
    Text,
    Integer,
    Float,
    Datetime,
    Geopoint,
}

impl DataType {
    /// Uppercase name used in SQL and in the catalog wire format.
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Keyword => "KEYWORD",
            DataType::Text => "TEXT",
            DataType::Integer => "INTEGER",
            DataType::Float => "FLOAT",
            DataType::Datetime => "DATETIME",
            DataType::Geopoint => "GEOPOINT",
        }
    }

    /// True for types stored as numeric fields in the index.
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Integer | DataType::Float)
    }

    /// True for types stored as string fields in the index.
    pub fn is_text(&self) -> bool {
        matches!(self, DataType::Keyword | DataType::Text)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "KEYWORD" => Ok(DataType::Keyword),
            "TEXT" => Ok(DataType::Text),
            "INTEGER" => Ok(DataType::Integer),
            "FLOAT" => Ok(DataType::Float),
            "DATETIME" => Ok(DataType::Datetime),
            "GEOPOINT" => Ok(DataType::Geopoint),
            other => Err(Error::Conversion {
                lexeme: other.to_string(),
                target: "data type",
                reason: "not a recognized column type".to_string(),
            }),
        }
    }
}

impl Serialize for DataType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DataType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
