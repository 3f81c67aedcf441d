//! Table and column metadata.

use crate::error::{Error, Result};
use crate::types::DataType;
use std::collections::BTreeMap;

/// Free-form column options. The only recognized key today is
/// [`DATETIME_FORMAT_OPTION`] on DATETIME columns.
pub type ColumnOptions = BTreeMap<String, String>;

/// Option key selecting the text layout of a DATETIME column.
pub const DATETIME_FORMAT_OPTION: &str = "format";

/// Maps a DATETIME `format` option value to its chrono layout string.
pub fn datetime_layout(name: &str) -> Option<&'static str> {
    match name {
        "DateTime" => Some("%Y-%m-%d %H:%M:%S"),
        "DateOnly" => Some("%Y-%m-%d"),
        "TimeOnly" => Some("%H:%M:%S"),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: DataType,
    pub options: ColumnOptions,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            options: ColumnOptions::new(),
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// The chrono layout for this column's DATETIME `format` option, or the
    /// full date-time layout when unset.
    pub fn datetime_format(&self) -> Result<&'static str> {
        let name = self
            .options
            .get(DATETIME_FORMAT_OPTION)
            .map(String::as_str)
            .unwrap_or("DateTime");
        datetime_layout(name).ok_or_else(|| {
            Error::Index(format!(
                "unsupported datetime format '{}' for column '{}'",
                name, self.name
            ))
        })
    }
}

/// Metadata for one table. Column order is declaration order; the resolver
/// and `*` expansion depend on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub directory: String,
    pub partition: Option<String>,
}

impl TableDef {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDef>, partition: Option<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            directory: String::new(),
            partition,
        }
    }

    pub fn get_column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Partition invariant: a non-empty partition must name one of the
    /// declared columns, compared case-insensitively.
    pub fn validate(&self) -> Result<()> {
        if let Some(partition) = self.partition.as_deref() {
            let found = self
                .columns
                .iter()
                .any(|c| c.name.eq_ignore_ascii_case(partition));
            if !found {
                return Err(Error::InvalidPartition(partition.to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_must_match_a_column() {
        let table = TableDef::new(
            "events",
            vec![
                ColumnDef::new("region", DataType::Keyword),
                ColumnDef::new("count", DataType::Integer),
            ],
            Some("Region".to_string()),
        );
        assert!(table.validate().is_ok());

        let bad = TableDef::new(
            "events",
            vec![ColumnDef::new("region", DataType::Keyword)],
            Some("zone".to_string()),
        );
        assert!(matches!(bad.validate(), Err(Error::InvalidPartition(p)) if p == "zone"));
    }

    #[test]
    fn absent_partition_is_valid() {
        let table = TableDef::new("t", vec![ColumnDef::new("c", DataType::Text)], None);
        assert!(table.validate().is_ok());
    }

    #[test]
    fn datetime_format_defaults_to_full_layout() {
        let plain = ColumnDef::new("ts", DataType::Datetime);
        assert_eq!(plain.datetime_format().unwrap(), "%Y-%m-%d %H:%M:%S");

        let date_only =
            ColumnDef::new("day", DataType::Datetime).with_option(DATETIME_FORMAT_OPTION, "DateOnly");
        assert_eq!(date_only.datetime_format().unwrap(), "%Y-%m-%d");

        let bogus =
            ColumnDef::new("ts", DataType::Datetime).with_option(DATETIME_FORMAT_OPTION, "Epoch");
        assert!(matches!(bogus.datetime_format(), Err(Error::Index(_))));
    }
}
