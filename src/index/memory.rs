//! In-memory reference [`IndexStore`].
//!
//! Holds stored fields exactly as an on-disk segment would hand them back:
//! opaque encoded bytes per field, one `_id` per document. Used by the
//! integration tests and as the executable description of the stored-field
//! contract.

use super::{codec, FieldDecoder, IndexStore, SearchRequest, ID_FIELD};
use crate::error::{Error, Result};
use crate::record::HitCollector;
use crate::schema::TableDef;
use crate::sql::context::QueryContext;
use crate::types::{DataType, Value};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct StoredDoc {
    fields: Vec<(String, Vec<u8>)>,
    size: u64,
}

#[derive(Debug, Default)]
pub struct MemoryIndexStore {
    tables: RwLock<HashMap<String, Vec<StoredDoc>>>,
}

impl MemoryIndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes one document. Values are encoded per the column type of the
    /// owning table; a DATETIME column accepts either a ready-made
    /// [`Value::DateTime`] or a string in the column's `format` layout.
    pub fn insert(&self, table: &TableDef, fields: &[(&str, Value)]) -> Result<()> {
        let mut doc = StoredDoc {
            fields: Vec::with_capacity(fields.len() + 1),
            size: 0,
        };
        doc.fields
            .push((ID_FIELD.to_string(), Uuid::new_v4().to_string().into_bytes()));

        for (name, value) in fields {
            let column = table.get_column(name).ok_or_else(|| {
                Error::Index(format!(
                    "column '{}' does not exist in table '{}'",
                    name, table.name
                ))
            })?;
            let encoded = encode_field(column, value)?;
            doc.size += encoded.len() as u64;
            doc.fields.push((name.to_string(), encoded));
        }

        let mut tables = self.tables.write();
        tables.entry(table.name.clone()).or_default().push(doc);
        Ok(())
    }

    pub fn doc_count(&self, table: &str) -> usize {
        self.tables.read().get(table).map_or(0, Vec::len)
    }
}

fn encode_field(column: &crate::schema::ColumnDef, value: &Value) -> Result<Vec<u8>> {
    let mismatch = || {
        Error::Index(format!(
            "type/value mismatch for column '{}': {} value for {} column",
            column.name,
            value.kind(),
            column.data_type
        ))
    };

    match column.data_type {
        DataType::Text | DataType::Keyword => match value {
            Value::String(s) => Ok(s.as_bytes().to_vec()),
            _ => Err(mismatch()),
        },
        DataType::Integer | DataType::Float => match value {
            Value::Int(i) => Ok(codec::encode_numeric(*i as f64).to_vec()),
            Value::Float(f) => Ok(codec::encode_numeric(*f).to_vec()),
            _ => Err(mismatch()),
        },
        DataType::Datetime => match value {
            Value::DateTime(t) => Ok(codec::encode_datetime(*t).to_vec()),
            Value::String(s) => {
                let layout = column.datetime_format()?;
                let parsed = parse_datetime(s, layout).ok_or_else(|| {
                    Error::Index(format!(
                        "cannot parse datetime value '{}' for column '{}'",
                        s, column.name
                    ))
                })?;
                Ok(codec::encode_datetime(parsed).to_vec())
            }
            _ => Err(mismatch()),
        },
        DataType::Geopoint => match value {
            Value::GeoPoint { lat, lon } => Ok(codec::encode_geo_point(*lat, *lon).to_vec()),
            _ => Err(mismatch()),
        },
    }
}

fn parse_datetime(s: &str, layout: &str) -> Option<chrono::DateTime<Utc>> {
    if let Ok(t) = NaiveDateTime::parse_from_str(s, layout) {
        return Some(t.and_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, layout) {
        return Some(d.and_time(NaiveTime::MIN).and_utc());
    }
    if let Ok(t) = NaiveTime::parse_from_str(s, layout) {
        return Some(NaiveDate::from_ymd_opt(1970, 1, 1)?.and_time(t).and_utc());
    }
    None
}

impl IndexStore for MemoryIndexStore {
    fn search(
        &self,
        ctx: &QueryContext,
        table: &str,
        request: &SearchRequest,
        collector: &mut HitCollector,
        decoder: &mut FieldDecoder,
    ) -> Result<()> {
        let SearchRequest::MatchAll = request;

        let tables = self.tables.read();
        let docs = tables.get(table).map(Vec::as_slice).unwrap_or(&[]);
        debug!(query_id = %ctx.query_id(), table, hits = docs.len(), "index search");

        for doc in docs {
            if ctx.is_cancelled() {
                collector.close();
                return Err(Error::Cancelled);
            }
            for (field, raw) in &doc.fields {
                if !decoder(collector, field, raw) {
                    break;
                }
            }
            collector.set_bytes(doc.size);
            collector.emit();
        }

        collector.close();
        Ok(())
    }
}
