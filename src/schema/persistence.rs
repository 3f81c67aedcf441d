//! Catalog persistence: one JSON object, written atomically.
//!
//! Wire shape:
//!
//! ```json
//! {
//!   "tables": {
//!     "t1": {
//!       "table": "t1",
//!       "columns": { "c1": { "column": "c1", "type": "KEYWORD" } },
//!       "directory": "/data/t1",
//!       "partition": "c1"
//!     }
//!   }
//! }
//! ```
//!
//! Column order inside `columns` is declaration order; `serde_json` is built
//! with `preserve_order` so a reload observes the same order it wrote.

use crate::error::Result;
use crate::schema::table::{ColumnDef, ColumnOptions, TableDef};
use crate::types::DataType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub(crate) const CATALOG_FILE: &str = "catalog.json";

#[derive(Serialize, Deserialize)]
struct CatalogWire {
    tables: serde_json::Map<String, serde_json::Value>,
}

#[derive(Serialize, Deserialize)]
struct TableWire {
    table: String,
    columns: serde_json::Map<String, serde_json::Value>,
    directory: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    partition: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct ColumnWire {
    column: String,
    #[serde(rename = "type")]
    data_type: DataType,
    #[serde(default, skip_serializing_if = "ColumnOptions::is_empty")]
    options: ColumnOptions,
}

fn to_wire(table: &TableDef) -> Result<serde_json::Value> {
    let mut columns = serde_json::Map::new();
    for column in &table.columns {
        let wire = ColumnWire {
            column: column.name.clone(),
            data_type: column.data_type,
            options: column.options.clone(),
        };
        columns.insert(column.name.clone(), serde_json::to_value(wire)?);
    }
    Ok(serde_json::to_value(TableWire {
        table: table.name.clone(),
        columns,
        directory: table.directory.clone(),
        partition: table.partition.clone(),
    })?)
}

fn from_wire(value: serde_json::Value) -> Result<TableDef> {
    let wire: TableWire = serde_json::from_value(value)?;
    let mut columns = Vec::with_capacity(wire.columns.len());
    for (_, column) in wire.columns {
        let column: ColumnWire = serde_json::from_value(column)?;
        columns.push(ColumnDef {
            name: column.column,
            data_type: column.data_type,
            options: column.options,
        });
    }
    Ok(TableDef {
        name: wire.table,
        columns,
        directory: wire.directory,
        partition: wire.partition,
    })
}

/// Loads the catalog file. A missing file is an empty catalog.
pub(crate) fn load(directory: &Path) -> Result<HashMap<String, TableDef>> {
    let path = directory.join(CATALOG_FILE);
    let data = match fs::read(&path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
        Err(e) => return Err(e.into()),
    };

    let wire: CatalogWire = serde_json::from_slice(&data)?;
    let mut tables = HashMap::with_capacity(wire.tables.len());
    for (name, table) in wire.tables {
        tables.insert(name, from_wire(table)?);
    }
    Ok(tables)
}

/// Writes the whole catalog as one JSON blob, via a temp file and rename so
/// readers never observe a torn write.
pub(crate) fn save(directory: &Path, tables: &HashMap<String, TableDef>) -> Result<()> {
    let mut wire = CatalogWire {
        tables: serde_json::Map::new(),
    };
    let mut names: Vec<&String> = tables.keys().collect();
    names.sort_unstable();
    for name in names {
        wire.tables.insert(name.clone(), to_wire(&tables[name])?);
    }

    let data = serde_json::to_vec_pretty(&wire)?;
    fs::create_dir_all(directory)?;
    let tmp = directory.join(format!("{}.tmp", CATALOG_FILE));
    fs::write(&tmp, data)?;
    fs::rename(&tmp, directory.join(CATALOG_FILE))?;
    Ok(())
}
