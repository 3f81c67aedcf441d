//! # Catalog
//!
//! Durable table metadata behind a small service surface: open, persist,
//! create_table, get_table, get_tables. The catalog is read-mostly; writers
//! (`create_table`, `persist`) take the write lock, lookups take the read
//! lock. Persistence is a single JSON object, not a database of its own.

mod catalog;
mod persistence;
mod table;

pub use catalog::Catalog;
pub use table::{datetime_layout, ColumnDef, ColumnOptions, TableDef, DATETIME_FORMAT_OPTION};
