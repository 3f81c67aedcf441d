//! Process-wide table catalog.

use crate::error::{Error, Result};
use crate::schema::persistence;
use crate::schema::table::TableDef;
use crate::sql::context::QueryContext;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Durable table metadata store. Read-mostly: lookups take the read lock,
/// `create_table` and `persist` take the write lock so persistence is atomic
/// with respect to creation.
#[derive(Debug)]
pub struct Catalog {
    directory: PathBuf,
    tables: RwLock<HashMap<String, TableDef>>,
}

impl Catalog {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            tables: RwLock::new(HashMap::new()),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Loads the persisted catalog. A missing file leaves the catalog empty.
    pub fn open(&self) -> Result<()> {
        let loaded = persistence::load(&self.directory)?;
        let mut tables = self.tables.write();
        *tables = loaded;
        debug!(tables = tables.len(), "catalog opened");
        Ok(())
    }

    /// Writes the whole catalog to disk.
    pub fn persist(&self) -> Result<()> {
        let tables = self.tables.write();
        persistence::save(&self.directory, &tables)?;
        info!(tables = tables.len(), "catalog persisted");
        Ok(())
    }

    /// Registers a table. Fails with [`Error::TableExists`] on duplicates and
    /// [`Error::InvalidPartition`] when the partition invariant is violated.
    /// Assigns the table's index directory under the catalog root.
    pub fn create_table(&self, ctx: &QueryContext, mut table: TableDef) -> Result<()> {
        table.validate()?;

        let mut tables = self.tables.write();
        if tables.contains_key(&table.name) {
            return Err(Error::TableExists(table.name));
        }

        table.directory = self
            .directory
            .join(&table.name)
            .to_string_lossy()
            .into_owned();
        info!(query_id = %ctx.query_id(), table = %table.name, "creating table");
        tables.insert(table.name.clone(), table);
        Ok(())
    }

    /// Looks up one table by exact name.
    pub fn get_table(&self, name: &str) -> Result<TableDef> {
        let tables = self.tables.read();
        tables
            .get(name)
            .cloned()
            .ok_or_else(|| Error::NoSuchTable(name.to_string()))
    }

    /// All known tables, in unspecified order.
    pub fn get_tables(&self) -> Vec<TableDef> {
        self.tables.read().values().cloned().collect()
    }
}
