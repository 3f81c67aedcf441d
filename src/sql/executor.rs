//! # Streaming Operators
//!
//! The physical plan is a tree of pull-based operators. `open` acquires
//! resources top-down (the scan runs its index search there); `next` hands
//! one [`RowResult`] upstream at a time. Exhaustion is `Ok(None)`: the
//! operator's sink is closed and stays closed.
//!
//! Every operator observes the context's cancellation token between rows, so
//! a cancelled pipeline tears down after at most one in-flight row.
//!
//! Row-level failures ride inside `RowResult::error` and keep the stream
//! alive; failures that invalidate the whole statement return `Err` and end
//! the drain.

use super::context::QueryContext;
use super::eval::Evaluator;
use super::ast::{ColumnSpec, Expr};
use crate::error::{Error, Result};
use crate::index::{codec, IndexStore, SearchRequest, ID_FIELD};
use crate::record::{HitCollector, Record, RowResult};
use crate::schema::{Catalog, ColumnDef, TableDef};
use crate::types::{DataType, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info};

pub enum PhysicalOperator {
    Scan(ScanOperator),
    Filter(FilterOperator),
    Limit(LimitOperator),
    Project(ProjectOperator),
    Create(CreateOperator),
    ShowTables(ShowTablesOperator),
}

impl PhysicalOperator {
    /// Opens this operator and everything below it, root first.
    pub fn open(&mut self, ctx: &QueryContext) -> Result<()> {
        match self {
            PhysicalOperator::Scan(op) => op.open(ctx),
            PhysicalOperator::Filter(op) => op.child.open(ctx),
            PhysicalOperator::Limit(op) => op.child.open(ctx),
            PhysicalOperator::Project(op) => match op.child.as_mut() {
                Some(child) => child.open(ctx),
                None => Ok(()),
            },
            PhysicalOperator::Create(op) => op.open(ctx),
            PhysicalOperator::ShowTables(op) => op.open(ctx),
        }
    }

    /// Pulls the next row, or `None` once this operator is drained.
    pub fn next(&mut self, ctx: &QueryContext) -> Result<Option<RowResult>> {
        if ctx.is_cancelled() {
            return Err(Error::Cancelled);
        }
        match self {
            PhysicalOperator::Scan(op) => op.next(),
            PhysicalOperator::Filter(op) => op.next(ctx),
            PhysicalOperator::Limit(op) => op.next(ctx),
            PhysicalOperator::Project(op) => op.next(ctx),
            PhysicalOperator::Create(_) => Ok(None),
            PhysicalOperator::ShowTables(op) => Ok(op.rows.pop_front()),
        }
    }
}

/// Opens the root and drains it into a buffer.
pub fn run(root: &mut PhysicalOperator, ctx: &QueryContext) -> Result<Vec<RowResult>> {
    root.open(ctx)?;
    let mut results = Vec::new();
    while let Some(row) = root.next(ctx)? {
        results.push(row);
    }
    Ok(results)
}

/* *** Scan *** */

pub struct ScanOperator {
    index: Arc<dyn IndexStore>,
    table: TableDef,
    request: SearchRequest,
    collector: HitCollector,
    opened: bool,
    finished: bool,
    records: u64,
    bytes: u64,
}

impl ScanOperator {
    pub fn new(index: Arc<dyn IndexStore>, table: TableDef) -> Self {
        Self {
            index,
            table,
            request: SearchRequest::MatchAll,
            collector: HitCollector::new(),
            opened: false,
            finished: false,
            records: 0,
            bytes: 0,
        }
    }

    fn open(&mut self, ctx: &QueryContext) -> Result<()> {
        if self.opened {
            return Ok(());
        }
        self.opened = true;

        let table = &self.table;
        let collector = &mut self.collector;
        let mut decoder = |collector: &mut HitCollector, field: &str, raw: &[u8]| {
            decode_field(table, collector, field, raw)
        };
        self.index
            .search(ctx, &table.name, &self.request, collector, &mut decoder)?;

        if let Some(err) = self.collector.take_terminal() {
            return Err(err);
        }
        Ok(())
    }

    fn next(&mut self) -> Result<Option<RowResult>> {
        match self.collector.pop() {
            Some(row) => {
                self.records += 1;
                self.bytes += row.bytes_read;
                Ok(Some(row))
            }
            None => {
                if !self.finished {
                    self.finished = true;
                    info!(
                        table = %self.table.name,
                        records = self.records,
                        bytes = self.bytes,
                        "scan finished"
                    );
                }
                Ok(None)
            }
        }
    }
}

/// Decodes one stored field into the in-flight row. The store's `_id` field
/// is skipped; an unknown field aborts the scan; a malformed value attaches
/// to the current row and decoding continues.
fn decode_field(table: &TableDef, collector: &mut HitCollector, field: &str, raw: &[u8]) -> bool {
    if field == ID_FIELD {
        return true;
    }

    let Some(column) = table.get_column(field) else {
        collector.abort(Error::Index(format!(
            "unknown field '{}' stored for table '{}'",
            field, table.name
        )));
        return false;
    };

    let decoded = match column.data_type {
        DataType::Text | DataType::Keyword => codec::decode_text(raw).map(Value::String),
        DataType::Integer => codec::decode_numeric(raw).map(|v| Value::Int(v as i64)),
        DataType::Float => codec::decode_numeric(raw).map(Value::Float),
        DataType::Datetime => codec::decode_datetime(raw).map(Value::DateTime),
        DataType::Geopoint => codec::decode_geo_point(raw).map(|(lat, lon)| Value::GeoPoint { lat, lon }),
    };

    match decoded {
        Ok(value) => collector.add_value(field, value),
        Err(err) => {
            debug!(field, %err, "field decode failed");
            collector.fail_row(err);
        }
    }
    true
}

/* *** Filter *** */

pub struct FilterOperator {
    predicate: Expr,
    child: Box<PhysicalOperator>,
    evaluator: Evaluator,
}

impl FilterOperator {
    pub fn new(predicate: Expr, child: PhysicalOperator) -> Self {
        Self {
            predicate,
            child: Box::new(child),
            evaluator: Evaluator::new(),
        }
    }

    fn next(&mut self, ctx: &QueryContext) -> Result<Option<RowResult>> {
        loop {
            let Some(mut row) = self.child.next(ctx)? else {
                return Ok(None);
            };
            // rows already carrying an error are surfaced, not judged
            if row.error.is_some() {
                return Ok(Some(row));
            }
            match self.evaluator.evaluate(&self.predicate, &row.record) {
                Ok(value) => {
                    if value.to_bool() {
                        return Ok(Some(row));
                    }
                }
                Err(err) if err.is_row_level() => {
                    row.error = Some(err);
                    return Ok(Some(row));
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/* *** Limit *** */

pub struct LimitOperator {
    limit: u64,
    processed: u64,
    child: Box<PhysicalOperator>,
}

impl LimitOperator {
    pub fn new(limit: u64, child: PhysicalOperator) -> Self {
        Self {
            limit,
            processed: 0,
            child: Box::new(child),
        }
    }

    fn next(&mut self, ctx: &QueryContext) -> Result<Option<RowResult>> {
        if self.processed >= self.limit {
            // the source is simply not polled past the bound
            return Ok(None);
        }
        match self.child.next(ctx)? {
            Some(row) => {
                self.processed += 1;
                Ok(Some(row))
            }
            None => Ok(None),
        }
    }
}

/* *** Project *** */

pub struct ProjectOperator {
    child: Option<Box<PhysicalOperator>>,
    columns: Option<Vec<String>>,
}

impl ProjectOperator {
    /// When every projection is a resolved column identifier, rows are
    /// pruned down to exactly those columns; otherwise rows pass through
    /// unchanged.
    pub fn new(projections: &[Expr], child: Option<PhysicalOperator>) -> Self {
        let mut columns = Vec::with_capacity(projections.len());
        for projection in projections {
            match projection {
                Expr::Column(c) => columns.push(c.name.clone()),
                _ => {
                    columns.clear();
                    break;
                }
            }
        }
        Self {
            child: child.map(Box::new),
            columns: (!columns.is_empty()).then_some(columns),
        }
    }

    fn next(&mut self, ctx: &QueryContext) -> Result<Option<RowResult>> {
        let Some(child) = self.child.as_mut() else {
            return Ok(None);
        };
        let Some(mut row) = child.next(ctx)? else {
            return Ok(None);
        };
        if let Some(columns) = &self.columns {
            row.record.retain_columns(columns);
        }
        Ok(Some(row))
    }
}

/* *** Create *** */

pub struct CreateOperator {
    catalog: Arc<Catalog>,
    name: String,
    columns: Vec<ColumnSpec>,
    partition: Option<String>,
    opened: bool,
}

impl CreateOperator {
    pub fn new(
        catalog: Arc<Catalog>,
        name: String,
        columns: Vec<ColumnSpec>,
        partition: Option<String>,
    ) -> Self {
        Self {
            catalog,
            name,
            columns,
            partition,
            opened: false,
        }
    }

    fn open(&mut self, ctx: &QueryContext) -> Result<()> {
        if self.opened {
            return Ok(());
        }
        self.opened = true;

        let columns = self
            .columns
            .iter()
            .map(|c| ColumnDef::new(c.name.clone(), c.data_type))
            .collect();
        let table = TableDef::new(self.name.clone(), columns, self.partition.clone());
        self.catalog.create_table(ctx, table)?;
        self.catalog.persist()
    }
}

/* *** Show Tables *** */

pub struct ShowTablesOperator {
    catalog: Arc<Catalog>,
    rows: VecDeque<RowResult>,
}

impl ShowTablesOperator {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            rows: VecDeque::new(),
        }
    }

    fn open(&mut self, _ctx: &QueryContext) -> Result<()> {
        let mut tables = self.catalog.get_tables();
        tables.sort_by(|a, b| a.name.cmp(&b.name));
        self.rows = tables
            .into_iter()
            .map(|table| {
                let mut record = Record::new();
                record.insert("table", Value::String(table.name));
                RowResult::new(record)
            })
            .collect();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::MemoryIndexStore;
    use crate::sql::parser::parse;
    use crate::sql::planner::logical;
    use crate::sql::planner::physical;
    use crate::sql::resolver::resolve;

    fn fixture() -> (tempfile::TempDir, Arc<Catalog>, Arc<MemoryIndexStore>) {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Arc::new(Catalog::new(dir.path()));
        let ctx = QueryContext::new();
        catalog
            .create_table(
                &ctx,
                TableDef::new(
                    "t1",
                    vec![
                        ColumnDef::new("c1", DataType::Keyword),
                        ColumnDef::new("c2", DataType::Text),
                        ColumnDef::new("c3", DataType::Integer),
                        ColumnDef::new("c4", DataType::Float),
                    ],
                    None,
                ),
            )
            .unwrap();

        let store = Arc::new(MemoryIndexStore::new());
        let table = catalog.get_table("t1").unwrap();
        for i in 0..4i64 {
            store
                .insert(
                    &table,
                    &[
                        ("c1", Value::String(format!("k{}", i))),
                        ("c2", Value::String(format!("row number {}", i))),
                        ("c3", Value::Int(i)),
                        ("c4", Value::Float(i as f64 + 0.5)),
                    ],
                )
                .unwrap();
        }
        (dir, catalog, store)
    }

    fn operator_for(
        input: &str,
        catalog: &Arc<Catalog>,
        store: &Arc<MemoryIndexStore>,
    ) -> PhysicalOperator {
        let mut stmt = parse(input).unwrap();
        resolve(catalog, &mut stmt).unwrap();
        let plan = logical::build(stmt).unwrap();
        let index: Arc<dyn IndexStore> = store.clone();
        physical::lower(plan, catalog, &index).unwrap()
    }

    #[test]
    fn scan_emits_one_result_per_hit_then_closes() {
        let (_dir, catalog, store) = fixture();
        let ctx = QueryContext::new();
        let mut root = operator_for("SELECT * FROM t1", &catalog, &store);
        let rows = run(&mut root, &ctx).unwrap();
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| r.bytes_read > 0));
        // drained stays drained
        assert!(root.next(&ctx).unwrap().is_none());
    }

    #[test]
    fn filter_drops_non_matching_rows_in_order() {
        let (_dir, catalog, store) = fixture();
        let ctx = QueryContext::new();
        let mut root = operator_for("SELECT c3 FROM t1 WHERE c3 >= 2", &catalog, &store);
        let rows = run(&mut root, &ctx).unwrap();
        let values: Vec<i64> = rows
            .iter()
            .map(|r| r.record.get("c3").unwrap().to_int())
            .collect();
        assert_eq!(values, vec![2, 3]);
    }

    #[test]
    fn limit_emits_at_most_n_and_closes() {
        let (_dir, catalog, store) = fixture();
        let ctx = QueryContext::new();
        let mut root = operator_for("SELECT c1 FROM t1 LIMIT 2", &catalog, &store);
        let rows = run(&mut root, &ctx).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(root.next(&ctx).unwrap().is_none());

        let mut zero = operator_for("SELECT c1 FROM t1 LIMIT 0", &catalog, &store);
        assert!(run(&mut zero, &ctx).unwrap().is_empty());
    }

    #[test]
    fn project_prunes_to_listed_columns() {
        let (_dir, catalog, store) = fixture();
        let ctx = QueryContext::new();
        let mut root = operator_for("SELECT c1, c3 FROM t1 WHERE c3 = 1", &catalog, &store);
        let rows = run(&mut root, &ctx).unwrap();
        assert_eq!(rows.len(), 1);
        let record = &rows[0].record;
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("c1"), Some(&Value::String("k1".into())));
        assert_eq!(record.get("c3"), Some(&Value::Int(1)));
    }

    #[test]
    fn non_column_projections_pass_rows_through() {
        let (_dir, catalog, store) = fixture();
        let ctx = QueryContext::new();
        let mut root = operator_for("SELECT c3 + 1 FROM t1 LIMIT 1", &catalog, &store);
        let rows = run(&mut root, &ctx).unwrap();
        assert_eq!(rows[0].record.len(), 4);
    }

    #[test]
    fn row_level_eval_errors_ride_the_stream() {
        let (_dir, catalog, store) = fixture();
        let ctx = QueryContext::new();
        // c3 = 0 divides by zero on the first row only
        let mut root = operator_for("SELECT c1 FROM t1 WHERE 1 / c3 = 1", &catalog, &store);
        let rows = run(&mut root, &ctx).unwrap();
        let errored: Vec<_> = rows.iter().filter(|r| r.error.is_some()).collect();
        assert_eq!(errored.len(), 1);
        assert!(matches!(
            errored[0].error.as_ref().unwrap(),
            Error::DivisionByZero
        ));
        // the matching row (c3 = 1) still came through cleanly
        assert!(rows
            .iter()
            .any(|r| r.error.is_none() && r.record.get("c1") == Some(&Value::String("k1".into()))));
    }

    #[test]
    fn cancellation_stops_the_drain() {
        let (_dir, catalog, store) = fixture();
        let ctx = QueryContext::new();
        let mut root = operator_for("SELECT c1 FROM t1", &catalog, &store);
        root.open(&ctx).unwrap();
        assert!(root.next(&ctx).unwrap().is_some());
        ctx.cancel();
        assert!(matches!(root.next(&ctx), Err(Error::Cancelled)));
    }

    #[test]
    fn create_registers_and_persists() {
        let (_dir, catalog, store) = fixture();
        let ctx = QueryContext::new();
        let mut root = operator_for(
            "CREATE TABLE t2 (name KEYWORD, at DATETIME) PARTITION BY name",
            &catalog,
            &store,
        );
        let rows = run(&mut root, &ctx).unwrap();
        assert!(rows.is_empty());
        let created = catalog.get_table("t2").unwrap();
        assert_eq!(created.partition.as_deref(), Some("name"));

        let reopened = Catalog::new(catalog.directory());
        reopened.open().unwrap();
        assert!(reopened.get_table("t2").is_ok());
    }

    #[test]
    fn show_tables_emits_one_record_per_table() {
        let (_dir, catalog, store) = fixture();
        let ctx = QueryContext::new();
        let mut create = operator_for("CREATE TABLE a_first (x KEYWORD)", &catalog, &store);
        run(&mut create, &ctx).unwrap();

        let mut root = operator_for("SHOW TABLES", &catalog, &store);
        let rows = run(&mut root, &ctx).unwrap();
        let names: Vec<String> = rows
            .iter()
            .map(|r| r.record.get("table").unwrap().to_text())
            .collect();
        assert_eq!(names, vec!["a_first".to_string(), "t1".to_string()]);
    }
}
