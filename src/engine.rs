//! # Query Entry Point
//!
//! [`Engine`] owns handles to the catalog and the index store and runs one
//! statement end-to-end: lex → parse → resolve → logical plan → optimize →
//! lower → stream. Each call gets a fresh query id, carried by the
//! [`QueryContext`] through log spans and operator opens.

use crate::error::Result;
use crate::index::IndexStore;
use crate::record::Record;
use crate::schema::Catalog;
use crate::sql::context::QueryContext;
use crate::sql::executor;
use crate::sql::lexer::tokenize;
use crate::sql::optimizer;
use crate::sql::parser::Parser;
use crate::sql::planner::{logical, physical};
use crate::sql::resolver::resolve;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, info_span, warn};

pub struct Engine {
    catalog: Arc<Catalog>,
    index: Arc<dyn IndexStore>,
}

/// Outcome of one statement: wall-clock duration and the surviving records.
/// Rows that carried a row-level error are logged and excluded.
#[derive(Debug)]
pub struct QueryResult {
    pub duration: Duration,
    pub records: Vec<Record>,
}

impl Engine {
    pub fn new(catalog: Arc<Catalog>, index: Arc<dyn IndexStore>) -> Self {
        Self { catalog, index }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Runs one statement under a fresh context.
    pub fn execute(&self, query: &str) -> Result<QueryResult> {
        self.execute_with(&QueryContext::new(), query)
    }

    /// Runs one statement under the caller's context, which supplies the
    /// cancellation token.
    pub fn execute_with(&self, ctx: &QueryContext, query: &str) -> Result<QueryResult> {
        let start = Instant::now();
        let span = info_span!("query.execute", query_id = %ctx.query_id());
        let _guard = span.enter();
        info!(query, "executing query");

        let tokens = tokenize(query)?;
        let mut stmt = Parser::new(tokens).parse()?;
        let symbols = resolve(&self.catalog, &mut stmt)?;

        let plan = logical::build(stmt)?;
        let plan = optimizer::optimize(plan)?;
        let mut root = physical::lower(plan, &self.catalog, &self.index)?;

        let rows = executor::run(&mut root, ctx)?;
        info!(
            tables = ?symbols.table_names(),
            rows = rows.len(),
            "query finished"
        );

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            match row.error {
                Some(err) => warn!(%err, record = %row.record, "row-level failure"),
                None => records.push(row.record),
            }
        }

        Ok(QueryResult {
            duration: start.elapsed(),
            records,
        })
    }
}
