//! # WrenDB - SQL Query Engine over an Inverted-Index Document Store
//!
//! WrenDB executes SQL-style statements against tables whose rows live in an
//! inverted index. A statement is lexed, parsed, resolved against a
//! persistent catalog, planned, optimized, and lowered onto a tree of
//! streaming operators that pull typed records out of the index.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │        Entry Point (Engine)          │
//! ├─────────────────────────────────────┤
//! │  Lexer → Parser → Resolver           │
//! ├─────────────────────────────────────┤
//! │  Logical Plan → Optimizer → Physical │
//! ├─────────────────────────────────────┤
//! │  Operators: Scan·Filter·Limit·Project│
//! ├──────────────────┬──────────────────┤
//! │  Catalog (JSON)  │  IndexStore       │
//! └──────────────────┴──────────────────┘
//! ```
//!
//! Data flows leaves to root: `Scan` materializes one [`Record`] per index
//! hit and each operator above it pulls, transforms, and forwards. Row-level
//! failures travel inside the stream; statement-level failures abort it.
//!
//! ## Statements
//!
//! - `SELECT` with projections, `*` expansion, `WHERE`, `LIMIT`
//! - `CREATE TABLE name (col TYPE, ...) PARTITION BY col`
//! - `SHOW TABLES`
//!
//! Column types: `KEYWORD`, `TEXT`, `INTEGER`, `FLOAT`, `DATETIME`,
//! `GEOPOINT`.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use wrendb::{Catalog, Engine, MemoryIndexStore};
//!
//! let catalog = Arc::new(Catalog::new("./data"));
//! catalog.open()?;
//! let engine = Engine::new(catalog, Arc::new(MemoryIndexStore::new()));
//!
//! engine.execute("CREATE TABLE t1 (c1 KEYWORD, c3 INTEGER)")?;
//! let result = engine.execute("SELECT c1, c3 FROM t1 WHERE c3 = 5")?;
//! for record in &result.records {
//!     println!("{}", record);
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`sql`]: lexer, parser, resolver, planner, optimizer, evaluator,
//!   operators
//! - [`schema`]: catalog service with single-blob JSON persistence
//! - [`index`]: index store service trait and the in-memory reference store
//! - [`types`]: column types and the tagged runtime value
//! - [`record`]: rows, row results, the scan hit collector
//! - [`engine`]: the `execute` entry point

pub mod engine;
pub mod error;
pub mod index;
pub mod record;
pub mod schema;
pub mod sql;
pub mod types;

pub use engine::{Engine, QueryResult};
pub use error::{Error, Result};
pub use index::{IndexStore, MemoryIndexStore, SearchRequest};
pub use record::{Record, RowResult};
pub use schema::{Catalog, ColumnDef, TableDef};
pub use sql::{CancelToken, QueryContext};
pub use types::{DataType, Value};
