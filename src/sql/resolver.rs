//! # Symbol Resolver
//!
//! Two passes over the AST.
//!
//! **Pass 1 (tables).** Looks the `FROM` table up in the catalog, inserts a
//! table-scope entry (all columns, declaration order) into the symbol table,
//! and annotates the table node.
//!
//! **Pass 2 (columns).** Expands a sole `*` projection into one column
//! identifier per in-scope column, then resolves every column identifier by
//! searching the in-scope tables; the first match wins. For CREATE TABLE, a
//! partition clause must name one of the declared columns
//! (case-insensitively).
//!
//! After a successful resolution, every column identifier reachable from the
//! root carries a symbol.

use super::ast::{CreateTableStatement, Expr, SelectStatement, Statement};
use crate::error::{Error, Result};
use crate::schema::Catalog;
use crate::types::DataType;
use hashbrown::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSymbol {
    pub table: String,
    pub columns: Vec<ColumnSymbol>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSymbol {
    pub table: String,
    pub column: String,
    pub data_type: DataType,
}

/// In-scope names collected by pass 1 and read by everything after.
#[derive(Debug, Default)]
pub struct SymbolTable {
    tables: HashMap<String, TableSymbol>,
    // insertion order; `*` expands in the order tables came into scope
    order: Vec<String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: TableSymbol) {
        if !self.tables.contains_key(&symbol.table) {
            self.order.push(symbol.table.clone());
            self.tables.insert(symbol.table.clone(), symbol);
        }
    }

    pub fn get(&self, table: &str) -> Option<&TableSymbol> {
        self.tables.get(table)
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableSymbol> {
        self.order.iter().filter_map(|name| self.tables.get(name))
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    /// Finds the first in-scope column with this name.
    pub fn resolve_column(&self, name: &str) -> Option<&ColumnSymbol> {
        self.tables()
            .flat_map(|t| t.columns.iter())
            .find(|c| c.column == name)
    }
}

/// Runs both passes, annotating `stmt` in place.
pub fn resolve(catalog: &Catalog, stmt: &mut Statement) -> Result<SymbolTable> {
    let mut symbols = SymbolTable::new();
    resolve_tables(catalog, stmt, &mut symbols)?;
    resolve_columns(stmt, &symbols)?;
    Ok(symbols)
}

fn resolve_tables(catalog: &Catalog, stmt: &mut Statement, symbols: &mut SymbolTable) -> Result<()> {
    let Statement::Select(select) = stmt else {
        return Ok(());
    };
    let Some(table_ref) = select.table.as_mut() else {
        return Ok(());
    };

    let table = catalog.get_table(&table_ref.name)?;
    let columns = table
        .columns
        .iter()
        .map(|c| ColumnSymbol {
            table: table.name.clone(),
            column: c.name.clone(),
            data_type: c.data_type,
        })
        .collect();

    let symbol = TableSymbol {
        table: table.name.clone(),
        columns,
    };
    table_ref.symbol = Some(symbol.clone());
    symbols.insert(symbol);
    Ok(())
}

fn resolve_columns(stmt: &mut Statement, symbols: &SymbolTable) -> Result<()> {
    match stmt {
        Statement::Select(select) => resolve_select_columns(select, symbols),
        Statement::CreateTable(create) => validate_partition(create),
        Statement::ShowTables => Ok(()),
    }
}

fn resolve_select_columns(select: &mut SelectStatement, symbols: &SymbolTable) -> Result<()> {
    if let [Expr::Asterisk] = select.projections.as_slice() {
        select.projections = symbols
            .tables()
            .flat_map(|t| t.columns.iter())
            .map(|c| Expr::Column(super::ast::ColumnRef::new(c.column.clone())))
            .collect();
    }

    for projection in &mut select.projections {
        resolve_expr(projection, symbols)?;
    }
    if let Some(predicate) = select.predicate.as_mut() {
        resolve_expr(predicate, symbols)?;
    }
    Ok(())
}

fn resolve_expr(expr: &mut Expr, symbols: &SymbolTable) -> Result<()> {
    match expr {
        Expr::Column(column) => {
            let symbol = symbols
                .resolve_column(&column.name)
                .ok_or_else(|| Error::NoSuchColumn(column.name.clone()))?;
            column.symbol = Some(symbol.clone());
            Ok(())
        }
        Expr::Paren(inner) | Expr::Neg(inner) | Expr::Not(inner) => resolve_expr(inner, symbols),
        Expr::Binary { left, right, .. } => {
            resolve_expr(left, symbols)?;
            resolve_expr(right, symbols)
        }
        Expr::Integer(_) | Expr::Float(_) | Expr::String(_) | Expr::Asterisk => Ok(()),
    }
}

fn validate_partition(create: &CreateTableStatement) -> Result<()> {
    let Some(partition) = create.partition.as_deref() else {
        return Ok(());
    };
    let found = create
        .columns
        .iter()
        .any(|c| c.name.eq_ignore_ascii_case(partition));
    if found {
        Ok(())
    } else {
        Err(Error::InvalidPartition(partition.to_string()))
    }
}
