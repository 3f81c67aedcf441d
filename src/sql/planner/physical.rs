//! Lowering: logical tree → streaming operators.
//!
//! A post-order traversal; each logical node maps onto exactly one operator:
//!
//! | Logical | Physical |
//! |---|---|
//! | `Relation` | [`ScanOperator`] |
//! | `Filter` | [`FilterOperator`] |
//! | `Limit` | [`LimitOperator`] |
//! | `Project` | [`ProjectOperator`] |
//! | `TableDecl` | [`CreateOperator`] |
//! | `ShowTables` | [`ShowTablesOperator`] |

use super::logical::LogicalNode;
use crate::error::Result;
use crate::index::IndexStore;
use crate::schema::Catalog;
use crate::sql::executor::{
    CreateOperator, FilterOperator, LimitOperator, PhysicalOperator, ProjectOperator,
    ScanOperator, ShowTablesOperator,
};
use std::sync::Arc;

pub fn lower(
    plan: LogicalNode,
    catalog: &Arc<Catalog>,
    index: &Arc<dyn IndexStore>,
) -> Result<PhysicalOperator> {
    match plan {
        LogicalNode::Relation { table } => {
            let table = catalog.get_table(&table)?;
            Ok(PhysicalOperator::Scan(ScanOperator::new(
                index.clone(),
                table,
            )))
        }
        LogicalNode::Filter { predicate, input } => {
            let child = lower(*input, catalog, index)?;
            Ok(PhysicalOperator::Filter(FilterOperator::new(
                predicate, child,
            )))
        }
        LogicalNode::Limit { limit, input } => {
            let child = lower(*input, catalog, index)?;
            Ok(PhysicalOperator::Limit(LimitOperator::new(limit, child)))
        }
        LogicalNode::Project { projections, input } => {
            let child = match input {
                Some(input) => Some(lower(*input, catalog, index)?),
                None => None,
            };
            Ok(PhysicalOperator::Project(ProjectOperator::new(
                &projections,
                child,
            )))
        }
        LogicalNode::TableDecl {
            name,
            columns,
            partition,
        } => Ok(PhysicalOperator::Create(CreateOperator::new(
            catalog.clone(),
            name,
            columns,
            partition,
        ))),
        LogicalNode::ShowTables => Ok(PhysicalOperator::ShowTables(ShowTablesOperator::new(
            catalog.clone(),
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::index::MemoryIndexStore;
    use crate::schema::{ColumnDef, TableDef};
    use crate::sql::context::QueryContext;
    use crate::sql::parser::parse;
    use crate::sql::planner::logical;
    use crate::sql::resolver::resolve;
    use crate::types::DataType;

    #[test]
    fn lowering_resolves_the_scan_table() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Arc::new(Catalog::new(dir.path()));
        catalog
            .create_table(
                &QueryContext::new(),
                TableDef::new("t1", vec![ColumnDef::new("c1", DataType::Keyword)], None),
            )
            .unwrap();
        let index: Arc<dyn IndexStore> = Arc::new(MemoryIndexStore::new());

        let mut stmt = parse("SELECT c1 FROM t1 WHERE c1 = \"x\" LIMIT 3").unwrap();
        resolve(&catalog, &mut stmt).unwrap();
        let plan = logical::build(stmt).unwrap();
        let root = lower(plan, &catalog, &index).unwrap();

        // Project → Limit → Filter → Scan
        let PhysicalOperator::Project(_) = &root else {
            panic!("expected project at the root");
        };
    }

    #[test]
    fn lowering_fails_for_vanished_tables() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Arc::new(Catalog::new(dir.path()));
        let index: Arc<dyn IndexStore> = Arc::new(MemoryIndexStore::new());

        let plan = LogicalNode::Project {
            projections: Vec::new(),
            input: Some(Box::new(LogicalNode::Relation {
                table: "ghost".to_string(),
            })),
        };
        assert!(matches!(
            lower(plan, &catalog, &index),
            Err(Error::NoSuchTable(_))
        ));
    }
}
