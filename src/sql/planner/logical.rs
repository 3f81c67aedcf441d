//! Logical plan construction.
//!
//! Shapes produced from a resolved statement:
//!
//! ```text
//! SELECT ...        Project → [Limit?] → [Filter?] → Relation
//! SELECT (no FROM)  Project (no input)
//! CREATE TABLE      Project(∅) → TableDecl
//! SHOW TABLES       Project(∅) → ShowTables
//! ```

use crate::error::{Error, Result};
use crate::sql::ast::{ColumnSpec, Expr, Statement};

#[derive(Debug, Clone, PartialEq)]
pub enum LogicalNode {
    Project {
        projections: Vec<Expr>,
        input: Option<Box<LogicalNode>>,
    },
    Limit {
        limit: u64,
        input: Box<LogicalNode>,
    },
    Filter {
        predicate: Expr,
        input: Box<LogicalNode>,
    },
    Relation {
        table: String,
    },
    TableDecl {
        name: String,
        columns: Vec<ColumnSpec>,
        partition: Option<String>,
    },
    ShowTables,
}

impl LogicalNode {
    /// The single inline child, or None at the leaves.
    pub fn child(&self) -> Option<&LogicalNode> {
        match self {
            LogicalNode::Project { input, .. } => input.as_deref(),
            LogicalNode::Limit { input, .. } | LogicalNode::Filter { input, .. } => Some(input),
            LogicalNode::Relation { .. }
            | LogicalNode::TableDecl { .. }
            | LogicalNode::ShowTables => None,
        }
    }

    /// The leaf this plan bottoms out in.
    pub fn leaf(&self) -> &LogicalNode {
        let mut node = self;
        while let Some(child) = node.child() {
            node = child;
        }
        node
    }
}

/// Builds the logical tree. The statement must already be resolved.
pub fn build(stmt: Statement) -> Result<LogicalNode> {
    match stmt {
        Statement::Select(select) => {
            let table = select
                .table
                .map(|t| t.symbol.map(|s| s.table).unwrap_or(t.name));

            let mut input = table.map(|table| Box::new(LogicalNode::Relation { table }));

            if let Some(predicate) = select.predicate {
                let Some(relation) = input else {
                    return Err(Error::Plan(
                        "WHERE clause requires a FROM clause".to_string(),
                    ));
                };
                input = Some(Box::new(LogicalNode::Filter {
                    predicate,
                    input: relation,
                }));
            }

            if let Some(limit) = select.limit {
                if let Some(child) = input.take() {
                    input = Some(Box::new(LogicalNode::Limit {
                        limit,
                        input: child,
                    }));
                }
            }

            Ok(LogicalNode::Project {
                projections: select.projections,
                input,
            })
        }
        Statement::CreateTable(create) => Ok(LogicalNode::Project {
            projections: Vec::new(),
            input: Some(Box::new(LogicalNode::TableDecl {
                name: create.name,
                columns: create.columns,
                partition: create.partition,
            })),
        }),
        Statement::ShowTables => Ok(LogicalNode::Project {
            projections: Vec::new(),
            input: Some(Box::new(LogicalNode::ShowTables)),
        }),
    }
}
