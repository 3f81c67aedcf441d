//! # Optimizer
//!
//! Rule-based rewrites over the logical plan. Rules run in order; each takes
//! the plan and returns the rewritten plan. Plans that do not bottom out in
//! a real scan (DDL, SHOW) skip optimization entirely.

pub mod rules;

use crate::error::Result;
use crate::sql::planner::LogicalNode;
use rules::constant_folding::ConstantFoldingRule;
use tracing::debug;

pub trait OptimizationRule {
    fn name(&self) -> &'static str;
    fn apply(&self, plan: LogicalNode) -> Result<LogicalNode>;
}

pub fn optimize(mut plan: LogicalNode) -> Result<LogicalNode> {
    if matches!(
        plan.leaf(),
        LogicalNode::TableDecl { .. } | LogicalNode::ShowTables
    ) {
        return Ok(plan);
    }

    let rules: [&dyn OptimizationRule; 1] = [&ConstantFoldingRule];
    for rule in rules {
        plan = rule.apply(plan)?;
        debug!(rule = rule.name(), "optimizer rule applied");
    }
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::parser::parse;
    use crate::sql::planner::logical;

    fn plan(input: &str) -> LogicalNode {
        logical::build(parse(input).unwrap()).unwrap()
    }

    #[test]
    fn ddl_plans_are_left_alone() {
        let create = plan("CREATE TABLE t1 (c1 KEYWORD)");
        assert_eq!(optimize(create.clone()).unwrap(), create);

        let show = plan("SHOW TABLES");
        assert_eq!(optimize(show.clone()).unwrap(), show);
    }

    #[test]
    fn optimization_is_idempotent() {
        for input in [
            "SELECT 1 + 2 * 3",
            "SELECT c1 + 1 * 2 FROM t1 WHERE c1 > 2 + 3",
            "SELECT (1 + 2) * c1 FROM t1",
        ] {
            let once = optimize(plan(input)).unwrap();
            let twice = optimize(once.clone()).unwrap();
            assert_eq!(once, twice, "{}", input);
        }
    }
}
