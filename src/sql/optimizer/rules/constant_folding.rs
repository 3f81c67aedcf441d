//! # Constant Folding Rule
//!
//! Evaluates constant arithmetic at plan time, over projection expressions
//! and the filter predicate.
//!
//! | Before | After |
//! |--------|-------|
//! | `1 + 2 * 3` | `7` |
//! | `10 / 4` | `2` (both sides integral) |
//! | `10 / 4.0` | `2.5` |
//! | `1 / 0` | plan-time division-by-zero error |
//!
//! A binary node folds only when both operands are literals and the operator
//! is arithmetic. The integer path applies when both literals coerce to
//! integers (float literals never do); otherwise both sides are taken as
//! floats, with unparseable strings defaulting to zero. Comparisons,
//! AND/OR/NOT, and LIKE are left for the runtime evaluator; unary minus
//! propagates unchanged. Explicit parentheses around a folded subtree are
//! dropped along the way.

use crate::error::{Error, Result};
use crate::sql::ast::{BinaryOp, Expr};
use crate::sql::optimizer::OptimizationRule;
use crate::sql::planner::LogicalNode;

pub struct ConstantFoldingRule;

impl OptimizationRule for ConstantFoldingRule {
    fn name(&self) -> &'static str {
        "constant_folding"
    }

    fn apply(&self, plan: LogicalNode) -> Result<LogicalNode> {
        fold_plan(plan)
    }
}

fn fold_plan(plan: LogicalNode) -> Result<LogicalNode> {
    match plan {
        LogicalNode::Project { projections, input } => {
            let projections = projections
                .into_iter()
                .map(fold_expr)
                .collect::<Result<Vec<_>>>()?;
            let input = match input {
                Some(input) => Some(Box::new(fold_plan(*input)?)),
                None => None,
            };
            Ok(LogicalNode::Project { projections, input })
        }
        LogicalNode::Limit { limit, input } => Ok(LogicalNode::Limit {
            limit,
            input: Box::new(fold_plan(*input)?),
        }),
        LogicalNode::Filter { predicate, input } => Ok(LogicalNode::Filter {
            predicate: fold_expr(predicate)?,
            input: Box::new(fold_plan(*input)?),
        }),
        leaf @ (LogicalNode::Relation { .. }
        | LogicalNode::TableDecl { .. }
        | LogicalNode::ShowTables) => Ok(leaf),
    }
}

fn fold_expr(expr: Expr) -> Result<Expr> {
    match expr {
        Expr::Binary { op, left, right } => {
            let left = fold_expr(*left)?;
            let right = fold_expr(*right)?;

            if op.is_arithmetic() && left.is_literal() && right.is_literal() {
                return fold_arithmetic(op, &left, &right);
            }
            Ok(Expr::binary(op, left, right))
        }
        Expr::Paren(inner) => fold_expr(*inner),
        other => Ok(other),
    }
}

fn fold_arithmetic(op: BinaryOp, left: &Expr, right: &Expr) -> Result<Expr> {
    if left.can_int() && right.can_int() {
        let (a, b) = (left.to_int(), right.to_int());
        if matches!(op, BinaryOp::Div | BinaryOp::Mod) && b == 0 {
            return Err(Error::DivisionByZero);
        }
        let folded = match op {
            BinaryOp::Add => a.wrapping_add(b),
            BinaryOp::Sub => a.wrapping_sub(b),
            BinaryOp::Mul => a.wrapping_mul(b),
            BinaryOp::Div => a.wrapping_div(b),
            BinaryOp::Mod => a.wrapping_rem(b),
            _ => unreachable!("arithmetic operators are exhaustive"),
        };
        return Ok(Expr::Integer(folded));
    }

    let (a, b) = (left.to_float(), right.to_float());
    if matches!(op, BinaryOp::Div | BinaryOp::Mod) && b == 0.0 {
        return Err(Error::DivisionByZero);
    }
    let folded = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        BinaryOp::Mod => a % b,
        _ => unreachable!("arithmetic operators are exhaustive"),
    };
    Ok(Expr::Float(folded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::ast::Statement;
    use crate::sql::parser::parse;

    fn fold(input: &str) -> Result<Expr> {
        let Statement::Select(select) = parse(&format!("SELECT {}", input)).unwrap() else {
            panic!("expected select");
        };
        fold_expr(select.projections.into_iter().next().unwrap())
    }

    #[test]
    fn folds_integer_arithmetic() {
        assert_eq!(fold("1 + 2 * 3").unwrap(), Expr::Integer(7));
        assert_eq!(fold("10 - 4 - 3").unwrap(), Expr::Integer(3));
        assert_eq!(fold("7 % 3").unwrap(), Expr::Integer(1));
        assert_eq!(fold("7 / 2").unwrap(), Expr::Integer(3));
    }

    #[test]
    fn folds_float_arithmetic() {
        assert_eq!(fold("1.5 + 1").unwrap(), Expr::Float(2.5));
        assert_eq!(fold("5 / 2.0").unwrap(), Expr::Float(2.5));
        assert_eq!(fold("5.5 % 2.0").unwrap(), Expr::Float(1.5));
    }

    #[test]
    fn float_literals_never_fold_as_integers() {
        assert_eq!(fold("4.0 * 2").unwrap(), Expr::Float(8.0));
    }

    #[test]
    fn numeric_strings_fold_with_string_rules() {
        assert_eq!(fold("\"1\" + \"2\"").unwrap(), Expr::Integer(3));
        assert_eq!(fold("\"1.5\" + 1").unwrap(), Expr::Float(2.5));
        // unparseable strings default to zero in the float path
        assert_eq!(fold("\"pie\" + 1").unwrap(), Expr::Float(1.0));
    }

    #[test]
    fn division_by_zero_fails_at_plan_time() {
        assert!(matches!(fold("1 / 0"), Err(Error::DivisionByZero)));
        assert!(matches!(fold("1 % 0"), Err(Error::DivisionByZero)));
        assert!(matches!(fold("1.0 / 0"), Err(Error::DivisionByZero)));
    }

    #[test]
    fn parens_fold_away_around_constants() {
        assert_eq!(fold("(1 + 2) * 3").unwrap(), Expr::Integer(9));
    }

    #[test]
    fn comparisons_and_booleans_are_not_folded() {
        assert!(matches!(
            fold("1 = 1").unwrap(),
            Expr::Binary { op: BinaryOp::Eq, .. }
        ));
        assert!(matches!(
            fold("1 AND 0").unwrap(),
            Expr::Binary { op: BinaryOp::And, .. }
        ));
        assert!(matches!(fold("NOT 1").unwrap(), Expr::Not(_)));
    }

    #[test]
    fn non_literal_operands_rebuild_with_folded_children() {
        let folded = fold("c1 + 2 * 3").unwrap();
        let Expr::Binary { op, left, right } = folded else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Add);
        assert!(matches!(*left, Expr::Column(_)));
        assert_eq!(*right, Expr::Integer(6));
    }

    #[test]
    fn unary_minus_propagates_unchanged() {
        let folded = fold("-(1 + 2)").unwrap();
        assert!(matches!(folded, Expr::Neg(_)));
    }

    #[test]
    fn folding_is_idempotent_per_expression() {
        let once = fold("1 + 2 * c1 + (3 * 4)").unwrap();
        let twice = fold_expr(once.clone()).unwrap();
        assert_eq!(once, twice);
    }
}
