//! # Predicate Evaluator
//!
//! A post-order stack machine over [`Value`]. Literals and column lookups
//! push; operators pop their operands and push the result. Evaluating a
//! top-level expression must leave exactly one value on the stack; anything
//! else is a fatal evaluator bug, not a row error.
//!
//! Operator classes:
//!
//! - **Comparison**: both strings: lexicographic; both `can_int`: i64;
//!   otherwise f64.
//! - **Arithmetic**: both `can_int`: i64 (modulo included); otherwise f64.
//!   A zero divisor under `/` or `%` is [`Error::DivisionByZero`].
//! - **AND / OR**: truthiness of both sides.
//! - **LIKE**: right operand must be a string pattern; `%` matches any run,
//!   `_` exactly one character, backslash escapes the next character.

use super::ast::{BinaryOp, Expr};
use crate::error::{Error, Result};
use crate::record::Record;
use crate::types::Value;
use smallvec::SmallVec;
use std::cmp::Ordering;

#[derive(Debug, Default)]
pub struct Evaluator {
    stack: SmallVec<[Value; 8]>,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluates `expr` against one row. The stack is reset on entry, so an
    /// evaluator instance can be reused row after row.
    pub fn evaluate(&mut self, expr: &Expr, record: &Record) -> Result<Value> {
        self.stack.clear();
        self.eval(expr, record)?;
        if self.stack.len() != 1 {
            return Err(Error::Eval(format!(
                "expression left {} values on the stack",
                self.stack.len()
            )));
        }
        self.pop()
    }

    fn eval(&mut self, expr: &Expr, record: &Record) -> Result<()> {
        match expr {
            Expr::Integer(i) => self.stack.push(Value::Int(*i)),
            Expr::Float(f) => self.stack.push(Value::Float(*f)),
            Expr::String(s) => self.stack.push(Value::String(s.clone())),
            Expr::Asterisk => {
                return Err(Error::Eval("cannot evaluate '*' as a value".to_string()))
            }
            Expr::Column(column) => {
                let value = record.get(&column.name).ok_or_else(|| {
                    Error::Eval(format!("no value for column '{}' in row", column.name))
                })?;
                self.stack.push(value.clone());
            }
            Expr::Paren(inner) => self.eval(inner, record)?,
            Expr::Neg(inner) => {
                self.eval(inner, record)?;
                let value = self.pop()?;
                let negated = match value {
                    Value::Int(i) => Value::Int(-i),
                    Value::Float(f) => Value::Float(-f),
                    other => {
                        return Err(Error::Eval(format!(
                            "unary minus requires a numeric operand, got {}",
                            other.kind()
                        )))
                    }
                };
                self.stack.push(negated);
            }
            Expr::Not(inner) => {
                self.eval(inner, record)?;
                let value = self.pop()?;
                self.stack.push(Value::Bool(!value.to_bool()));
            }
            Expr::Binary { op, left, right } => {
                self.eval(left, record)?;
                self.eval(right, record)?;
                let r = self.pop()?;
                let l = self.pop()?;
                let result = apply_binary(*op, l, r)?;
                self.stack.push(result);
            }
        }
        Ok(())
    }

    fn pop(&mut self) -> Result<Value> {
        self.stack
            .pop()
            .ok_or_else(|| Error::Eval("empty value stack".to_string()))
    }
}

fn apply_binary(op: BinaryOp, l: Value, r: Value) -> Result<Value> {
    match op {
        _ if op.is_comparison() => Ok(Value::Bool(compare(&l, &r, op))),
        _ if op.is_arithmetic() => arithmetic(&l, &r, op),
        BinaryOp::And => Ok(Value::Bool(l.to_bool() && r.to_bool())),
        BinaryOp::Or => Ok(Value::Bool(l.to_bool() || r.to_bool())),
        BinaryOp::Like => {
            let Some(pattern) = r.as_str() else {
                return Err(Error::Eval(format!(
                    "LIKE pattern must be a string, got {}",
                    r.kind()
                )));
            };
            Ok(Value::Bool(like_match(&l.to_text(), pattern)))
        }
        _ => unreachable!("binary operator classes are exhaustive"),
    }
}

fn compare(l: &Value, r: &Value, op: BinaryOp) -> bool {
    let ordering = match (l.as_str(), r.as_str()) {
        (Some(a), Some(b)) => Some(a.cmp(b)),
        _ if l.can_int() && r.can_int() => Some(l.to_int().cmp(&r.to_int())),
        _ => l.to_float().partial_cmp(&r.to_float()),
    };

    match ordering {
        Some(Ordering::Less) => matches!(op, BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::NotEq),
        Some(Ordering::Equal) => matches!(op, BinaryOp::Eq | BinaryOp::LtEq | BinaryOp::GtEq),
        Some(Ordering::Greater) => matches!(op, BinaryOp::Gt | BinaryOp::GtEq | BinaryOp::NotEq),
        // NaN on either side: nothing holds except inequality
        None => matches!(op, BinaryOp::NotEq),
    }
}

fn arithmetic(l: &Value, r: &Value, op: BinaryOp) -> Result<Value> {
    if l.can_int() && r.can_int() {
        let (a, b) = (l.to_int(), r.to_int());
        if matches!(op, BinaryOp::Div | BinaryOp::Mod) && b == 0 {
            return Err(Error::DivisionByZero);
        }
        let result = match op {
            BinaryOp::Add => a.wrapping_add(b),
            BinaryOp::Sub => a.wrapping_sub(b),
            BinaryOp::Mul => a.wrapping_mul(b),
            BinaryOp::Div => a.wrapping_div(b),
            BinaryOp::Mod => a.wrapping_rem(b),
            _ => unreachable!("arithmetic operators are exhaustive"),
        };
        return Ok(Value::Int(result));
    }

    let (a, b) = (l.to_float(), r.to_float());
    if matches!(op, BinaryOp::Div | BinaryOp::Mod) && b == 0.0 {
        return Err(Error::DivisionByZero);
    }
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        BinaryOp::Mod => a % b,
        _ => unreachable!("arithmetic operators are exhaustive"),
    };
    Ok(Value::Float(result))
}

/// SQL LIKE matching: `%` matches zero or more characters, `_` exactly one,
/// and backslash escapes the following character.
pub fn like_match(text: &str, pattern: &str) -> bool {
    #[derive(Clone, Copy, PartialEq)]
    enum Atom {
        Any,
        One,
        Literal(char),
    }

    let mut atoms = Vec::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '%' => atoms.push(Atom::Any),
            '_' => atoms.push(Atom::One),
            '\\' => match chars.next() {
                Some(escaped) => atoms.push(Atom::Literal(escaped)),
                None => atoms.push(Atom::Literal('\\')),
            },
            other => atoms.push(Atom::Literal(other)),
        }
    }

    let text: Vec<char> = text.chars().collect();

    // Classic two-pointer wildcard match with backtracking to the most
    // recent '%'.
    let (mut t, mut p) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < atoms.len()
            && (atoms[p] == Atom::One || atoms[p] == Atom::Literal(text[t]))
        {
            t += 1;
            p += 1;
        } else if p < atoms.len() && atoms[p] == Atom::Any {
            star = Some((p, t));
            p += 1;
        } else if let Some((star_p, star_t)) = star {
            p = star_p + 1;
            t = star_t + 1;
            star = Some((star_p, star_t + 1));
        } else {
            return false;
        }
    }

    while p < atoms.len() && atoms[p] == Atom::Any {
        p += 1;
    }
    p == atoms.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::parser::parse;
    use crate::sql::ast::Statement;

    fn eval(input: &str, record: &Record) -> Result<Value> {
        let Statement::Select(select) = parse(&format!("SELECT {}", input)).unwrap() else {
            panic!("expected select");
        };
        Evaluator::new().evaluate(&select.projections[0], record)
    }

    fn row() -> Record {
        let mut record = Record::new();
        record.insert("c1", Value::String("a".into()));
        record.insert("c2", Value::String("apple pie".into()));
        record.insert("c3", Value::Int(5));
        record.insert("c4", Value::Float(1.5));
        record
    }

    #[test]
    fn arithmetic_stays_integral_when_both_sides_can_int() {
        assert_eq!(eval("1 + 2 * 3", &row()).unwrap(), Value::Int(7));
        assert_eq!(eval("7 % 3", &row()).unwrap(), Value::Int(1));
        assert_eq!(eval("7 / 2", &row()).unwrap(), Value::Int(3));
    }

    #[test]
    fn arithmetic_widens_to_float() {
        assert_eq!(eval("1 + 0.5", &row()).unwrap(), Value::Float(1.5));
        assert_eq!(eval("c4 * 2", &row()).unwrap(), Value::Float(3.0));
    }

    #[test]
    fn division_by_zero_is_an_error() {
        assert!(matches!(eval("1 / 0", &row()), Err(Error::DivisionByZero)));
        assert!(matches!(eval("1 % 0", &row()), Err(Error::DivisionByZero)));
        assert!(matches!(
            eval("1.5 / 0", &row()),
            Err(Error::DivisionByZero)
        ));
    }

    #[test]
    fn comparison_between_strings_is_lexicographic() {
        assert_eq!(eval("c1 < \"b\"", &row()).unwrap(), Value::Bool(true));
        assert_eq!(eval("\"z\" = \"z\"", &row()).unwrap(), Value::Bool(true));
    }

    #[test]
    fn comparison_coerces_numeric_strings_to_int() {
        assert_eq!(eval("\"5\" = c3", &row()).unwrap(), Value::Bool(true));
        assert_eq!(eval("\"6\" = c3", &row()).unwrap(), Value::Bool(false));
        assert_eq!(eval("\"4\" < c3", &row()).unwrap(), Value::Bool(true));
    }

    #[test]
    fn comparison_falls_back_to_float() {
        assert_eq!(eval("c4 > 1", &row()).unwrap(), Value::Bool(true));
        assert_eq!(eval("\"1.4\" < c4", &row()).unwrap(), Value::Bool(true));
    }

    #[test]
    fn logical_operators_use_truthiness() {
        assert_eq!(eval("1 AND 2", &row()).unwrap(), Value::Bool(true));
        assert_eq!(eval("1 AND 0", &row()).unwrap(), Value::Bool(false));
        assert_eq!(eval("0 OR 3", &row()).unwrap(), Value::Bool(true));
        assert_eq!(eval("NOT 0", &row()).unwrap(), Value::Bool(true));
        assert_eq!(eval("NOT c3", &row()).unwrap(), Value::Bool(false));
    }

    #[test]
    fn unary_minus_requires_numbers() {
        assert_eq!(eval("-c3", &row()).unwrap(), Value::Int(-5));
        assert_eq!(eval("-c4", &row()).unwrap(), Value::Float(-1.5));
        assert!(matches!(eval("-c1", &row()), Err(Error::Eval(_))));
    }

    #[test]
    fn missing_column_is_fatal() {
        let empty = Record::new();
        assert!(matches!(eval("c3 = 1", &empty), Err(Error::Eval(_))));
    }

    #[test]
    fn like_requires_string_pattern() {
        assert!(matches!(eval("c2 LIKE 5", &row()), Err(Error::Eval(_))));
    }

    #[test]
    fn like_matches_through_coercion() {
        assert_eq!(
            eval("c2 LIKE \"%apple%\"", &row()).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(eval("c3 LIKE \"5\"", &row()).unwrap(), Value::Bool(true));
    }

    #[test]
    fn evaluation_leaves_one_value_for_nested_expressions() {
        let mut evaluator = Evaluator::new();
        let Statement::Select(select) =
            parse("SELECT ((1 + 2) * (3 - 4)) / 5 + c3 % 2").unwrap()
        else {
            panic!("expected select");
        };
        for _ in 0..3 {
            let value = evaluator.evaluate(&select.projections[0], &row()).unwrap();
            assert_eq!(value, Value::Int(1));
        }
    }

    #[test]
    fn like_wildcards() {
        assert!(like_match("apple pie", "%apple%"));
        assert!(like_match("apple pie", "apple%"));
        assert!(like_match("apple pie", "%pie"));
        assert!(like_match("apple pie", "apple_pie"));
        assert!(!like_match("apple pie", "apple"));
        assert!(!like_match("apple", "apple_"));
        assert!(like_match("", "%"));
        assert!(!like_match("", "_"));
    }

    #[test]
    fn like_backslash_escapes_wildcards() {
        assert!(like_match("50%", "50\\%"));
        assert!(!like_match("500", "50\\%"));
        assert!(like_match("a_b", "a\\_b"));
        assert!(!like_match("axb", "a\\_b"));
        assert!(like_match("a\\b", "a\\\\b"));
    }

    #[test]
    fn like_backtracks_across_multiple_wildcards() {
        assert!(like_match("abcXdefYghi", "%X%Y%"));
        assert!(like_match("aaab", "%a_b"));
        assert!(!like_match("abcXdef", "%X%Y%"));
    }
}
