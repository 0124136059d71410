//! Evaluates the `WHERE` boolean expression tree against a single row.
//!
//! A missing node/edge property, or a comparison between incompatible
//! types, never raises — it simply makes the surrounding comparison (and
//! therefore, through short-circuit `AND`/`OR`, possibly the whole
//! expression) evaluate to `false`. There is no error path through this
//! module.

use super::ast::{CompareOp, Expr, Operand, Pattern};
use super::evaluator::InternalRow;
use crate::graph::Graph;
use crate::value::{contains_ci, starts_with_ci, Value};

/// Evaluates `expr` against `row`, resolving property/edge-type operands
/// through `pattern` and `graph`.
pub(crate) fn eval(expr: &Expr, pattern: &Pattern, graph: &Graph, row: &InternalRow) -> bool {
    match expr {
        Expr::And(l, r) => eval(l, pattern, graph, row) && eval(r, pattern, graph, row),
        Expr::Or(l, r) => eval(l, pattern, graph, row) || eval(r, pattern, graph, row),
        Expr::Comparison { left, op, right } => {
            let lv = resolve(left, pattern, graph, row);
            let rv = resolve(right, pattern, graph, row);
            compare(*op, &lv, &rv)
        }
    }
}

/// Resolves a comparison operand against the current row. A node property,
/// edge property, or `type(edgeVar)` that can't be resolved yields `Null`
/// rather than an error — unresolvable operands are caught ahead of
/// evaluation by the reference-check that runs at query validation time.
pub(crate) fn resolve(operand: &Operand, pattern: &Pattern, graph: &Graph, row: &InternalRow) -> Value {
    match operand {
        Operand::Literal(lit) => lit.clone().into_value(),
        Operand::Property { variable, property } => {
            if row.is_node_variable(variable) {
                row.node_property(graph, variable, property)
            } else {
                row.edge_property(pattern, variable, property)
            }
        }
        Operand::EdgeType { variable } => row
            .edge_canonical(pattern, variable)
            .map(|e| Value::String(e.edge_type))
            .unwrap_or(Value::Null),
    }
}

fn compare(op: CompareOp, left: &Value, right: &Value) -> bool {
    if matches!(left, Value::Null) || matches!(right, Value::Null) {
        return false;
    }
    match op {
        CompareOp::Eq => left == right,
        CompareOp::Ne => left != right,
        CompareOp::Lt => left.comparable_order(right) == Some(std::cmp::Ordering::Less),
        CompareOp::Le => matches!(
            left.comparable_order(right),
            Some(std::cmp::Ordering::Less) | Some(std::cmp::Ordering::Equal)
        ),
        CompareOp::Gt => left.comparable_order(right) == Some(std::cmp::Ordering::Greater),
        CompareOp::Ge => matches!(
            left.comparable_order(right),
            Some(std::cmp::Ordering::Greater) | Some(std::cmp::Ordering::Equal)
        ),
        CompareOp::Contains => match (left.as_str(), right.as_str()) {
            (Some(haystack), Some(needle)) => contains_ci(haystack, needle),
            _ => false,
        },
        CompareOp::StartsWith => match (left.as_str(), right.as_str()) {
            (Some(haystack), Some(needle)) => starts_with_ci(haystack, needle),
            _ => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_operand_never_satisfies_a_comparison() {
        assert!(!compare(CompareOp::Eq, &Value::Null, &Value::Int(1)));
        assert!(!compare(CompareOp::Gt, &Value::Int(1), &Value::Null));
    }

    #[test]
    fn incompatible_ordering_is_false_not_an_error() {
        assert!(!compare(CompareOp::Lt, &Value::String("a".into()), &Value::Int(1)));
    }

    #[test]
    fn contains_and_starts_with_are_case_insensitive() {
        assert!(compare(
            CompareOp::Contains,
            &Value::String("Hello World".into()),
            &Value::String("WORLD".into())
        ));
        assert!(compare(
            CompareOp::StartsWith,
            &Value::String("Hello World".into()),
            &Value::String("hello".into())
        ));
    }
}
