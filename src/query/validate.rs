//! Reference-checks a parsed query against the variables its own pattern
//! binds. `WHERE`/`RETURN`/`ORDER BY` clauses that name a variable the
//! pattern never binds are rejected with `GraphError::UnknownVariable`
//! before evaluation begins — unlike a missing property, this is a
//! caller error, not data absence.

use super::ast::{Expr, Operand, Pattern, Query, ReturnExpr, SortKey};
use crate::error::{GraphError, Result};
use std::collections::HashSet;

pub(crate) fn validate(pattern: &Pattern, query: &Query) -> Result<()> {
    let node_vars: HashSet<&str> = pattern.node_variables().collect();
    let edge_vars: HashSet<&str> = pattern.edge_variables().collect();
    let aliases: HashSet<&str> = query
        .return_items
        .iter()
        .flatten()
        .filter_map(|item| item.alias.as_deref())
        .collect();

    if let Some(expr) = &query.where_clause {
        check_expr(expr, &node_vars, &edge_vars)?;
    }
    if let Some(items) = &query.return_items {
        for item in items {
            check_return_expr(&item.expr, &node_vars, &edge_vars)?;
        }
    }
    for item in &query.order_by {
        check_sort_key(&item.key, &node_vars, &edge_vars, &aliases)?;
    }
    Ok(())
}

fn check_expr(expr: &Expr, node_vars: &HashSet<&str>, edge_vars: &HashSet<&str>) -> Result<()> {
    match expr {
        Expr::And(l, r) | Expr::Or(l, r) => {
            check_expr(l, node_vars, edge_vars)?;
            check_expr(r, node_vars, edge_vars)
        }
        Expr::Comparison { left, right, .. } => {
            check_operand(left, node_vars, edge_vars)?;
            check_operand(right, node_vars, edge_vars)
        }
    }
}

fn check_operand(operand: &Operand, node_vars: &HashSet<&str>, edge_vars: &HashSet<&str>) -> Result<()> {
    match operand {
        Operand::Literal(_) => Ok(()),
        Operand::Property { variable, .. } => require_known(variable, node_vars, edge_vars),
        Operand::EdgeType { variable } => require_edge(variable, edge_vars),
    }
}

fn check_return_expr(expr: &ReturnExpr, node_vars: &HashSet<&str>, edge_vars: &HashSet<&str>) -> Result<()> {
    match expr {
        ReturnExpr::Variable(v) => require_known(v, node_vars, edge_vars),
        ReturnExpr::Property { variable, .. } => require_known(variable, node_vars, edge_vars),
        ReturnExpr::EdgeType { variable } => require_edge(variable, edge_vars),
    }
}

fn check_sort_key(
    key: &SortKey,
    node_vars: &HashSet<&str>,
    edge_vars: &HashSet<&str>,
    aliases: &HashSet<&str>,
) -> Result<()> {
    match key {
        SortKey::Variable(name) => {
            if aliases.contains(name.as_str()) || node_vars.contains(name.as_str()) || edge_vars.contains(name.as_str()) {
                Ok(())
            } else {
                Err(GraphError::UnknownVariable { name: name.clone() })
            }
        }
        SortKey::Property { variable, .. } => require_known(variable, node_vars, edge_vars),
        SortKey::EdgeType { variable } => require_edge(variable, edge_vars),
    }
}

fn require_known(name: &str, node_vars: &HashSet<&str>, edge_vars: &HashSet<&str>) -> Result<()> {
    if node_vars.contains(name) || edge_vars.contains(name) {
        Ok(())
    } else {
        Err(GraphError::UnknownVariable { name: name.to_string() })
    }
}

fn require_edge(name: &str, edge_vars: &HashSet<&str>) -> Result<()> {
    if edge_vars.contains(name) {
        Ok(())
    } else {
        Err(GraphError::UnknownVariable { name: name.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::parser::parse_query;

    #[test]
    fn unknown_where_variable_is_rejected() {
        let q = parse_query("a-[:R]->b WHERE c.name = \"x\"").unwrap();
        let err = validate(&q.pattern, &q).unwrap_err();
        assert!(matches!(err, GraphError::UnknownVariable { name } if name == "c"));
    }

    #[test]
    fn return_alias_is_a_valid_order_by_key() {
        let q = parse_query("p:Person RETURN p.name AS n ORDER BY n").unwrap();
        assert!(validate(&q.pattern, &q).is_ok());
    }

    #[test]
    fn type_of_a_node_variable_is_rejected() {
        let q = parse_query("p:Person WHERE type(p) = \"x\"").unwrap();
        assert!(validate(&q.pattern, &q).is_err());
    }
}
