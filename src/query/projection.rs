//! `RETURN` projection and the `ORDER BY` / `SKIP` / `LIMIT` post-processing
//! stage shared by `match_rows` and `match_paths`.

use super::ast::{Pattern, ReturnExpr, ReturnItem, SortDirection, SortItem, SortKey};
use super::evaluator::InternalRow;
use super::where_filter;
use crate::error::Result;
use crate::graph::Graph;
use crate::value::Value;
use indexmap::IndexMap;

/// Projects a row through an explicit `RETURN` list.
pub(crate) fn project(items: &[ReturnItem], pattern: &Pattern, graph: &Graph, row: &InternalRow) -> IndexMap<String, Value> {
    let mut out = IndexMap::new();
    for item in items {
        let value = match &item.expr {
            ReturnExpr::Variable(v) => row
                .node_id(v)
                .map(|id| Value::String(id.to_string()))
                .unwrap_or(Value::Null),
            ReturnExpr::Property { variable, property } => {
                if row.is_node_variable(variable) {
                    row.node_property(graph, variable, property)
                } else {
                    row.edge_property(pattern, variable, property)
                }
            }
            ReturnExpr::EdgeType { variable } => row
                .edge_canonical(pattern, variable)
                .map(|e| Value::String(e.edge_type))
                .unwrap_or(Value::Null),
        };
        out.insert(item.column_name(), value);
    }
    out
}

/// The implicit projection used by `match_rows` when no `RETURN` is given:
/// the full row as-is — every node variable bound to its id, and every edge
/// alias bound to its (canonical, for a variable-length segment) type,
/// stringly typed (`spec.md` §4.5).
pub(crate) fn default_columns(pattern: &Pattern, row: &InternalRow) -> IndexMap<String, Value> {
    let mut out = IndexMap::new();
    for var in pattern.node_variables() {
        if let Some(id) = row.node_id(var) {
            out.insert(var.to_string(), Value::String(id.to_string()));
        }
    }
    for var in pattern.edge_variables() {
        if let Some(edge) = row.edge_canonical(pattern, var) {
            out.insert(var.to_string(), Value::String(edge.edge_type));
        }
    }
    out
}

fn resolve_sort_value(
    key: &SortKey,
    pattern: &Pattern,
    graph: &Graph,
    row: &InternalRow,
    projected: Option<&IndexMap<String, Value>>,
) -> Value {
    match key {
        SortKey::Variable(name) => {
            if let Some(v) = projected.and_then(|p| p.get(name)) {
                return v.clone();
            }
            row.node_id(name)
                .map(|id| Value::String(id.to_string()))
                .unwrap_or(Value::Null)
        }
        SortKey::Property { variable, property } => {
            if row.is_node_variable(variable) {
                row.node_property(graph, variable, property)
            } else {
                row.edge_property(pattern, variable, property)
            }
        }
        SortKey::EdgeType { variable } => row
            .edge_canonical(pattern, variable)
            .map(|e| Value::String(e.edge_type))
            .unwrap_or(Value::Null),
    }
}

/// Stable-sorts `rows` by `order_by`, resolving each key against the
/// pre-sort row state (and, when present, the projected output columns so a
/// `RETURN ... AS alias` can be named in `ORDER BY`).
pub(crate) fn sort_by_keys<T>(
    rows: &mut [T],
    order_by: &[SortItem],
    pattern: &Pattern,
    graph: &Graph,
    internal: impl Fn(&T) -> &InternalRow,
    projected: impl Fn(&T) -> Option<&IndexMap<String, Value>>,
) {
    if order_by.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        for item in order_by {
            let av = resolve_sort_value(&item.key, pattern, graph, internal(a), projected(a));
            let bv = resolve_sort_value(&item.key, pattern, graph, internal(b), projected(b));
            let mut ord = av.sort_cmp(&bv);
            if item.direction == SortDirection::Desc {
                ord = ord.reverse();
            }
            if ord != std::cmp::Ordering::Equal {
                return ord;
            }
        }
        std::cmp::Ordering::Equal
    });
}

/// `full[skip : skip + limit]`, matching the pagination-correctness
/// property: `SKIP`/`LIMIT` apply strictly after `ORDER BY`.
pub(crate) fn paginate<T>(rows: Vec<T>, skip: Option<u64>, limit: Option<u64>) -> Vec<T> {
    let skip = skip.unwrap_or(0) as usize;
    let iter = rows.into_iter().skip(skip);
    match limit {
        Some(l) => iter.take(l as usize).collect(),
        None => iter.collect(),
    }
}

/// Applies `WHERE` to every row, keeping only the survivors.
pub(crate) fn filter_rows(
    rows: Vec<InternalRow>,
    where_clause: Option<&super::ast::Expr>,
    pattern: &Pattern,
    graph: &Graph,
) -> Result<Vec<InternalRow>> {
    Ok(match where_clause {
        None => rows,
        Some(expr) => rows
            .into_iter()
            .filter(|row| where_filter::eval(expr, pattern, graph, row))
            .collect(),
    })
}
