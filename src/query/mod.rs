//! The query engine: grammar, AST, evaluator, `WHERE` filter, and the
//! `RETURN`/`ORDER BY`/`SKIP`/`LIMIT` post-processing stage, wired together
//! behind the four public entry points on [`Graph`].

pub mod ast;
pub mod cancellation;
mod evaluator;
mod parser;
mod projection;
pub mod row;
mod validate;
mod where_filter;

use crate::error::Result;
use crate::graph::Graph;
use crate::value::Value;
use ast::Query;
use indexmap::{IndexMap, IndexSet};
use row::PathMatch;

pub use cancellation::CancellationToken;
pub use evaluator::QueryOptions;
pub use row::{EdgeBinding, PathEdge};

fn parse_and_validate(text: &str) -> Result<Query> {
    let query = parser::parse_query(text)?;
    validate::validate(&query.pattern, &query)?;
    Ok(query)
}

impl Graph {
    /// Runs a pattern and groups surviving bindings by pattern variable.
    ///
    /// If the query carries a `RETURN` clause, only the variables it names
    /// (in variable form, not `var.prop`) appear in the result; property-form
    /// and `type(r)` `RETURN` items are silently ignored here — use
    /// [`Graph::match_rows`] for those.
    pub fn match_pattern(&self, query: &str, opts: &QueryOptions) -> Result<IndexMap<String, IndexSet<String>>> {
        let parsed = parse_and_validate(query)?;
        let opts = opts.clone();
        let rows = evaluator::evaluate(self, &parsed.pattern, &opts)?;
        let rows = projection::filter_rows(rows, parsed.where_clause.as_ref(), &parsed.pattern, self)?;

        let wanted: Option<IndexSet<String>> = parsed.return_items.as_ref().map(|items| {
            items
                .iter()
                .filter_map(|item| match &item.expr {
                    ast::ReturnExpr::Variable(v) => Some(v.clone()),
                    _ => None,
                })
                .collect()
        });

        let mut grouped: IndexMap<String, IndexSet<String>> = IndexMap::new();
        for var in parsed.pattern.node_variables() {
            if wanted.as_ref().is_some_and(|w| !w.contains(var)) {
                continue;
            }
            grouped.entry(var.to_string()).or_default();
        }
        for row in &rows {
            for var in parsed.pattern.node_variables() {
                if wanted.as_ref().is_some_and(|w| !w.contains(var)) {
                    continue;
                }
                if let Some(id) = row.node_id(var) {
                    grouped.entry(var.to_string()).or_default().insert(id.to_string());
                }
            }
        }
        Ok(grouped)
    }

    /// Runs a pattern and returns projected, filtered, sorted, paginated rows.
    pub fn match_rows(&self, query: &str, opts: &QueryOptions) -> Result<Vec<IndexMap<String, Value>>> {
        let parsed = parse_and_validate(query)?;
        let opts = opts.clone();
        let rows = evaluator::evaluate(self, &parsed.pattern, &opts)?;
        let rows = projection::filter_rows(rows, parsed.where_clause.as_ref(), &parsed.pattern, self)?;

        let mut projected: Vec<(evaluator::InternalRow, IndexMap<String, Value>)> = rows
            .into_iter()
            .map(|row| {
                let cols = match &parsed.return_items {
                    Some(items) => projection::project(items, &parsed.pattern, self, &row),
                    None => projection::default_columns(&parsed.pattern, &row),
                };
                (row, cols)
            })
            .collect();

        projection::sort_by_keys(
            &mut projected,
            &parsed.order_by,
            &parsed.pattern,
            self,
            |(row, _)| row,
            |(_, cols)| Some(cols),
        );

        let columns: Vec<IndexMap<String, Value>> = projected.into_iter().map(|(_, cols)| cols).collect();
        Ok(projection::paginate(columns, parsed.skip, parsed.limit))
    }

    /// Runs a pattern and returns full paths, including every edge of any
    /// variable-length segment. `ORDER BY`/`SKIP`/`LIMIT` apply identically
    /// to [`Graph::match_rows`]; `RETURN` projection does not apply to paths.
    pub fn match_paths(&self, query: &str, opts: &QueryOptions) -> Result<Vec<PathMatch>> {
        let parsed = parse_and_validate(query)?;
        let opts = opts.clone();
        let rows = evaluator::evaluate(self, &parsed.pattern, &opts)?;
        let mut rows = projection::filter_rows(rows, parsed.where_clause.as_ref(), &parsed.pattern, self)?;

        projection::sort_by_keys(
            &mut rows,
            &parsed.order_by,
            &parsed.pattern,
            self,
            |row| row,
            |_| None,
        );

        let paths: Vec<PathMatch> = rows.iter().map(|row| row.to_path(&parsed.pattern)).collect();
        Ok(projection::paginate(paths, parsed.skip, parsed.limit))
    }

    /// Runs each pattern in `queries` independently and unions the resulting
    /// variable -> node-id-set maps, analogous to several independent `MATCH`
    /// lines. The union is order-independent per variable (it's a set); the
    /// patterns themselves run in listed order.
    pub fn match_many(&self, queries: &[&str], opts: &QueryOptions) -> Result<IndexMap<String, IndexSet<String>>> {
        let mut merged: IndexMap<String, IndexSet<String>> = IndexMap::new();
        for q in queries {
            let result = self.match_pattern(q, opts)?;
            for (var, ids) in result {
                merged.entry(var).or_default().extend(ids);
            }
        }
        Ok(merged)
    }
}
