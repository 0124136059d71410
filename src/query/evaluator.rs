//! The pattern evaluator: seeding, bidirectional expansion with
//! variable-length support, cycle safety, and row/path deduplication.

use super::ast::{EdgeDirection, EdgeElem, NodeElem, Pattern, PatternElem, PropFilter, FilterOp};
use super::cancellation::CancellationToken;
use super::row::{EdgeBinding, PathEdge, PathMatch, Row};
use crate::error::{GraphError, Result};
use crate::graph::{EdgeView, Graph, Node, TypeFilter};
use crate::value::{contains_ci, Value};
use indexmap::IndexMap;
use itertools::Itertools;
use std::collections::{BTreeMap, HashSet};
use std::hash::{Hash, Hasher};

/// Options controlling a single `match`/`matchRows`/`matchPaths` call.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    pub start_ids: Option<Vec<String>>,
    pub start_type: Option<String>,
    /// Cap applied to a `*` quantifier with no explicit `MAX` (default 10).
    pub var_length_default_cap: usize,
    /// The `ResultTooLarge` row ceiling. `None` means unbounded.
    pub row_limit: Option<usize>,
    pub cancellation: Option<CancellationToken>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            start_ids: None,
            start_type: None,
            var_length_default_cap: 10,
            row_limit: None,
            cancellation: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum EdgeSegment {
    Single(PathEdge),
    VarLen(Vec<PathEdge>),
}

impl EdgeSegment {
    fn into_binding(self) -> EdgeBinding {
        match self {
            EdgeSegment::Single(e) => EdgeBinding::Single(e),
            EdgeSegment::VarLen(v) => EdgeBinding::List(v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct PartialRow {
    node_ids: BTreeMap<usize, String>,
    var_names: IndexMap<String, String>,
    edges: BTreeMap<usize, EdgeSegment>,
}

/// `var_names` is an `IndexMap`, which has no `Hash` impl; hash it
/// entry-by-entry in insertion order instead (same approach as `PathEdge`'s
/// manual `Hash`, following `value.rs`'s `Hash for Value::Map`).
/// `node_ids`/`edges` are redundant with `var_names` for dedup purposes but
/// included since they're cheap `BTreeMap`s and already part of equality.
impl Hash for PartialRow {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.node_ids.hash(state);
        for (k, v) in &self.var_names {
            k.hash(state);
            v.hash(state);
        }
        self.edges.hash(state);
    }
}

fn check_cancel(opts: &QueryOptions) -> Result<()> {
    match &opts.cancellation {
        Some(token) if token.is_cancelled() => Err(GraphError::Cancelled),
        _ => Ok(()),
    }
}

fn element_label(pattern: &Pattern, pos: usize) -> String {
    match pattern.elements.get(pos) {
        Some(PatternElem::Node(n)) => n.variable.clone().unwrap_or_else(|| format!("_{pos}")),
        _ => format!("_{pos}"),
    }
}

fn bind_node(row: &PartialRow, pos: usize, elem: &NodeElem, id: &str) -> Option<PartialRow> {
    if let Some(existing) = row.node_ids.get(&pos) {
        return if existing == id { Some(row.clone()) } else { None };
    }
    if let Some(var) = &elem.variable {
        if let Some(existing) = row.var_names.get(var) {
            if existing != id {
                return None;
            }
        }
    }
    let mut new_row = row.clone();
    new_row.node_ids.insert(pos, id.to_string());
    if let Some(var) = &elem.variable {
        new_row.var_names.insert(var.clone(), id.to_string());
    }
    Some(new_row)
}

fn value_to_match_string(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::Int(i) => Some(i.to_string()),
        Value::Real(r) => Some(r.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::List(_) | Value::Map(_) => None,
    }
}

fn filter_literal_text(f: &PropFilter) -> String {
    match &f.value {
        super::ast::Literal::String(s) => s.clone(),
        super::ast::Literal::Int(i) => i.to_string(),
        super::ast::Literal::Real(r) => r.to_string(),
        super::ast::Literal::Bool(b) => b.to_string(),
    }
}

fn apply_filter(resolved: Option<String>, f: &PropFilter) -> bool {
    let Some(resolved) = resolved else { return false };
    let needle = filter_literal_text(f);
    match f.op {
        FilterOp::Equals => resolved == needle,
        FilterOp::ContainsCi => contains_ci(&resolved, &needle),
    }
}

fn node_matches(elem: &NodeElem, node: &Node) -> bool {
    if let Some(t) = &elem.node_type {
        if &node.node_type != t {
            return false;
        }
    }
    for f in &elem.filters {
        let resolved = match f.key.as_str() {
            "id" => Some(node.id.clone()),
            "type" => Some(node.node_type.clone()),
            "label" => Some(node.label.clone()),
            key => node.properties.get(key).and_then(value_to_match_string),
        };
        if !apply_filter(resolved, f) {
            return false;
        }
    }
    true
}

fn edge_matches_filters(elem: &EdgeElem, edge_type: &str, properties: &IndexMap<String, Value>) -> bool {
    for f in &elem.filters {
        let resolved = match f.key.as_str() {
            "type" => Some(edge_type.to_string()),
            key => properties.get(key).and_then(value_to_match_string),
        };
        if !apply_filter(resolved, f) {
            return false;
        }
    }
    true
}

fn to_type_filter(types: &Option<Vec<String>>) -> TypeFilter {
    match types {
        None => TypeFilter::Any,
        Some(v) => TypeFilter::OneOf(v.clone()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HopMode {
    Out,
    In,
    Either,
}

fn hop_mode(direction: EdgeDirection, known_is_left: bool) -> HopMode {
    match (direction, known_is_left) {
        (EdgeDirection::Forward, true) => HopMode::Out,
        (EdgeDirection::Forward, false) => HopMode::In,
        (EdgeDirection::Backward, true) => HopMode::In,
        (EdgeDirection::Backward, false) => HopMode::Out,
        (EdgeDirection::Either, _) => HopMode::Either,
    }
}

/// One traversal hop: the concrete edge, and whether the walk's current
/// frontier was the edge's source (`true`) or destination (`false`).
type Hop = (EdgeView, bool);

fn candidates_for_hop(graph: &Graph, elem: &EdgeElem, mode: HopMode, frontier: &str) -> Vec<Hop> {
    let filter = to_type_filter(&elem.types);
    let mut result = Vec::new();
    if matches!(mode, HopMode::Out | HopMode::Either) {
        for e in graph.out_edges(frontier, &filter) {
            if edge_matches_filters(elem, &e.edge_type, &e.properties) {
                result.push((e, true));
            }
        }
    }
    if matches!(mode, HopMode::In | HopMode::Either) {
        for e in graph.in_edges(frontier, &filter) {
            if edge_matches_filters(elem, &e.edge_type, &e.properties) {
                result.push((e, false));
            }
        }
    }
    result
}

/// DFS over simple (no-repeated-edge) paths starting at `start`, recording
/// every prefix of length `1..=max_hops` (each recorded path is a candidate
/// for the variable-length segment once filtered by `[min, max]`).
#[allow(clippy::too_many_arguments)]
fn enumerate_hops(
    graph: &Graph,
    elem: &EdgeElem,
    mode: HopMode,
    start: &str,
    max_hops: u32,
    opts: &QueryOptions,
) -> Result<Vec<Vec<Hop>>> {
    let mut results = Vec::new();
    let mut path: Vec<Hop> = Vec::new();
    let mut used: HashSet<(String, String, String)> = HashSet::new();
    rec_hops(graph, elem, mode, start, max_hops, &mut path, &mut used, &mut results, opts)?;
    Ok(results)
}

#[allow(clippy::too_many_arguments)]
fn rec_hops(
    graph: &Graph,
    elem: &EdgeElem,
    mode: HopMode,
    frontier: &str,
    max_hops: u32,
    path: &mut Vec<Hop>,
    used: &mut HashSet<(String, String, String)>,
    results: &mut Vec<Vec<Hop>>,
    opts: &QueryOptions,
) -> Result<()> {
    check_cancel(opts)?;
    if path.len() as u32 >= max_hops {
        return Ok(());
    }
    for (edge, frontier_is_src) in candidates_for_hop(graph, elem, mode, frontier) {
        let key = (edge.src.clone(), edge.edge_type.clone(), edge.dst.clone());
        if used.contains(&key) {
            continue;
        }
        let next = if frontier_is_src { edge.dst.clone() } else { edge.src.clone() };
        used.insert(key.clone());
        path.push((edge, frontier_is_src));
        results.push(path.clone());
        rec_hops(graph, elem, mode, &next, max_hops, path, used, results, opts)?;
        path.pop();
        used.remove(&key);
    }
    Ok(())
}

fn build_path_edges(hops: &[Hop], anchor_var: &str, target_var: &str) -> Vec<PathEdge> {
    let n = hops.len();
    hops.iter()
        .enumerate()
        .map(|(i, (edge, frontier_is_src))| {
            let near_var = if i == 0 { anchor_var } else { "" };
            let far_var = if i == n - 1 { target_var } else { "" };
            let (from_variable, to_variable) = if *frontier_is_src {
                (near_var.to_string(), far_var.to_string())
            } else {
                (far_var.to_string(), near_var.to_string())
            };
            PathEdge {
                src: edge.src.clone(),
                dst: edge.dst.clone(),
                edge_type: edge.edge_type.clone(),
                from_variable,
                to_variable,
                properties: edge.properties.clone(),
            }
        })
        .collect()
}

/// Expands a single edge step (fixed-length or variable-length) from a
/// bound `known_pos` node to the as-yet-unbound `node_pos` node.
#[allow(clippy::too_many_arguments)]
fn expand_edge_step(
    graph: &Graph,
    edge_pos: usize,
    edge_elem: &EdgeElem,
    node_pos: usize,
    node_elem: &NodeElem,
    known_pos: usize,
    anchor_var: &str,
    target_var: &str,
    row: &PartialRow,
    opts: &QueryOptions,
) -> Result<Vec<PartialRow>> {
    let known_id = row.node_ids.get(&known_pos).cloned().expect("known position must be bound");
    let known_is_left = known_pos < node_pos;
    let mode = hop_mode(edge_elem.direction, known_is_left);

    let (min, max) = match &edge_elem.quantifier {
        None => (1u32, 1u32),
        Some(q) => (q.min, q.max.unwrap_or(opts.var_length_default_cap as u32)),
    };
    let is_var_length = edge_elem.quantifier.is_some();

    let mut outputs = Vec::new();

    if min == 0 {
        if let Some(node) = graph.node(&known_id) {
            if node_matches(node_elem, node) {
                if let Some(mut new_row) = bind_node(row, node_pos, node_elem, &known_id) {
                    if is_var_length {
                        new_row.edges.insert(edge_pos, EdgeSegment::VarLen(Vec::new()));
                    }
                    outputs.push(new_row);
                }
            }
        }
    }

    if max == 0 {
        return Ok(outputs);
    }

    let all_paths = enumerate_hops(graph, edge_elem, mode, &known_id, max, opts)?;
    for path in all_paths {
        let len = path.len() as u32;
        if len < min.max(1) || len > max {
            continue;
        }
        let (last_edge, last_frontier_is_src) = path.last().expect("non-empty path");
        let final_id = if *last_frontier_is_src {
            last_edge.dst.clone()
        } else {
            last_edge.src.clone()
        };
        let Some(node) = graph.node(&final_id) else { continue };
        if !node_matches(node_elem, node) {
            continue;
        }
        let Some(mut new_row) = bind_node(row, node_pos, node_elem, &final_id) else { continue };
        let path_edges = build_path_edges(&path, anchor_var, target_var);
        if is_var_length {
            new_row.edges.insert(edge_pos, EdgeSegment::VarLen(path_edges));
        } else {
            new_row.edges.insert(
                edge_pos,
                EdgeSegment::Single(path_edges.into_iter().next().expect("single hop")),
            );
        }
        outputs.push(new_row);
    }
    Ok(outputs)
}

#[derive(Debug, Clone, Copy)]
enum Walk {
    Left,
    Right,
}

fn expand_direction(
    graph: &Graph,
    pattern: &Pattern,
    from_pos: usize,
    row: PartialRow,
    opts: &QueryOptions,
    walk: Walk,
) -> Result<Vec<PartialRow>> {
    check_cancel(opts)?;
    let (edge_pos, node_pos) = match walk {
        Walk::Left => {
            if from_pos == 0 {
                return Ok(vec![row]);
            }
            (from_pos - 1, from_pos - 2)
        }
        Walk::Right => {
            if from_pos + 1 >= pattern.elements.len() {
                return Ok(vec![row]);
            }
            (from_pos + 1, from_pos + 2)
        }
    };
    let edge_elem = pattern.edge_at(edge_pos).expect("edge position");
    let node_elem = pattern.node_at(node_pos).expect("node position");
    let anchor_var = element_label(pattern, from_pos);
    let target_var = element_label(pattern, node_pos);

    let extended = expand_edge_step(
        graph, edge_pos, edge_elem, node_pos, node_elem, from_pos, &anchor_var, &target_var, &row,
        opts,
    )?;

    let mut result = Vec::new();
    for r in extended {
        result.extend(expand_direction(graph, pattern, node_pos, r, opts, walk)?);
    }
    Ok(result)
}

fn expand_from_seed(
    graph: &Graph,
    pattern: &Pattern,
    seed_pos: usize,
    row: PartialRow,
    opts: &QueryOptions,
) -> Result<Vec<PartialRow>> {
    let left_rows = expand_direction(graph, pattern, seed_pos, row, opts, Walk::Left)?;
    let mut result = Vec::new();
    for r in left_rows {
        result.extend(expand_direction(graph, pattern, seed_pos, r, opts, Walk::Right)?);
    }
    Ok(result)
}

fn seed_rows(graph: &Graph, pattern: &Pattern, opts: &QueryOptions) -> Result<Vec<(usize, PartialRow)>> {
    let mut seeds = Vec::new();
    if let Some(ids) = &opts.start_ids {
        let mut positions: Vec<usize> = pattern.node_positions().collect();
        if let Some(start_type) = &opts.start_type {
            let declares_type = positions
                .iter()
                .any(|&p| pattern.node_at(p).and_then(|n| n.node_type.as_deref()) == Some(start_type.as_str()));
            if !declares_type {
                return Err(GraphError::InvalidStartType {
                    start_type: start_type.clone(),
                });
            }
            positions.retain(|&p| {
                pattern.node_at(p).and_then(|n| n.node_type.as_deref()) == Some(start_type.as_str())
            });
        }
        for pos in positions {
            let elem = pattern.node_at(pos).expect("node position");
            for id in ids {
                let Some(node) = graph.node(id) else { continue };
                if !node_matches(elem, node) {
                    continue;
                }
                let row = PartialRow::default();
                if let Some(row) = bind_node(&row, pos, elem, id) {
                    seeds.push((pos, row));
                }
            }
        }
    } else {
        let pos = 0;
        let elem = pattern.node_at(pos).expect("pattern always starts with a node");
        let candidates: Vec<&Node> = match &elem.node_type {
            Some(t) => graph.nodes_of_type(t),
            None => graph.nodes().collect(),
        };
        for node in candidates {
            if node_matches(elem, node) {
                let row = PartialRow::default();
                let row = bind_node(&row, pos, elem, &node.id).expect("fresh binding always succeeds");
                seeds.push((pos, row));
            }
        }
    }
    Ok(seeds)
}

/// De-duplicates on the full `(node_ids, edges)` tuple (`spec.md` §4.3.4).
/// `var_names` is redundant with `node_ids` for this purpose but harmless to
/// include since it's derived from the same bindings.
fn dedup_rows(rows: Vec<PartialRow>) -> Vec<PartialRow> {
    rows.into_iter().unique().collect()
}

/// Runs seeding and bidirectional expansion, returning the deduplicated,
/// fully-bound row set (pre-`WHERE`/`RETURN`/`ORDER BY`).
pub(crate) fn evaluate(graph: &Graph, pattern: &Pattern, opts: &QueryOptions) -> Result<Vec<InternalRow>> {
    let seeds = seed_rows(graph, pattern, opts)?;
    let mut all_rows = Vec::new();
    for (seed_pos, row) in seeds {
        check_cancel(opts)?;
        all_rows.extend(expand_from_seed(graph, pattern, seed_pos, row, opts)?);
    }
    let deduped = dedup_rows(all_rows);
    if let Some(limit) = opts.row_limit {
        if deduped.len() > limit {
            return Err(GraphError::ResultTooLarge { limit });
        }
    }
    Ok(deduped.into_iter().map(InternalRow).collect())
}

/// An evaluated row, opaque outside this module; converted to the public
/// [`Row`] or [`PathMatch`] shape on demand.
pub(crate) struct InternalRow(PartialRow);

impl InternalRow {
    pub(crate) fn to_row(&self, pattern: &Pattern) -> Row {
        let mut nodes = IndexMap::new();
        for pos in pattern.node_positions() {
            if let Some(elem) = pattern.node_at(pos) {
                if let Some(var) = &elem.variable {
                    if let Some(id) = self.0.node_ids.get(&pos) {
                        nodes.insert(var.clone(), id.clone());
                    }
                }
            }
        }
        let mut edges = IndexMap::new();
        for (pos, elem) in pattern.elements.iter().enumerate() {
            if let PatternElem::Edge(e) = elem {
                if let Some(alias) = &e.variable {
                    if let Some(seg) = self.0.edges.get(&pos) {
                        edges.insert(alias.clone(), seg.clone().into_binding());
                    }
                }
            }
        }
        Row { nodes, edges }
    }

    pub(crate) fn to_path(&self, pattern: &Pattern) -> PathMatch {
        let mut nodes = IndexMap::new();
        for pos in pattern.node_positions() {
            if let Some(elem) = pattern.node_at(pos) {
                if let Some(var) = &elem.variable {
                    if let Some(id) = self.0.node_ids.get(&pos) {
                        nodes.insert(var.clone(), id.clone());
                    }
                }
            }
        }
        let mut edges = Vec::new();
        for seg in self.0.edges.values() {
            match seg {
                EdgeSegment::Single(e) => edges.push(e.clone()),
                EdgeSegment::VarLen(v) => edges.extend(v.iter().cloned()),
            }
        }
        PathMatch { nodes, edges }
    }

    pub(crate) fn node_id(&self, variable: &str) -> Option<&str> {
        self.0.var_names.get(variable).map(|s| s.as_str())
    }

    pub(crate) fn edge_canonical(&self, pattern: &Pattern, variable: &str) -> Option<PathEdge> {
        for (pos, elem) in pattern.elements.iter().enumerate() {
            if let PatternElem::Edge(e) = elem {
                if e.variable.as_deref() == Some(variable) {
                    return match self.0.edges.get(&pos)? {
                        EdgeSegment::Single(e) => Some(e.clone()),
                        EdgeSegment::VarLen(v) => v.first().cloned(),
                    };
                }
            }
        }
        None
    }

    pub(crate) fn node_property(&self, graph: &Graph, variable: &str, property: &str) -> Value {
        self.node_id(variable)
            .and_then(|id| graph.node(id))
            .and_then(|n| match property {
                "id" => Some(Value::String(n.id.clone())),
                "type" => Some(Value::String(n.node_type.clone())),
                "label" => Some(Value::String(n.label.clone())),
                key => n.properties.get(key).cloned(),
            })
            .unwrap_or(Value::Null)
    }

    /// Resolves `edgeVar.property` against the canonical edge (the first
    /// hop, for a variable-length binding).
    pub(crate) fn edge_property(&self, pattern: &Pattern, variable: &str, property: &str) -> Value {
        self.edge_canonical(pattern, variable)
            .and_then(|e| match property {
                "type" => Some(Value::String(e.edge_type)),
                "src" => Some(Value::String(e.src)),
                "dst" => Some(Value::String(e.dst)),
                key => e.properties.get(key).cloned(),
            })
            .unwrap_or(Value::Null)
    }

    /// Does `variable` name a node in this pattern's bindings?
    pub(crate) fn is_node_variable(&self, variable: &str) -> bool {
        self.0.var_names.contains_key(variable)
    }
}
