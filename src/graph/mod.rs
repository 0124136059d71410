//! The graph store: typed nodes, typed directed multi-edges with per-edge
//! properties, and the forward/reverse adjacency the pattern evaluator walks.
//!
//! A `petgraph::graph::DiGraph` backbone plus auxiliary `IndexMap`/`IndexSet`
//! indices gives O(1) id/type lookup and deterministic, insertion-ordered
//! traversal (petgraph's own edge iteration order is not guaranteed to match
//! insertion order, so the ordered indices are load-bearing, not decorative).

use crate::error::{GraphError, Result};
use crate::value::Value;
use indexmap::{IndexMap, IndexSet};
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};

/// A graph node: a unique id, a type tag, a display label, and properties.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub node_type: String,
    pub label: String,
    pub properties: IndexMap<String, Value>,
}

impl Node {
    pub fn new(
        id: impl Into<String>,
        node_type: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            label: label.into(),
            properties: IndexMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// A concrete, bound edge — the view the evaluator works with while walking
/// adjacency. Distinct from the `EdgeData` stored on the graph's internal
/// `DiGraph`, which omits src/dst (implicit in the graph topology).
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeView {
    pub src: String,
    pub dst: String,
    pub edge_type: String,
    pub properties: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct EdgeData {
    pub edge_type: String,
    pub properties: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Default)]
struct StoredNode {
    data: Node,
    /// edge type -> ordered set of outgoing edges of that type, in insertion order.
    out_index: IndexMap<String, IndexSet<EdgeIndex>>,
    /// edge type -> ordered set of incoming edges of that type, in insertion order.
    in_index: IndexMap<String, IndexSet<EdgeIndex>>,
}

impl Default for Node {
    fn default() -> Self {
        Node {
            id: String::new(),
            node_type: String::new(),
            label: String::new(),
            properties: IndexMap::new(),
        }
    }
}

/// Which edge types an adjacency walk should follow.
#[derive(Debug, Clone)]
pub enum TypeFilter {
    Any,
    OneOf(Vec<String>),
}

impl TypeFilter {
    pub fn matches(&self, edge_type: &str) -> bool {
        match self {
            TypeFilter::Any => true,
            TypeFilter::OneOf(types) => types.iter().any(|t| t == edge_type),
        }
    }
}

/// An in-memory, typed, directed multigraph.
///
/// Queries borrow the graph immutably (`&self`); there is no interior
/// mutation, so the type system itself enforces reader/writer exclusion —
/// a query simply cannot observe a concurrent write.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    inner: DiGraph<StoredNode, EdgeData>,
    by_id: IndexMap<String, NodeIndex>,
    by_type: IndexMap<String, IndexSet<NodeIndex>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node, or replaces it in place if `node.id` already exists.
    /// Replacement preserves existing incident edges.
    pub fn upsert_node(&mut self, node: Node) {
        if let Some(&idx) = self.by_id.get(&node.id) {
            let old_type = self.inner[idx].data.node_type.clone();
            if old_type != node.node_type {
                if let Some(set) = self.by_type.get_mut(&old_type) {
                    set.shift_remove(&idx);
                }
                self.by_type
                    .entry(node.node_type.clone())
                    .or_default()
                    .insert(idx);
            }
            self.inner[idx].data = node;
        } else {
            let node_type = node.node_type.clone();
            let id = node.id.clone();
            let stored = StoredNode {
                data: node,
                out_index: IndexMap::new(),
                in_index: IndexMap::new(),
            };
            let idx = self.inner.add_node(stored);
            self.by_id.insert(id, idx);
            self.by_type.entry(node_type).or_default().insert(idx);
        }
    }

    /// Adds a directed `(src, edge_type, dst)` edge. Strict: both endpoints
    /// must already exist (`GraphError::MissingEndpoint` otherwise).
    /// Adding an edge already present for the same `(src, edge_type, dst)`
    /// replaces its properties rather than creating a duplicate.
    pub fn add_edge(
        &mut self,
        src: &str,
        edge_type: &str,
        dst: &str,
        properties: IndexMap<String, Value>,
    ) -> Result<()> {
        let src_idx = *self
            .by_id
            .get(src)
            .ok_or_else(|| GraphError::MissingEndpoint { id: src.to_owned() })?;
        let dst_idx = *self
            .by_id
            .get(dst)
            .ok_or_else(|| GraphError::MissingEndpoint { id: dst.to_owned() })?;

        if let Some(existing) = self.inner[src_idx]
            .out_index
            .get(edge_type)
            .and_then(|set| {
                set.iter()
                    .copied()
                    .find(|&e| self.inner.edge_endpoints(e).map(|(_, t)| t) == Some(dst_idx))
            })
        {
            self.inner[existing].properties = properties;
            return Ok(());
        }

        let edge_idx = self.inner.add_edge(
            src_idx,
            dst_idx,
            EdgeData {
                edge_type: edge_type.to_owned(),
                properties,
            },
        );
        self.inner[src_idx]
            .out_index
            .entry(edge_type.to_owned())
            .or_default()
            .insert(edge_idx);
        self.inner[dst_idx]
            .in_index
            .entry(edge_type.to_owned())
            .or_default()
            .insert(edge_idx);
        Ok(())
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.by_id.get(id).map(|&idx| &self.inner[idx].data)
    }

    /// All nodes, in insertion order. Used when a pattern's first node
    /// element has no declared type.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.by_id.values().map(move |&idx| &self.inner[idx].data)
    }

    /// Nodes of a given type, in insertion order.
    pub fn nodes_of_type(&self, node_type: &str) -> Vec<&Node> {
        match self.by_type.get(node_type) {
            Some(set) => set.iter().map(|&idx| &self.inner[idx].data).collect(),
            None => Vec::new(),
        }
    }

    /// Outgoing edges from `id`, filtered by type, in insertion order.
    pub fn out_edges(&self, id: &str, filter: &TypeFilter) -> Vec<EdgeView> {
        self.directed_edges(id, filter, true)
    }

    /// Incoming edges into `id`, filtered by type, in insertion order.
    pub fn in_edges(&self, id: &str, filter: &TypeFilter) -> Vec<EdgeView> {
        self.directed_edges(id, filter, false)
    }

    fn directed_edges(&self, id: &str, filter: &TypeFilter, outgoing: bool) -> Vec<EdgeView> {
        let Some(&idx) = self.by_id.get(id) else {
            return Vec::new();
        };
        let stored = &self.inner[idx];
        let index = if outgoing { &stored.out_index } else { &stored.in_index };
        let mut result = Vec::new();
        for (edge_type, edges) in index {
            if !filter.matches(edge_type) {
                continue;
            }
            for &edge_idx in edges {
                let Some((a, b)) = self.inner.edge_endpoints(edge_idx) else {
                    continue;
                };
                let (src_idx, dst_idx) = (a, b);
                let data = &self.inner[edge_idx];
                result.push(EdgeView {
                    src: self.inner[src_idx].data.id.clone(),
                    dst: self.inner[dst_idx].data.id.clone(),
                    edge_type: data.edge_type.clone(),
                    properties: data.properties.clone(),
                });
            }
        }
        result
    }

    /// Looks up the property map for a concrete `(src, edge_type, dst)`
    /// triple, if such an edge exists.
    pub fn edge_properties(
        &self,
        src: &str,
        edge_type: &str,
        dst: &str,
    ) -> Option<&IndexMap<String, Value>> {
        let src_idx = *self.by_id.get(src)?;
        let dst_idx = *self.by_id.get(dst)?;
        let edges = self.inner[src_idx].out_index.get(edge_type)?;
        edges
            .iter()
            .find(|&&e| self.inner.edge_endpoints(e).map(|(_, t)| t) == Some(dst_idx))
            .map(|&e| &self.inner[e].properties)
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_graph() -> Graph {
        let mut g = Graph::new();
        g.upsert_node(Node::new("a", "Person", "Alice"));
        g.upsert_node(Node::new("b", "Person", "Bob"));
        g.add_edge("a", "KNOWS", "b", IndexMap::new()).unwrap();
        g
    }

    #[test]
    fn add_edge_rejects_missing_endpoints() {
        let mut g = Graph::new();
        g.upsert_node(Node::new("a", "Person", "Alice"));
        let err = g.add_edge("a", "KNOWS", "ghost", IndexMap::new()).unwrap_err();
        assert!(matches!(err, GraphError::MissingEndpoint { .. }));
    }

    #[test]
    fn adjacency_is_bidirectionally_coherent() {
        let g = small_graph();
        let out = g.out_edges("a", &TypeFilter::Any);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].dst, "b");
        let inn = g.in_edges("b", &TypeFilter::Any);
        assert_eq!(inn.len(), 1);
        assert_eq!(inn[0].src, "a");
    }

    #[test]
    fn duplicate_edge_same_type_is_deduped() {
        let mut g = small_graph();
        let mut props = IndexMap::new();
        props.insert("weight".to_string(), Value::Int(2));
        g.add_edge("a", "KNOWS", "b", props).unwrap();
        assert_eq!(g.edge_count(), 1);
        assert_eq!(
            g.edge_properties("a", "KNOWS", "b").unwrap().get("weight"),
            Some(&Value::Int(2))
        );
    }

    #[test]
    fn replace_node_preserves_edges() {
        let mut g = small_graph();
        g.upsert_node(Node::new("a", "Person", "Alicia"));
        assert_eq!(g.node("a").unwrap().label, "Alicia");
        assert_eq!(g.out_edges("a", &TypeFilter::Any).len(), 1);
    }

    #[test]
    fn replace_node_with_new_type_updates_type_index() {
        let mut g = small_graph();
        assert_eq!(g.nodes_of_type("Person").len(), 2);
        g.upsert_node(Node::new("a", "Robot", "Alice"));
        assert_eq!(g.nodes_of_type("Person").len(), 1);
        assert_eq!(g.nodes_of_type("Robot").len(), 1);
    }
}
