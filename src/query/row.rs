//! Row and path result types: the output shape of the evaluator before
//! `WHERE`/`RETURN`/`ORDER BY` post-processing.

use crate::value::Value;
use indexmap::IndexMap;
use std::hash::{Hash, Hasher};

/// A single bound edge in a result path or row.
///
/// Equality (used for row/path dedup) is structural over every field,
/// including the property snapshot taken at evaluation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEdge {
    pub src: String,
    pub dst: String,
    pub edge_type: String,
    pub from_variable: String,
    pub to_variable: String,
    pub properties: IndexMap<String, Value>,
}

/// `IndexMap` has no `Hash` impl (its equality is order-independent, so a
/// naive derive would be unsound anyway); hash `properties` entry-by-entry
/// in insertion order instead, the same approach `value.rs`'s manual `Hash
/// for Value` takes for its `Map` variant.
impl Hash for PathEdge {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.src.hash(state);
        self.dst.hash(state);
        self.edge_type.hash(state);
        self.from_variable.hash(state);
        self.to_variable.hash(state);
        for (k, v) in &self.properties {
            k.hash(state);
            v.hash(state);
        }
    }
}

/// What a row's edge alias is bound to: a single hop, or — for a
/// variable-length segment — the full list of hops in traversal order.
///
/// Property/`type()` access against a variable-length alias resolves
/// against the first hop; [`EdgeBinding::canonical`] is that resolution
/// rule made explicit.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeBinding {
    Single(PathEdge),
    List(Vec<PathEdge>),
}

impl EdgeBinding {
    /// The edge used for `type(r)` and `r.prop` access: the bound edge
    /// itself, or the first hop of a variable-length binding.
    pub fn canonical(&self) -> Option<&PathEdge> {
        match self {
            EdgeBinding::Single(e) => Some(e),
            EdgeBinding::List(es) => es.first(),
        }
    }

    pub fn hops(&self) -> &[PathEdge] {
        match self {
            EdgeBinding::Single(e) => std::slice::from_ref(e),
            EdgeBinding::List(es) => es,
        }
    }
}

/// A single evaluator result row: node bindings plus edge alias bindings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    pub nodes: IndexMap<String, String>,
    pub edges: IndexMap<String, EdgeBinding>,
}

/// A complete result path: the row's node bindings, plus the full ordered
/// trace of `PathEdge`s the pattern matched, including every hop of any
/// variable-length segment.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathMatch {
    pub nodes: IndexMap<String, String>,
    pub edges: Vec<PathEdge>,
}
