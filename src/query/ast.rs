//! The query AST: the parsed shape of `MATCH ... WHERE ... RETURN ... ORDER
//! BY ... SKIP ... LIMIT ...`.
//!
//! The pattern itself is a flat, linear chain — `NodeElem (EdgeElem
//! NodeElem)*` — so it is represented as a `Vec<PatternElem>` rather than a
//! nested tree; the shape has no branching, so a flat `Vec`-backed path
//! representation is simpler than an AST with explicit recursion.

use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub pattern: Pattern,
    pub where_clause: Option<Expr>,
    pub return_items: Option<Vec<ReturnItem>>,
    pub order_by: Vec<SortItem>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

/// A parsed pattern: an alternating chain of node and edge elements,
/// always starting and ending on a node element.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pattern {
    pub elements: Vec<PatternElem>,
}

impl Pattern {
    /// Indices of the node elements, in textual (left-to-right) order.
    pub fn node_positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.elements
            .iter()
            .enumerate()
            .filter_map(|(i, e)| matches!(e, PatternElem::Node(_)).then_some(i))
    }

    pub fn node_at(&self, pos: usize) -> Option<&NodeElem> {
        match self.elements.get(pos) {
            Some(PatternElem::Node(n)) => Some(n),
            _ => None,
        }
    }

    pub fn edge_at(&self, pos: usize) -> Option<&EdgeElem> {
        match self.elements.get(pos) {
            Some(PatternElem::Edge(e)) => Some(e),
            _ => None,
        }
    }

    /// Every pattern variable bound to a node, in textual order.
    pub fn node_variables(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().filter_map(|e| match e {
            PatternElem::Node(n) => n.variable.as_deref(),
            _ => None,
        })
    }

    /// Every edge alias bound by the pattern, in textual order.
    pub fn edge_variables(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().filter_map(|e| match e {
            PatternElem::Edge(e) => e.variable.as_deref(),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PatternElem {
    Node(NodeElem),
    Edge(EdgeElem),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeElem {
    pub variable: Option<String>,
    pub node_type: Option<String>,
    pub filters: Vec<PropFilter>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeElem {
    pub variable: Option<String>,
    pub direction: EdgeDirection,
    /// `None` means "any type"; `Some([..])` a `|`-separated type union.
    pub types: Option<Vec<String>>,
    pub quantifier: Option<Quantifier>,
    pub filters: Vec<PropFilter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum EdgeDirection {
    #[strum(to_string = "->")]
    Forward,
    #[strum(to_string = "<-")]
    Backward,
    #[strum(to_string = "-")]
    Either,
}

/// A variable-length quantifier, `*`, `*N`, `*MIN..MAX`, `*MIN..`, `*..MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quantifier {
    pub min: u32,
    pub max: Option<u32>,
}

/// An inline property filter inside `{...}`.
///
/// `key = value` / `key: value` is an equality test (against `id`, `type`,
/// `label`, or a property lookup); `key ~ value` is a case-insensitive
/// substring test.
#[derive(Debug, Clone, PartialEq)]
pub struct PropFilter {
    pub key: String,
    pub op: FilterOp,
    pub value: Literal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Equals,
    ContainsCi,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Real(f64),
    Bool(bool),
    String(String),
}

impl Literal {
    pub fn into_value(self) -> Value {
        match self {
            Literal::Int(i) => Value::Int(i),
            Literal::Real(r) => Value::Real(r),
            Literal::Bool(b) => Value::Bool(b),
            Literal::String(s) => Value::String(s),
        }
    }
}

/// The `WHERE` boolean expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Comparison {
        left: Operand,
        op: CompareOp,
        right: Operand,
    },
}

/// Either side of a comparison: a property access, an edge-type
/// introspection, or a literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Property { variable: String, property: String },
    EdgeType { variable: String },
    Literal(Literal),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum CompareOp {
    #[strum(to_string = "=")]
    Eq,
    #[strum(to_string = "!=")]
    Ne,
    #[strum(to_string = "<")]
    Lt,
    #[strum(to_string = "<=")]
    Le,
    #[strum(to_string = ">")]
    Gt,
    #[strum(to_string = ">=")]
    Ge,
    #[strum(to_string = "CONTAINS")]
    Contains,
    #[strum(to_string = "STARTS WITH")]
    StartsWith,
}

/// One `RETURN` projection item: a bare variable, a `var.prop`, or
/// `type(edgeVar)`, with an optional `AS alias`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnItem {
    pub expr: ReturnExpr,
    pub alias: Option<String>,
}

impl ReturnItem {
    /// The column name this item projects to when no `AS alias` is given.
    pub fn column_name(&self) -> String {
        match self.alias.clone() {
            Some(a) => a,
            None => self.expr.raw_text(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReturnExpr {
    Variable(String),
    Property { variable: String, property: String },
    EdgeType { variable: String },
}

impl ReturnExpr {
    pub fn raw_text(&self) -> String {
        match self {
            ReturnExpr::Variable(v) => v.clone(),
            ReturnExpr::Property { variable, property } => format!("{variable}.{property}"),
            ReturnExpr::EdgeType { variable } => format!("type({variable})"),
        }
    }

    pub fn variable(&self) -> &str {
        match self {
            ReturnExpr::Variable(v) => v,
            ReturnExpr::Property { variable, .. } => variable,
            ReturnExpr::EdgeType { variable } => variable,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// An `ORDER BY` key: a RETURN alias, a variable, a `var.prop`, or
/// `type(edgeVar)`, with an ASC/DESC direction (defaulting to ASC).
#[derive(Debug, Clone, PartialEq)]
pub struct SortItem {
    pub key: SortKey,
    pub direction: SortDirection,
}

/// A bare identifier sort key is ambiguous between a `RETURN ... AS alias`
/// and a pattern variable at parse time (both are just identifiers); it
/// always parses to `Variable` and is resolved against the projected
/// columns first, falling back to the pattern binding (see
/// `projection::resolve_sort_value`).
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    Variable(String),
    Property { variable: String, property: String },
    EdgeType { variable: String },
}
