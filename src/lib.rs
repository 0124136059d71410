//! An in-memory, typed, directed multigraph with a Cypher-inspired
//! pattern-matching engine.
//!
//! [`Graph`] is the store: typed nodes keyed by id, typed directed
//! multi-edges with per-edge properties, and the forward/reverse adjacency
//! the query engine walks. The query subset is parsed from a string
//! (`person-[:WORKS_FOR]->team WHERE team.size > 10 RETURN person.name`)
//! into an AST, evaluated into row bindings, and exposed through four
//! entry points: [`Graph::match_pattern`], [`Graph::match_rows`],
//! [`Graph::match_paths`], [`Graph::match_many`].
//!
//! ```
//! use pattern_graph::{Graph, Node, QueryOptions};
//! use indexmap::IndexMap;
//!
//! let mut g = Graph::new();
//! g.upsert_node(Node::new("alice", "Person", "Alice"));
//! g.upsert_node(Node::new("eng", "Team", "Engineering"));
//! g.add_edge("alice", "WORKS_FOR", "eng", IndexMap::new()).unwrap();
//!
//! let rows = g.match_rows("p:Person-[:WORKS_FOR]->t:Team", &QueryOptions::default()).unwrap();
//! assert_eq!(rows.len(), 1);
//! ```

pub mod error;
pub mod graph;
pub mod query;
pub mod value;

pub use error::{GraphError, Result};
pub use graph::{EdgeView, Graph, Node, TypeFilter};
pub use query::ast::Query;
pub use query::row::{EdgeBinding, PathEdge, PathMatch, Row};
pub use query::{CancellationToken, QueryOptions};
pub use value::Value;
