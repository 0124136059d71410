//! End-to-end coverage of the public `Graph` query API against the worked
//! scenarios and universal invariants this crate is expected to satisfy.

use indexmap::IndexMap;
use pattern_graph::{CancellationToken, Graph, GraphError, Node, QueryOptions};

fn org_graph() -> Graph {
    let mut g = Graph::new();
    for (id, label) in [
        ("alice", "Alice"),
        ("bob", "Bob"),
        ("charlie", "Charlie"),
    ] {
        g.upsert_node(Node::new(id, "Person", label));
    }
    g.upsert_node(Node::new("eng", "Team", "Engineering"));
    g.upsert_node(Node::new("design", "Team", "Design"));
    g.upsert_node(Node::new("web", "Project", "Web"));
    g.upsert_node(Node::new("mobile", "Project", "Mobile"));

    g.add_edge("alice", "WORKS_FOR", "eng", IndexMap::new()).unwrap();
    g.add_edge("bob", "WORKS_FOR", "eng", IndexMap::new()).unwrap();
    g.add_edge("charlie", "MANAGES", "eng", IndexMap::new()).unwrap();
    g.add_edge("charlie", "MANAGES", "design", IndexMap::new()).unwrap();
    g.add_edge("eng", "ASSIGNED_TO", "web", IndexMap::new()).unwrap();
    g.add_edge("eng", "ASSIGNED_TO", "mobile", IndexMap::new()).unwrap();
    g.add_edge("design", "ASSIGNED_TO", "mobile", IndexMap::new()).unwrap();
    g.add_edge("alice", "LEADS", "web", IndexMap::new()).unwrap();
    g
}

fn chain_graph() -> Graph {
    let mut g = Graph::new();
    for id in ["a", "b", "c", "d", "x"] {
        g.upsert_node(Node::new(id, "Node", id));
    }
    g.add_edge("a", "R", "b", IndexMap::new()).unwrap();
    g.add_edge("b", "R", "c", IndexMap::new()).unwrap();
    g.add_edge("c", "R", "d", IndexMap::new()).unwrap();
    g.add_edge("a", "R", "b", IndexMap::new()).unwrap(); // duplicate, deduped
    g.add_edge("b", "S", "x", IndexMap::new()).unwrap();
    g
}

fn salary_graph() -> Graph {
    let mut g = Graph::new();
    g.upsert_node(Node::new("p1", "Person", "P1").with_property("salary", 80_000i64));
    g.upsert_node(Node::new("p2", "Person", "P2").with_property("salary", 90_000i64));
    g.upsert_node(Node::new("p3", "Person", "P3").with_property("salary", 100_000i64));
    g
}

#[test]
fn typed_seed_returns_every_node_of_that_type() {
    let g = org_graph();
    let result = g.match_pattern("person:Person", &QueryOptions::default()).unwrap();
    let people: std::collections::HashSet<_> = result["person"].iter().cloned().collect();
    assert_eq!(
        people,
        ["alice", "bob", "charlie"].into_iter().map(String::from).collect()
    );
}

#[test]
fn single_hop_pattern_binds_both_ends() {
    let g = org_graph();
    let result = g
        .match_pattern("person-[:WORKS_FOR]->team", &QueryOptions::default())
        .unwrap();
    let people: std::collections::HashSet<_> = result["person"].iter().cloned().collect();
    assert_eq!(people, ["alice", "bob"].into_iter().map(String::from).collect());
    assert_eq!(result["team"].iter().cloned().collect::<Vec<_>>(), vec!["eng".to_string()]);
}

#[test]
fn two_hop_pattern_produces_the_cartesian_rows() {
    let g = org_graph();
    let rows = g
        .match_rows(
            "person-[:WORKS_FOR]->team-[:ASSIGNED_TO]->project",
            &QueryOptions::default(),
        )
        .unwrap();
    assert_eq!(rows.len(), 4);
    let pairs: std::collections::HashSet<(String, String)> = rows
        .iter()
        .map(|r| {
            (
                r["person"].as_str().unwrap().to_string(),
                r["project"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    assert!(pairs.contains(&("alice".to_string(), "web".to_string())));
    assert!(pairs.contains(&("alice".to_string(), "mobile".to_string())));
    assert!(pairs.contains(&("bob".to_string(), "web".to_string())));
    assert!(pairs.contains(&("bob".to_string(), "mobile".to_string())));
}

#[test]
fn backward_paths_from_a_start_id_carry_correct_edge_orientation() {
    let g = org_graph();
    let mut opts = QueryOptions::default();
    opts.start_ids = Some(vec!["web".to_string()]);
    let paths = g
        .match_paths(
            "project<-[:ASSIGNED_TO]-team<-[:WORKS_FOR]-person",
            &opts,
        )
        .unwrap();
    assert_eq!(paths.len(), 2);
    for path in &paths {
        assert_eq!(path.edges.len(), 2);
        let first = &path.edges[0];
        assert_eq!(first.src, "eng");
        assert_eq!(first.dst, "web");
        assert_eq!(first.from_variable, "team");
        assert_eq!(first.to_variable, "project");
        let second = &path.edges[1];
        assert_eq!(second.dst, "eng");
        assert_eq!(second.from_variable, "person");
        assert_eq!(second.to_variable, "team");
    }
}

#[test]
fn union_edge_types_match_either_relationship() {
    let g = org_graph();
    let result = g
        .match_pattern("person-[:WORKS_FOR|MANAGES]->team", &QueryOptions::default())
        .unwrap();
    let people: std::collections::HashSet<_> = result["person"].iter().cloned().collect();
    let teams: std::collections::HashSet<_> = result["team"].iter().cloned().collect();
    assert_eq!(
        people,
        ["alice", "bob", "charlie"].into_iter().map(String::from).collect()
    );
    assert_eq!(teams, ["eng", "design"].into_iter().map(String::from).collect());
}

#[test]
fn variable_length_segment_enumerates_every_hop_count_in_range() {
    let g = chain_graph();
    let mut opts = QueryOptions::default();
    opts.start_ids = Some(vec!["a".to_string()]);
    let paths = g.match_paths("n1-[:R*1..3]->n2", &opts).unwrap();
    assert_eq!(paths.len(), 3);
    let mut hop_counts: Vec<usize> = paths.iter().map(|p| p.edges.len()).collect();
    hop_counts.sort();
    assert_eq!(hop_counts, vec![1, 2, 3]);
    let endpoints: std::collections::HashSet<_> =
        paths.iter().map(|p| p.nodes["n2"].clone()).collect();
    assert_eq!(
        endpoints,
        ["b", "c", "d"].into_iter().map(String::from).collect()
    );
}

#[test]
fn edge_type_introspection_constrains_multi_hop_consistency() {
    let g = chain_graph();
    let mut opts = QueryOptions::default();
    opts.start_ids = Some(vec!["a".to_string()]);
    let result = g
        .match_pattern(
            "n1-[r]->n2-[r2]->n3 WHERE type(r) = \"R\" AND type(r2) = type(r)",
            &opts,
        )
        .unwrap();
    // the b-S->x branch never satisfies type(r2) = "R", so n3 is just {c}
    assert_eq!(result["n3"].iter().cloned().collect::<Vec<_>>(), vec!["c".to_string()]);
}

#[test]
fn where_clause_then_projection_then_sort_then_limit_compose() {
    let g = salary_graph();
    let rows = g
        .match_rows(
            "p:Person WHERE p.salary > 85000 RETURN p.salary AS s ORDER BY s DESC LIMIT 1",
            &QueryOptions::default(),
        )
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["s"], pattern_graph::Value::Int(100_000));
}

#[test]
fn empty_graph_yields_an_empty_binding_not_an_error() {
    let g = Graph::new();
    let result = g.match_pattern("x:Anything", &QueryOptions::default()).unwrap();
    assert!(result["x"].is_empty());
}

#[test]
fn start_ids_union_matches_the_union_of_single_id_queries() {
    let g = org_graph();
    let mut both = QueryOptions::default();
    both.start_ids = Some(vec!["alice".to_string(), "bob".to_string()]);
    let union_result = g
        .match_pattern("person-[:WORKS_FOR]->team", &both)
        .unwrap();

    let mut only_alice = QueryOptions::default();
    only_alice.start_ids = Some(vec!["alice".to_string()]);
    let a = g.match_pattern("person-[:WORKS_FOR]->team", &only_alice).unwrap();

    let mut only_bob = QueryOptions::default();
    only_bob.start_ids = Some(vec!["bob".to_string()]);
    let b = g.match_pattern("person-[:WORKS_FOR]->team", &only_bob).unwrap();

    let mut expected: std::collections::HashSet<String> = a["person"].iter().cloned().collect();
    expected.extend(b["person"].iter().cloned());
    let got: std::collections::HashSet<String> = union_result["person"].iter().cloned().collect();
    assert_eq!(got, expected);
}

#[test]
fn repeated_evaluation_is_byte_for_byte_deterministic() {
    let g = org_graph();
    let query = "person-[:WORKS_FOR]->team-[:ASSIGNED_TO]->project";
    let first = g.match_rows(query, &QueryOptions::default()).unwrap();
    let second = g.match_rows(query, &QueryOptions::default()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn match_many_unions_independent_patterns_by_variable() {
    let g = org_graph();
    let result = g
        .match_many(
            &["person-[:WORKS_FOR]->team", "person-[:MANAGES]->team"],
            &QueryOptions::default(),
        )
        .unwrap();
    let people: std::collections::HashSet<_> = result["person"].iter().cloned().collect();
    assert_eq!(
        people,
        ["alice", "bob", "charlie"].into_iter().map(String::from).collect()
    );
}

#[test]
fn unknown_variable_in_where_is_a_reference_error_not_a_silent_filter() {
    let g = org_graph();
    let err = g
        .match_rows("p:Person WHERE q.name = \"x\"", &QueryOptions::default())
        .unwrap_err();
    assert!(matches!(err, GraphError::UnknownVariable { name } if name == "q"));
}

#[test]
fn malformed_pattern_is_a_parse_error_with_a_position() {
    let g = org_graph();
    let err = g.match_rows("p:Person WHERE (p.x = 1", &QueryOptions::default()).unwrap_err();
    assert!(matches!(err, GraphError::Parse { .. }));
}

#[test]
fn row_limit_rejects_oversized_result_sets() {
    let g = org_graph();
    let mut opts = QueryOptions::default();
    opts.row_limit = Some(1);
    let err = g.match_rows("person:Person", &opts).unwrap_err();
    assert!(matches!(err, GraphError::ResultTooLarge { limit: 1 }));
}

#[test]
fn cancellation_aborts_before_any_row_is_produced() {
    let g = org_graph();
    let token = CancellationToken::new();
    token.cancel();
    let mut opts = QueryOptions::default();
    opts.cancellation = Some(token);
    let err = g.match_rows("person:Person", &opts).unwrap_err();
    assert!(matches!(err, GraphError::Cancelled));
}

#[test]
fn skip_and_limit_slice_the_fully_ordered_result() {
    let g = salary_graph();
    let full = g
        .match_rows(
            "p:Person RETURN p.salary AS s ORDER BY s ASC",
            &QueryOptions::default(),
        )
        .unwrap();
    let paged = g
        .match_rows(
            "p:Person RETURN p.salary AS s ORDER BY s ASC SKIP 1 LIMIT 1",
            &QueryOptions::default(),
        )
        .unwrap();
    assert_eq!(paged, full[1..2].to_vec());
}

#[test]
fn inline_node_property_filter_narrows_the_seed_set() {
    let g = salary_graph();
    let result = g
        .match_pattern("p:Person{salary=90000}", &QueryOptions::default())
        .unwrap();
    assert_eq!(result["p"].iter().cloned().collect::<Vec<_>>(), vec!["p2".to_string()]);
}

#[test]
fn strict_edge_insertion_rejects_a_missing_endpoint() {
    let mut g = Graph::new();
    g.upsert_node(Node::new("a", "Node", "A"));
    let err = g.add_edge("a", "R", "ghost", IndexMap::new()).unwrap_err();
    assert!(matches!(err, GraphError::MissingEndpoint { id } if id == "ghost"));
}
