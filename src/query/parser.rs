//! A `nom` combinator parser for the Cypher subset this crate accepts.
//! Produces a [`Query`] AST or a structured `ParseError` carrying a byte
//! position and message — never a raw `nom` error type, which does not
//! cross the crate boundary.

use super::ast::*;
use crate::error::GraphError;
use nom::branch::alt;
use nom::bytes::complete::{escaped_transform, tag, tag_no_case, take_while1};
use nom::character::complete::{char, digit1, multispace0, one_of};
use nom::combinator::{cut, map, map_res, opt, recognize, success, value};
use nom::multi::{many0, separated_list0, separated_list1};
use nom::sequence::{delimited, pair, preceded, separated_pair, tuple};
use nom::IResult;

type PResult<'a, T> = IResult<&'a str, T>;

/// Parses a full query string. `input` is the original, un-trimmed text; the
/// returned error's `position` is a byte offset into it.
pub fn parse_query(input: &str) -> Result<Query, GraphError> {
    match query(input) {
        Ok((rest, q)) => {
            let (rest2, _) = multispace0::<&str, nom::error::Error<&str>>(rest).unwrap();
            if !rest2.is_empty() {
                return Err(GraphError::Parse {
                    position: offset(input, rest2),
                    message: format!("unexpected trailing input: `{rest2}`"),
                });
            }
            Ok(q)
        }
        Err(e) => Err(to_parse_error(input, e)),
    }
}

fn offset(original: &str, remaining: &str) -> usize {
    original.len() - remaining.len()
}

fn to_parse_error(original: &str, err: nom::Err<nom::error::Error<&str>>) -> GraphError {
    match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => GraphError::Parse {
            position: offset(original, e.input),
            message: format!("unexpected input near `{}`", first_token(e.input)),
        },
        nom::Err::Incomplete(_) => GraphError::Parse {
            position: original.len(),
            message: "unexpected end of query".to_string(),
        },
    }
}

fn first_token(s: &str) -> &str {
    let s = s.trim_start();
    let end = s.find(char::is_whitespace).unwrap_or(s.len()).min(24);
    &s[..end]
}

// --- identifier -------------------------------------------------------

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}
fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn identifier(i: &str) -> PResult<String> {
    let (rest, s) = recognize(pair(
        nom::character::complete::satisfy(is_ident_start),
        nom::bytes::complete::take_while(is_ident_continue),
    ))(i)?;
    Ok((rest, s.to_string()))
}

fn ws_identifier(i: &str) -> PResult<String> {
    preceded(multispace0, identifier)(i)
}

// --- literals ----------------------------------------------------------

fn quoted_string(i: &str) -> PResult<String> {
    delimited(
        char('"'),
        map(
            opt(escaped_transform(
                nom::bytes::complete::is_not("\"\\"),
                '\\',
                alt((
                    value("\\", tag("\\")),
                    value("\"", tag("\"")),
                    value("\n", tag("n")),
                )),
            )),
            |s: Option<String>| s.unwrap_or_default(),
        ),
        char('"'),
    )(i)
}

fn number_literal(i: &str) -> PResult<Literal> {
    let (rest, text) = recognize(tuple((
        opt(char('-')),
        digit1,
        opt(pair(char('.'), digit1)),
    )))(i)?;
    if text.contains('.') {
        let v: f64 = text.parse().map_err(|_| {
            nom::Err::Error(nom::error::Error::new(i, nom::error::ErrorKind::Float))
        })?;
        Ok((rest, Literal::Real(v)))
    } else {
        let v: i64 = text.parse().map_err(|_| {
            nom::Err::Error(nom::error::Error::new(i, nom::error::ErrorKind::Digit))
        })?;
        Ok((rest, Literal::Int(v)))
    }
}

fn bool_literal(i: &str) -> PResult<Literal> {
    alt((
        value(Literal::Bool(true), tag_no_case("true")),
        value(Literal::Bool(false), tag_no_case("false")),
    ))(i)
}

fn typed_literal(i: &str) -> PResult<Literal> {
    preceded(
        multispace0,
        alt((
            bool_literal,
            number_literal,
            map(quoted_string, Literal::String),
        )),
    )(i)
}

/// A filter value: unquoted values are matched as strings and quoted values
/// preserve spaces; both collapse to a `String` literal (see `DESIGN.md`
/// for the property-filter string-coercion rule).
fn filter_value(i: &str) -> PResult<Literal> {
    preceded(
        multispace0,
        alt((
            map(quoted_string, Literal::String),
            map(
                take_while1(|c: char| !matches!(c, ',' | '}' | ']' | ' ' | '\t' | '\n')),
                |s: &str| Literal::String(s.to_string()),
            ),
        )),
    )(i)
}

// --- node / edge patterns ----------------------------------------------

fn prop_filter(i: &str) -> PResult<PropFilter> {
    let (i, key) = ws_identifier(i)?;
    let (i, op_char) = preceded(multispace0, one_of("=:~"))(i)?;
    let op = if op_char == '~' {
        FilterOp::ContainsCi
    } else {
        FilterOp::Equals
    };
    let (i, value) = filter_value(i)?;
    Ok((i, PropFilter { key, op, value }))
}

fn filter_block(i: &str) -> PResult<Vec<PropFilter>> {
    preceded(
        multispace0,
        delimited(
            char('{'),
            separated_list0(preceded(multispace0, char(',')), prop_filter),
            preceded(multispace0, char('}')),
        ),
    )(i)
}

fn node_elem(i: &str) -> PResult<NodeElem> {
    let (i, variable) = opt(ws_identifier)(i)?;
    let (i, node_type) = opt(preceded(
        preceded(multispace0, char(':')),
        preceded(multispace0, identifier),
    ))(i)?;
    let (i, filters) = map(opt(filter_block), |f| f.unwrap_or_default())(i)?;
    Ok((
        i,
        NodeElem {
            variable,
            node_type,
            filters,
        },
    ))
}

fn type_list(i: &str) -> PResult<Vec<String>> {
    separated_list1(char('|'), preceded(multispace0, identifier))(i)
}

fn uint(i: &str) -> PResult<u32> {
    map_res(digit1, |s: &str| s.parse::<u32>())(i)
}

fn quantifier(i: &str) -> PResult<Quantifier> {
    let (i, _) = char('*')(i)?;
    let min_max_max = map(
        pair(uint, opt(preceded(tag(".."), opt(uint)))),
        |(min, rest)| match rest {
            None => (min, Some(min)),
            Some(max) => (min, max),
        },
    );
    let open_max = map(preceded(tag(".."), uint), |max| (1u32, Some(max)));
    let bare = success((1u32, None));
    let (i, (min, max)) = alt((min_max_max, open_max, bare))(i)?;
    if let Some(max) = max {
        if max < min {
            return Err(nom::Err::Failure(nom::error::Error::new(
                i,
                nom::error::ErrorKind::Verify,
            )));
        }
    }
    Ok((i, Quantifier { min, max }))
}

struct EdgeBody {
    variable: Option<String>,
    types: Option<Vec<String>>,
    quantifier: Option<Quantifier>,
    filters: Vec<PropFilter>,
}

fn edge_body_inner(i: &str) -> PResult<EdgeBody> {
    let (i, variable) = opt(preceded(multispace0, identifier))(i)?;
    let (i, types) = opt(preceded(preceded(multispace0, char(':')), type_list))(i)?;
    let (i, quantifier) = opt(preceded(multispace0, quantifier))(i)?;
    let (i, filters) = map(opt(filter_block), |f| f.unwrap_or_default())(i)?;
    Ok((
        i,
        EdgeBody {
            variable,
            types,
            quantifier,
            filters,
        },
    ))
}

fn edge_body(i: &str) -> PResult<EdgeBody> {
    delimited(
        preceded(multispace0, char('[')),
        edge_body_inner,
        preceded(multispace0, char(']')),
    )(i)
}

fn build_edge(direction: EdgeDirection, body: Option<EdgeBody>) -> EdgeElem {
    match body {
        Some(b) => EdgeElem {
            variable: b.variable,
            direction,
            types: b.types,
            quantifier: b.quantifier,
            filters: b.filters,
        },
        None => EdgeElem {
            variable: None,
            direction,
            types: None,
            quantifier: None,
            filters: Vec::new(),
        },
    }
}

fn backward_edge(i: &str) -> PResult<EdgeElem> {
    let (i, _) = preceded(multispace0, tag("<-"))(i)?;
    let (i, body) = opt(edge_body)(i)?;
    let (i, _) = preceded(multispace0, char('-'))(i)?;
    Ok((i, build_edge(EdgeDirection::Backward, body)))
}

fn forward_edge(i: &str) -> PResult<EdgeElem> {
    let (i, _) = preceded(multispace0, char('-'))(i)?;
    let (i, body) = opt(edge_body)(i)?;
    let (i, _) = preceded(multispace0, tag("->"))(i)?;
    Ok((i, build_edge(EdgeDirection::Forward, body)))
}

fn either_edge(i: &str) -> PResult<EdgeElem> {
    let (i, _) = preceded(multispace0, char('-'))(i)?;
    let (i, body) = opt(edge_body)(i)?;
    let (i, _) = preceded(multispace0, char('-'))(i)?;
    Ok((i, build_edge(EdgeDirection::Either, body)))
}

fn edge_elem(i: &str) -> PResult<EdgeElem> {
    alt((backward_edge, forward_edge, either_edge))(i)
}

fn pattern(i: &str) -> PResult<Pattern> {
    let (i, first) = node_elem(i)?;
    let (i, rest) = many0(pair(edge_elem, cut(node_elem)))(i)?;
    let mut elements = vec![PatternElem::Node(first)];
    for (e, n) in rest {
        elements.push(PatternElem::Edge(e));
        elements.push(PatternElem::Node(n));
    }
    Ok((i, Pattern { elements }))
}

// --- WHERE expression ----------------------------------------------------

fn type_call(i: &str) -> PResult<String> {
    preceded(
        preceded(multispace0, tag_no_case("type")),
        delimited(
            preceded(multispace0, char('(')),
            preceded(multispace0, identifier),
            preceded(multispace0, char(')')),
        ),
    )(i)
}

fn property_access(i: &str) -> PResult<(String, String)> {
    separated_pair(
        ws_identifier,
        preceded(multispace0, char('.')),
        preceded(multispace0, identifier),
    )(i)
}

fn operand(i: &str) -> PResult<Operand> {
    alt((
        map(type_call, |variable| Operand::EdgeType { variable }),
        map(property_access, |(variable, property)| Operand::Property {
            variable,
            property,
        }),
        map(typed_literal, Operand::Literal),
    ))(i)
}

fn compare_op(i: &str) -> PResult<CompareOp> {
    preceded(
        multispace0,
        alt((
            value(CompareOp::StartsWith, tag_no_case("STARTS WITH")),
            value(CompareOp::Contains, tag_no_case("CONTAINS")),
            value(CompareOp::Le, tag("<=")),
            value(CompareOp::Ge, tag(">=")),
            value(CompareOp::Ne, tag("!=")),
            value(CompareOp::Eq, tag("=")),
            value(CompareOp::Lt, tag("<")),
            value(CompareOp::Gt, tag(">")),
        )),
    )(i)
}

fn comparison(i: &str) -> PResult<Expr> {
    let (i, left) = operand(i)?;
    let (i, op) = compare_op(i)?;
    let (i, right) = cut(operand)(i)?;
    Ok((i, Expr::Comparison { left, op, right }))
}

fn atom(i: &str) -> PResult<Expr> {
    alt((
        delimited(
            preceded(multispace0, char('(')),
            where_expr,
            cut(preceded(multispace0, char(')'))),
        ),
        comparison,
    ))(i)
}

fn and_expr(i: &str) -> PResult<Expr> {
    let (i, first) = atom(i)?;
    let (i, rest) = many0(preceded(preceded(multispace0, tag_no_case("AND")), cut(atom)))(i)?;
    Ok((i, rest.into_iter().fold(first, |acc, e| Expr::And(Box::new(acc), Box::new(e)))))
}

fn where_expr(i: &str) -> PResult<Expr> {
    let (i, first) = and_expr(i)?;
    let (i, rest) = many0(preceded(preceded(multispace0, tag_no_case("OR")), cut(and_expr)))(i)?;
    Ok((i, rest.into_iter().fold(first, |acc, e| Expr::Or(Box::new(acc), Box::new(e)))))
}

// --- RETURN / ORDER BY --------------------------------------------------

fn return_expr(i: &str) -> PResult<ReturnExpr> {
    alt((
        map(type_call, |variable| ReturnExpr::EdgeType { variable }),
        map(property_access, |(variable, property)| ReturnExpr::Property {
            variable,
            property,
        }),
        map(ws_identifier, ReturnExpr::Variable),
    ))(i)
}

fn return_item(i: &str) -> PResult<ReturnItem> {
    let (i, expr) = return_expr(i)?;
    let (i, alias) = opt(preceded(
        preceded(multispace0, tag_no_case("AS")),
        cut(ws_identifier),
    ))(i)?;
    Ok((i, ReturnItem { expr, alias }))
}

fn return_clause(i: &str) -> PResult<Vec<ReturnItem>> {
    preceded(
        preceded(multispace0, tag_no_case("RETURN")),
        cut(separated_list1(preceded(multispace0, char(',')), return_item)),
    )(i)
}

fn sort_key(i: &str) -> PResult<SortKey> {
    alt((
        map(type_call, |variable| SortKey::EdgeType { variable }),
        map(property_access, |(variable, property)| SortKey::Property {
            variable,
            property,
        }),
        map(ws_identifier, SortKey::Variable),
    ))(i)
}

fn sort_item(i: &str) -> PResult<SortItem> {
    let (i, key) = sort_key(i)?;
    let (i, direction) = opt(preceded(
        multispace0,
        alt((
            value(SortDirection::Asc, tag_no_case("ASC")),
            value(SortDirection::Desc, tag_no_case("DESC")),
        )),
    ))(i)?;
    Ok((
        i,
        SortItem {
            key,
            direction: direction.unwrap_or(SortDirection::Asc),
        },
    ))
}

fn order_by_clause(i: &str) -> PResult<Vec<SortItem>> {
    preceded(
        pair(
            preceded(multispace0, tag_no_case("ORDER")),
            preceded(multispace0, tag_no_case("BY")),
        ),
        cut(separated_list1(preceded(multispace0, char(',')), sort_item)),
    )(i)
}

fn uint64(i: &str) -> PResult<u64> {
    map_res(digit1, |s: &str| s.parse::<u64>())(i)
}

fn skip_clause(i: &str) -> PResult<u64> {
    preceded(
        preceded(multispace0, tag_no_case("SKIP")),
        cut(preceded(multispace0, uint64)),
    )(i)
}

fn limit_clause(i: &str) -> PResult<u64> {
    preceded(
        preceded(multispace0, tag_no_case("LIMIT")),
        cut(preceded(multispace0, uint64)),
    )(i)
}

fn query(i: &str) -> PResult<Query> {
    let (i, _) = opt(preceded(multispace0, tag_no_case("MATCH")))(i)?;
    let (i, pattern) = preceded(multispace0, pattern)(i)?;
    let (i, where_clause) = opt(preceded(
        preceded(multispace0, tag_no_case("WHERE")),
        cut(where_expr),
    ))(i)?;
    let (i, return_items) = opt(return_clause)(i)?;
    let (i, order_by) = map(opt(order_by_clause), |o| o.unwrap_or_default())(i)?;
    let (i, skip) = opt(skip_clause)(i)?;
    let (i, limit) = opt(limit_clause)(i)?;
    Ok((
        i,
        Query {
            pattern,
            where_clause,
            return_items,
            order_by,
            skip,
            limit,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_typed_node() {
        let q = parse_query("person:Person").unwrap();
        assert_eq!(q.pattern.elements.len(), 1);
    }

    #[test]
    fn parses_single_hop_pattern() {
        let q = parse_query("person-[:WORKS_FOR]->team").unwrap();
        assert_eq!(q.pattern.elements.len(), 3);
        let PatternElem::Edge(e) = &q.pattern.elements[1] else {
            panic!("expected edge")
        };
        assert_eq!(e.direction, EdgeDirection::Forward);
        assert_eq!(e.types.as_deref(), Some(&["WORKS_FOR".to_string()][..]));
    }

    #[test]
    fn parses_union_types_and_var_length() {
        let q = parse_query("a-[:R|S*1..3]->b").unwrap();
        let PatternElem::Edge(e) = &q.pattern.elements[1] else {
            panic!()
        };
        assert_eq!(e.types.as_deref().unwrap(), &["R", "S"]);
        assert_eq!(e.quantifier, Some(Quantifier { min: 1, max: Some(3) }));
    }

    #[test]
    fn rejects_inverted_quantifier_range() {
        assert!(parse_query("a-[:R*5..1]->b").is_err());
    }

    #[test]
    fn parses_where_and_return_and_order_and_limit() {
        let q = parse_query(
            r#"p:Person WHERE p.salary > 85000 RETURN p.salary AS s ORDER BY s DESC LIMIT 1"#,
        )
        .unwrap();
        assert!(q.where_clause.is_some());
        assert_eq!(q.return_items.unwrap().len(), 1);
        assert_eq!(q.order_by[0].direction, SortDirection::Desc);
        assert_eq!(q.limit, Some(1));
    }

    #[test]
    fn parses_backward_and_either_edges() {
        let q = parse_query("project<-[:ASSIGNED_TO]-team").unwrap();
        let PatternElem::Edge(e) = &q.pattern.elements[1] else {
            panic!()
        };
        assert_eq!(e.direction, EdgeDirection::Backward);

        let q2 = parse_query("a-[r]-b").unwrap();
        let PatternElem::Edge(e2) = &q2.pattern.elements[1] else {
            panic!()
        };
        assert_eq!(e2.direction, EdgeDirection::Either);
        assert_eq!(e2.variable.as_deref(), Some("r"));
    }

    #[test]
    fn reports_position_on_unmatched_paren() {
        let err = parse_query("a WHERE (a.x = 1").unwrap_err();
        assert!(matches!(err, GraphError::Parse { .. }));
    }
}
