//! Tests for the query parser.

use super::*;

fn literal(node_type: &str, text: &str) -> ParseTree {
    ParseTree::node(node_type, vec![ParseTree::leaf(text)])
}

fn decode(text: &str) -> Value {
    let query = parse_query_text(&format!("t where x = {}", text)).unwrap();
    query.filter[0].value.clone()
}

#[test]
fn test_table_only() {
    let query = parse_query_text("page").unwrap();
    assert_eq!(query.table, "page");
    assert!(query.filter.is_empty());
    assert_eq!(query.order_by, None);
    assert!(!query.order_desc);
    assert_eq!(query.limit, None);
    assert_eq!(query.select, None);
    assert_eq!(query.render, None);
}

#[test]
fn test_full_query() {
    let query = parse_query_text(
        "page where name =~ /^Proj/ and done = false order by name desc limit 2 select name, done render [[template/table]]",
    )
    .unwrap();

    assert_eq!(query.table, "page");
    assert_eq!(
        query.filter,
        vec![
            QueryFilter::new("name", FilterOp::RegexMatch, "^Proj"),
            QueryFilter::new("done", FilterOp::Equal, false),
        ]
    );
    assert_eq!(query.order_by.as_deref(), Some("name"));
    assert!(query.order_desc);
    assert_eq!(query.limit, Some(2));
    assert_eq!(
        query.select,
        Some(vec!["name".to_string(), "done".to_string()])
    );
    assert_eq!(query.render.as_deref(), Some("template/table"));
}

#[test]
fn test_clause_order_is_free() {
    let a = parse_query_text("task limit 5 order by due where done = false").unwrap();
    let b = parse_query_text("task where done = false order by due limit 5").unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_order_defaults_to_ascending() {
    let query = parse_query_text("task order by due").unwrap();
    assert_eq!(query.order_by.as_deref(), Some("due"));
    assert!(!query.order_desc);

    let query = parse_query_text("task order by due asc").unwrap();
    assert!(!query.order_desc);
}

#[test]
fn test_filters_without_connectives() {
    let query = parse_query_text("task priority >= 2 done != true").unwrap();
    assert_eq!(query.filter.len(), 2);
    assert_eq!(query.filter[0].op, FilterOp::GreaterThanOrEqual);
    assert_eq!(query.filter[0].value, Value::Number(2.0));
    assert_eq!(query.filter[1].op, FilterOp::NotEqual);
}

#[test]
fn test_all_operators() {
    let query = parse_query_text(
        "t where a = 1 and b != 1 and c < 1 and d <= 1 and e > 1 and f >= 1 and g =~ /x/ and h !=~ /x/ and i in [1]",
    )
    .unwrap();
    let ops: Vec<_> = query.filter.iter().map(|f| f.op).collect();
    assert_eq!(
        ops,
        vec![
            FilterOp::Equal,
            FilterOp::NotEqual,
            FilterOp::LessThan,
            FilterOp::LessThanOrEqual,
            FilterOp::GreaterThan,
            FilterOp::GreaterThanOrEqual,
            FilterOp::RegexMatch,
            FilterOp::NotRegexMatch,
            FilterOp::In,
        ]
    );
}

#[test]
fn test_literal_decoding() {
    assert_eq!(decode("42"), Value::Number(42.0));
    assert_eq!(decode("-1.5"), Value::Number(-1.5));
    assert_eq!(decode("true"), Value::Bool(true));
    assert_eq!(decode("false"), Value::Bool(false));
    assert_eq!(decode("null"), Value::Null);
    assert_eq!(decode("someName"), Value::String("someName".to_string()));
    assert_eq!(decode("\"hello world\""), Value::String("hello world".to_string()));
    assert_eq!(decode("'single'"), Value::String("single".to_string()));
    assert_eq!(decode("\"\""), Value::String(String::new()));
    assert_eq!(decode("/^a.*b$/"), Value::String("^a.*b$".to_string()));
    assert_eq!(decode("[[Some Page]]"), Value::PageRef("Some Page".to_string()));
    assert_eq!(
        decode("[1, 2, 3]"),
        Value::List(vec![
            Value::Number(1.0),
            Value::Number(2.0),
            Value::Number(3.0)
        ])
    );
    assert_eq!(
        decode("[\"a\", [b, null], []]"),
        Value::List(vec![
            Value::String("a".to_string()),
            Value::List(vec![Value::String("b".to_string()), Value::Null]),
            Value::List(vec![]),
        ])
    );
}

#[test]
fn test_regex_escapes_are_kept() {
    assert_eq!(decode(r"/a\/b/"), Value::String(r"a\/b".to_string()));
}

#[test]
fn test_render_string() {
    let query = parse_query_text("page render \"[[tpl]]\"").unwrap();
    assert_eq!(query.render.as_deref(), Some("[[tpl]]"));
}

#[test]
fn test_limit_zero() {
    let query = parse_query_text("page limit 0").unwrap();
    assert_eq!(query.limit, Some(0));
}

#[test]
fn test_limit_must_be_integer() {
    let err = parse_query_text("page limit 2.5").unwrap_err();
    assert!(err.to_string().contains("non-negative integer"));
    assert!(parse_query_text("page limit -1").is_err());
}

#[test]
fn test_input_tree_is_not_modified() {
    let tree = parse_query_tree("  page   limit 1 ").unwrap();
    let before = tree.clone();
    let query = parse_query(&tree).unwrap();
    assert_eq!(query.limit, Some(1));
    assert_eq!(tree, before);
}

#[test]
fn test_host_tree_with_padded_leaves() {
    // Hosts may hand over leaves with surrounding whitespace and stray
    // whitespace nodes between structural children.
    let tree = ParseTree::node(
        "Directive",
        vec![
            ParseTree::leaf("\n"),
            ParseTree::node(
                kind::QUERY,
                vec![
                    literal(kind::TABLE_NAME, " task "),
                    ParseTree::leaf("   "),
                    ParseTree::node(
                        kind::FILTER_EXPR,
                        vec![
                            literal(kind::NAME, "tags"),
                            ParseTree::leaf(" "),
                            ParseTree::leaf(" = "),
                            ParseTree::leaf(" "),
                            ParseTree::node(kind::VALUE, vec![literal(kind::STRING, "\"x\"")]),
                        ],
                    ),
                ],
            ),
        ],
    );

    let query = parse_query(&tree).unwrap();
    assert_eq!(query.table, "task");
    assert_eq!(
        query.filter,
        vec![QueryFilter::new("tags", FilterOp::Equal, "x")]
    );
}

#[test]
fn test_missing_table_name() {
    let tree = ParseTree::node(
        kind::PROGRAM,
        vec![ParseTree::node(
            kind::QUERY,
            vec![ParseTree::node(kind::LIMIT_CLAUSE, vec![]).with_span(0, 7)],
        )
        .with_span(0, 7)],
    );
    let err = parse_query(&tree).unwrap_err();
    assert_eq!(
        err,
        QueryError::ParseError(
            "Expected TableName in Query at 0..7, found LimitClause at 0..7".to_string()
        )
    );
}

#[test]
fn test_missing_query_node() {
    let err = parse_query(&ParseTree::node(kind::PROGRAM, vec![])).unwrap_err();
    assert_eq!(
        err,
        QueryError::ParseError("Missing query clause in Program".to_string())
    );
}

#[test]
fn test_query_node_tag_is_not_checked() {
    let tree = ParseTree::node(
        kind::PROGRAM,
        vec![ParseTree::node(
            "QueryExpr",
            vec![
                literal(kind::TABLE_NAME, "page"),
                ParseTree::node(
                    kind::LIMIT_CLAUSE,
                    vec![ParseTree::leaf("limit"), literal(kind::NUMBER, "3")],
                ),
            ],
        )],
    );
    let query = parse_query(&tree).unwrap();
    assert_eq!(query.table, "page");
    assert_eq!(query.limit, Some(3));
}

#[test]
fn test_malformed_filter_expr() {
    let tree = ParseTree::node(
        kind::PROGRAM,
        vec![ParseTree::node(
            kind::QUERY,
            vec![
                literal(kind::TABLE_NAME, "page"),
                ParseTree::node(
                    kind::FILTER_EXPR,
                    vec![literal(kind::NAME, "x"), ParseTree::leaf("==")],
                ),
            ],
        )],
    );
    let err = parse_query(&tree).unwrap_err();
    assert_eq!(
        err,
        QueryError::ParseError("Unknown filter operator '=='".to_string())
    );
}

#[test]
fn test_unrecognized_literal() {
    let err = value_node_to_value(&literal("Date", "2024-01-01")).unwrap_err();
    assert_eq!(
        err,
        QueryError::ParseError("Unrecognized literal Date".to_string())
    );
}

#[test]
fn test_text_errors_carry_offsets() {
    let err = parse_query_text("page where name = ").unwrap_err();
    assert_eq!(
        err,
        QueryError::ParseError("Expected a value, found end of query at offset 18".to_string())
    );
}
