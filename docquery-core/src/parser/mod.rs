//! Parser from query syntax trees to [`ParsedQuery`].
//!
//! The tree may come from [`crate::grammar`] or from a host that parsed the
//! whole document. Either way only node types and leaf text are consulted:
//! - first child of the first child: table name
//! - `OrderClause`, `LimitClause`: first match
//! - `FilterExpr`: every match, in source order
//! - `SelectClause`, `RenderClause`: first match

#[cfg(test)]
mod tests;

use crate::ast::{FilterOp, ParsedQuery, QueryFilter};
use crate::error::{QueryError, QueryResult};
use crate::grammar::parse_query_tree;
use crate::tree::{kind, ParseTree, Replacement};
use crate::value::Value;

/// Parse query text such as `page where name =~ /^Proj/ limit 2`.
pub fn parse_query_text(text: &str) -> QueryResult<ParsedQuery> {
    let tree = parse_query_tree(text)?;
    parse_query(&tree)
}

/// Build a [`ParsedQuery`] from a tree whose first child is the query node.
///
/// Only the clause tags (`TableName`, `FilterExpr`, ...) are checked; the
/// query node itself may carry any tag the host grammar gives it.
///
/// The input is left untouched; whitespace normalization runs on a copy.
pub fn parse_query(tree: &ParseTree) -> QueryResult<ParsedQuery> {
    let mut tree = tree.clone();
    normalize_whitespace(&mut tree);

    let query_node = tree
        .children
        .first()
        .ok_or_else(|| missing(&tree, "query clause"))?;
    let table_node = child(query_node, 0, kind::TABLE_NAME)?;
    let table = leaf_text(table_node)?.to_string();
    if table.is_empty() {
        return Err(QueryError::ParseError(format!(
            "Empty table name in {}",
            table_node.describe()
        )));
    }

    let mut parsed = ParsedQuery::new(table);

    if let Some(order_node) = query_node.find_node_of_type(kind::ORDER_CLAUSE) {
        let name_node = find_required(order_node, kind::NAME)?;
        parsed.order_by = Some(leaf_text(name_node)?.to_string());
        parsed.order_desc = match order_node.find_node_of_type(kind::ORDER_DIRECTION) {
            Some(direction) => leaf_text(direction)? == "desc",
            None => false,
        };
    }

    if let Some(limit_node) = query_node.find_node_of_type(kind::LIMIT_CLAUSE) {
        let number_node = find_required(limit_node, kind::NUMBER)?;
        parsed.limit = Some(decode_limit(number_node)?);
    }

    for filter_node in query_node.collect_nodes_of_type(kind::FILTER_EXPR) {
        parsed.filter.push(parse_filter(filter_node)?);
    }

    if let Some(select_node) = query_node.find_node_of_type(kind::SELECT_CLAUSE) {
        let fields = select_node
            .collect_nodes_of_type(kind::NAME)
            .into_iter()
            .map(|name| leaf_text(name).map(str::to_string))
            .collect::<QueryResult<Vec<_>>>()?;
        parsed.select = Some(fields);
    }

    if let Some(render_node) = query_node.find_node_of_type(kind::RENDER_CLAUSE) {
        let target = render_node
            .find_node_of_type(kind::PAGE_REF)
            .or_else(|| render_node.find_node_of_type(kind::STRING))
            .ok_or_else(|| missing(render_node, "PageRef or String"))?;
        parsed.render = match value_node_to_value(target)? {
            Value::String(s) | Value::PageRef(s) => Some(s),
            _ => None,
        };
    }

    Ok(parsed)
}

/// Decode a literal node (`Number`, `String`, `List`, ...) into a value.
pub fn value_node_to_value(node: &ParseTree) -> QueryResult<Value> {
    let node_type = node.node_type.as_deref().unwrap_or("");
    match node_type {
        kind::NUMBER => {
            let text = leaf_text(node)?;
            text.parse::<f64>().map(Value::Number).map_err(|_| {
                QueryError::ParseError(format!("Invalid number '{}' in {}", text, node.describe()))
            })
        }
        kind::BOOL => Ok(Value::Bool(leaf_text(node)? == "true")),
        kind::NULL => Ok(Value::Null),
        kind::NAME => Ok(Value::String(leaf_text(node)?.to_string())),
        kind::REGEX | kind::STRING => {
            let text = strip_delimiters(node, 1)?;
            Ok(Value::String(text.to_string()))
        }
        kind::PAGE_REF => {
            let text = strip_delimiters(node, 2)?;
            Ok(Value::PageRef(text.to_string()))
        }
        kind::LIST => node
            .collect_nodes_of_type(kind::VALUE)
            .into_iter()
            .map(|value_node| value_node_to_value(first_child(value_node)?))
            .collect::<QueryResult<Vec<_>>>()
            .map(Value::List),
        _ => Err(QueryError::ParseError(format!(
            "Unrecognized literal {}",
            node.describe()
        ))),
    }
}

/// Drop whitespace-only untyped leaves and trim the others.
fn normalize_whitespace(tree: &mut ParseTree) {
    tree.replace_nodes_matching(&mut |node| {
        if node.node_type.is_some() {
            return Replacement::Keep;
        }
        match node.text.as_mut() {
            Some(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Replacement::Remove;
                }
                if trimmed.len() != text.len() {
                    *text = trimmed.to_string();
                }
                Replacement::Keep
            }
            None => Replacement::Remove,
        }
    });
}

fn parse_filter(node: &ParseTree) -> QueryResult<QueryFilter> {
    let prop = leaf_text(child(node, 0, kind::NAME)?)?.to_string();

    let op_node = node
        .children
        .get(1)
        .ok_or_else(|| missing(node, "comparison operator"))?;
    let op_text = op_node
        .text
        .as_deref()
        .ok_or_else(|| missing(node, "comparison operator"))?;
    let op: FilterOp = op_text.parse()?;

    let value_node = child(node, 2, kind::VALUE)?;
    let value = value_node_to_value(first_child(value_node)?)?;

    Ok(QueryFilter { op, prop, value })
}

fn decode_limit(node: &ParseTree) -> QueryResult<usize> {
    let value = value_node_to_value(node)?;
    match value.as_f64() {
        Some(n) if n.is_finite() && n >= 0.0 && n.fract() == 0.0 => Ok(n as usize),
        _ => Err(QueryError::ParseError(format!(
            "Limit must be a non-negative integer, got '{}' in {}",
            value,
            node.describe()
        ))),
    }
}

fn missing(parent: &ParseTree, what: &str) -> QueryError {
    QueryError::ParseError(format!("Missing {} in {}", what, parent.describe()))
}

/// Child at `index`, which must have type `expected`.
fn child<'a>(parent: &'a ParseTree, index: usize, expected: &str) -> QueryResult<&'a ParseTree> {
    match parent.children.get(index) {
        Some(node) if node.is_type(expected) => Ok(node),
        Some(node) => Err(QueryError::ParseError(format!(
            "Expected {} in {}, found {}",
            expected,
            parent.describe(),
            node.describe()
        ))),
        None => Err(missing(parent, expected)),
    }
}

fn first_child(node: &ParseTree) -> QueryResult<&ParseTree> {
    node.children.first().ok_or_else(|| missing(node, "literal"))
}

fn find_required<'a>(parent: &'a ParseTree, node_type: &str) -> QueryResult<&'a ParseTree> {
    parent
        .find_node_of_type(node_type)
        .ok_or_else(|| missing(parent, node_type))
}

/// Text of the node's first child leaf.
fn leaf_text(node: &ParseTree) -> QueryResult<&str> {
    node.children
        .first()
        .and_then(|leaf| leaf.text.as_deref())
        .ok_or_else(|| missing(node, "text"))
}

/// Leaf text without `width` delimiter characters on each side.
fn strip_delimiters(node: &ParseTree, width: usize) -> QueryResult<&str> {
    let text = leaf_text(node)?;
    let mut chars = text.char_indices();
    let start = chars.nth(width).map(|(i, _)| i);
    let end = text
        .char_indices()
        .rev()
        .nth(width - 1)
        .map(|(i, _)| i);
    match (start, end) {
        (Some(start), Some(end)) if start <= end => Ok(&text[start..end]),
        _ => Err(QueryError::ParseError(format!(
            "Malformed literal '{}' in {}",
            text,
            node.describe()
        ))),
    }
}
