//! Query grammar: directive argument text to syntax tree.
//!
//! ```text
//! Query        := TableName Clause*
//! Clause       := ("where" | "and")? FilterExpr | OrderClause | LimitClause
//!               | SelectClause | RenderClause
//! FilterExpr   := Name CompareOp Value
//! OrderClause  := "order" "by" Name ("asc" | "desc")?
//! LimitClause  := "limit" Number
//! SelectClause := "select" Name ("," Name)*
//! RenderClause := "render" (PageRef | String)
//! Value        := Number | Bool | Null | Name | Regex | String | PageRef | List
//! List         := "[" (Value ("," Value)*)? "]"
//! ```
//!
//! The tree keeps every token as an untyped leaf, whitespace included, so
//! rendering the tree reproduces the source text exactly.

use crate::error::{QueryError, QueryResult};
use crate::lexer::{tokenize, Spanned, Token};
use crate::tree::{kind, ParseTree};

/// Words that start a clause and therefore cannot name a field.
const CLAUSE_KEYWORDS: &[&str] = &["where", "and", "order", "limit", "select", "render"];

/// Build the syntax tree of a query: `Program` → `Query` → clauses.
pub fn parse_query_tree(source: &str) -> QueryResult<ParseTree> {
    let tokens = tokenize(source)?;
    TreeBuilder::new(source, tokens).parse_program()
}

struct TreeBuilder<'a> {
    source: &'a str,
    tokens: Vec<Spanned>,
    position: usize,
}

impl<'a> TreeBuilder<'a> {
    fn new(source: &'a str, tokens: Vec<Spanned>) -> Self {
        Self {
            source,
            tokens,
            position: 0,
        }
    }

    fn current(&self) -> &Spanned {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.position.min(last)]
    }

    fn current_token(&self) -> &Token {
        &self.current().token
    }

    /// First token at or after the current one that is not whitespace.
    fn peek_past_whitespace(&self) -> &Token {
        self.tokens[self.position..]
            .iter()
            .map(|s| &s.token)
            .find(|t| !matches!(t, Token::Whitespace(_)))
            .unwrap_or(&Token::Eof)
    }

    fn is_word(&self, word: &str) -> bool {
        matches!(self.current_token(), Token::Identifier(w) if w == word)
    }

    /// Consume the current token as an untyped leaf.
    fn leaf(&mut self) -> ParseTree {
        let span = self.current().span.clone();
        if self.position < self.tokens.len() {
            self.position += 1;
        }
        ParseTree::leaf(&self.source[span.clone()]).with_span(span.start, span.end)
    }

    fn whitespace(&mut self, out: &mut Vec<ParseTree>) {
        while matches!(self.current_token(), Token::Whitespace(_)) {
            out.push(self.leaf());
        }
    }

    fn error<T>(&self, expected: &str) -> QueryResult<T> {
        let current = self.current();
        let found = match current.token {
            Token::Eof => "end of query".to_string(),
            _ => format!("'{}'", &self.source[current.span.clone()]),
        };
        Err(QueryError::parse_at(
            current.span.start,
            format!("Expected {}, found {}", expected, found),
        ))
    }

    fn parse_program(&mut self) -> QueryResult<ParseTree> {
        let mut children = Vec::new();
        self.whitespace(&mut children);
        children.push(self.parse_query()?);
        self.whitespace(&mut children);
        if !matches!(self.current_token(), Token::Eof) {
            return self.error("end of query");
        }
        Ok(ParseTree::node(kind::PROGRAM, children).with_span(0, self.source.len()))
    }

    fn parse_query(&mut self) -> QueryResult<ParseTree> {
        let mut children = vec![self.parse_table_name()?];

        loop {
            // Trailing whitespace belongs to the program, not the query.
            if matches!(self.peek_past_whitespace(), Token::Eof) {
                break;
            }
            let before = children.len();
            self.whitespace(&mut children);
            if children.len() == before {
                return self.error("whitespace between clauses");
            }

            let word = match self.current_token() {
                Token::Identifier(word) => word.clone(),
                _ => return self.error("a clause"),
            };
            let clause = match word.as_str() {
                "where" | "and" => {
                    children.push(self.leaf());
                    self.whitespace(&mut children);
                    self.parse_filter_expr()?
                }
                "order" => self.parse_order_clause()?,
                "limit" => self.parse_limit_clause()?,
                "select" => self.parse_select_clause()?,
                "render" => self.parse_render_clause()?,
                _ => self.parse_filter_expr()?,
            };
            children.push(clause);
        }

        Ok(wrap(kind::QUERY, children))
    }

    fn at_name(&self) -> bool {
        matches!(self.current_token(), Token::Identifier(w) if !CLAUSE_KEYWORDS.contains(&w.as_str()))
    }

    fn parse_table_name(&mut self) -> QueryResult<ParseTree> {
        if !self.at_name() {
            return self.error("a table name");
        }
        let leaf = self.leaf();
        Ok(wrap(kind::TABLE_NAME, vec![leaf]))
    }

    fn parse_name(&mut self) -> QueryResult<ParseTree> {
        if !self.at_name() {
            return self.error("a field name");
        }
        let leaf = self.leaf();
        Ok(wrap(kind::NAME, vec![leaf]))
    }

    fn parse_filter_expr(&mut self) -> QueryResult<ParseTree> {
        let mut children = vec![self.parse_name()?];
        self.whitespace(&mut children);

        if matches!(self.current_token(), Token::Operator(_)) || self.is_word("in") {
            children.push(self.leaf());
        } else {
            return self.error("a comparison operator");
        }
        self.whitespace(&mut children);

        children.push(self.parse_value()?);
        Ok(wrap(kind::FILTER_EXPR, children))
    }

    fn parse_order_clause(&mut self) -> QueryResult<ParseTree> {
        let mut children = vec![self.leaf()]; // order
        self.whitespace(&mut children);
        if !self.is_word("by") {
            return self.error("'by' after 'order'");
        }
        children.push(self.leaf());
        self.whitespace(&mut children);
        children.push(self.parse_name()?);

        if matches!(self.peek_past_whitespace(), Token::Identifier(w) if w == "asc" || w == "desc")
        {
            self.whitespace(&mut children);
            let direction = self.leaf();
            children.push(wrap(kind::ORDER_DIRECTION, vec![direction]));
        }

        Ok(wrap(kind::ORDER_CLAUSE, children))
    }

    fn parse_limit_clause(&mut self) -> QueryResult<ParseTree> {
        let mut children = vec![self.leaf()]; // limit
        self.whitespace(&mut children);
        if !matches!(self.current_token(), Token::Number(_)) {
            return self.error("a number after 'limit'");
        }
        let number = self.leaf();
        children.push(wrap(kind::NUMBER, vec![number]));
        Ok(wrap(kind::LIMIT_CLAUSE, children))
    }

    fn parse_select_clause(&mut self) -> QueryResult<ParseTree> {
        let mut children = vec![self.leaf()]; // select
        self.whitespace(&mut children);
        children.push(self.parse_name()?);

        while matches!(self.peek_past_whitespace(), Token::Comma) {
            self.whitespace(&mut children);
            children.push(self.leaf()); // ,
            self.whitespace(&mut children);
            children.push(self.parse_name()?);
        }

        Ok(wrap(kind::SELECT_CLAUSE, children))
    }

    fn parse_render_clause(&mut self) -> QueryResult<ParseTree> {
        let mut children = vec![self.leaf()]; // render
        self.whitespace(&mut children);
        let node_type = match self.current_token() {
            Token::PageRef(_) => kind::PAGE_REF,
            Token::String(_) => kind::STRING,
            _ => return self.error("a page reference or string after 'render'"),
        };
        let target = self.leaf();
        children.push(wrap(node_type, vec![target]));
        Ok(wrap(kind::RENDER_CLAUSE, children))
    }

    fn parse_value(&mut self) -> QueryResult<ParseTree> {
        if matches!(self.current_token(), Token::LeftBracket) {
            let list = self.parse_list()?;
            return Ok(wrap(kind::VALUE, vec![list]));
        }

        let node_type = match self.current_token() {
            Token::Number(_) => kind::NUMBER,
            Token::String(_) => kind::STRING,
            Token::Regex(_) => kind::REGEX,
            Token::PageRef(_) => kind::PAGE_REF,
            Token::Identifier(w) if w == "true" || w == "false" => kind::BOOL,
            Token::Identifier(w) if w == "null" => kind::NULL,
            Token::Identifier(w) if !CLAUSE_KEYWORDS.contains(&w.as_str()) => kind::NAME,
            _ => return self.error("a value"),
        };
        let literal = self.leaf();
        Ok(wrap(kind::VALUE, vec![wrap(node_type, vec![literal])]))
    }

    fn parse_list(&mut self) -> QueryResult<ParseTree> {
        let mut children = vec![self.leaf()]; // [
        self.whitespace(&mut children);

        if matches!(self.current_token(), Token::RightBracket) {
            children.push(self.leaf());
            return Ok(wrap(kind::LIST, children));
        }

        loop {
            children.push(self.parse_value()?);
            self.whitespace(&mut children);
            match self.current_token() {
                Token::Comma => {
                    children.push(self.leaf());
                    self.whitespace(&mut children);
                }
                Token::RightBracket => {
                    children.push(self.leaf());
                    break;
                }
                _ => return self.error("',' or ']' in list"),
            }
        }

        Ok(wrap(kind::LIST, children))
    }
}

/// Typed node spanning its children.
fn wrap(node_type: &str, children: Vec<ParseTree>) -> ParseTree {
    let from = children.first().and_then(|c| c.from);
    let to = children.last().and_then(|c| c.to);
    let mut node = ParseTree::node(node_type, children);
    node.from = from;
    node.to = to;
    node
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_shape() {
        let tree = parse_query_tree("page where name = \"x\"").unwrap();
        assert!(tree.is_type(kind::PROGRAM));

        let query = &tree.children[0];
        assert!(query.is_type(kind::QUERY));
        assert!(query.children[0].is_type(kind::TABLE_NAME));
        assert_eq!(query.children[0].render_to_text(), "page");

        let filter = query.find_node_of_type(kind::FILTER_EXPR).unwrap();
        assert_eq!(filter.render_to_text(), "name = \"x\"");
        assert_eq!((filter.from, filter.to), (Some(11), Some(21)));
    }

    #[test]
    fn test_render_reproduces_source() {
        let source = "  task where done = false and tags = [a, \"b c\"]  order by due desc limit 3 select name, due render [[tpl/row]] ";
        let tree = parse_query_tree(source).unwrap();
        assert_eq!(tree.render_to_text(), source);
    }

    #[test]
    fn test_whitespace_leaves_present() {
        let tree = parse_query_tree(" page limit 1").unwrap();
        assert_eq!(tree.children[0].text.as_deref(), Some(" "));
        assert!(tree.children[1].is_type(kind::QUERY));
    }

    #[test]
    fn test_order_direction_optional() {
        let tree = parse_query_tree("page order by name").unwrap();
        let order = tree.find_node_of_type(kind::ORDER_CLAUSE).unwrap();
        assert!(order.find_node_of_type(kind::ORDER_DIRECTION).is_none());

        let tree = parse_query_tree("page order by name asc").unwrap();
        let order = tree.find_node_of_type(kind::ORDER_CLAUSE).unwrap();
        let direction = order.find_node_of_type(kind::ORDER_DIRECTION).unwrap();
        assert_eq!(direction.render_to_text(), "asc");
    }

    #[test]
    fn test_nested_list() {
        let tree = parse_query_tree("page where x in [1, [2, 3], []]").unwrap();
        let list = tree.find_node_of_type(kind::LIST).unwrap();
        assert_eq!(list.collect_nodes_of_type(kind::VALUE).len(), 3);
    }

    #[test]
    fn test_value_kinds() {
        let tree =
            parse_query_tree("page where a = 1 and b = true and c = null and d = e and f =~ /x/")
                .unwrap();
        let kinds: Vec<_> = tree
            .collect_nodes_of_type(kind::VALUE)
            .into_iter()
            .map(|v| v.children[0].node_type.clone().unwrap())
            .collect();
        assert_eq!(kinds, vec!["Number", "Bool", "Null", "Name", "Regex"]);
    }

    #[test]
    fn test_clauses_need_separating_whitespace() {
        let err = parse_query_tree("page where a=1b=2").unwrap_err();
        assert_eq!(
            err,
            QueryError::ParseError(
                "Expected whitespace between clauses, found 'b' at offset 14".to_string()
            )
        );
        assert!(parse_query_tree("page where a=1 b=2").is_ok());
        assert!(parse_query_tree("page limit 1select name").is_err());
    }

    #[test]
    fn test_errors() {
        let err = parse_query_tree("limit 5").unwrap_err();
        assert_eq!(
            err,
            QueryError::ParseError("Expected a table name, found 'limit' at offset 0".to_string())
        );

        let err = parse_query_tree("page where").unwrap_err();
        assert_eq!(
            err,
            QueryError::ParseError(
                "Expected a field name, found end of query at offset 10".to_string()
            )
        );

        assert!(parse_query_tree("page order name").is_err());
        assert!(parse_query_tree("page limit ten").is_err());
        assert!(parse_query_tree("page where a = ").is_err());
        assert!(parse_query_tree("page where a ~ 1").is_err());
        assert!(parse_query_tree("page where a in [1, 2").is_err());
        assert!(parse_query_tree("page render name").is_err());
        assert!(parse_query_tree("page , x").is_err());
        assert!(parse_query_tree("page where a=1b=2").is_err());
        assert!(parse_query_tree("").is_err());
    }
}
