//! Generic syntax tree shared with the host document model.
//!
//! Typed nodes carry a `node_type` tag and children; untyped leaves carry the
//! literal source text. The JSON form (`type`, `text`, `from`, `to`,
//! `children`) matches the trees hosts hand over for documents.

use serde::{Deserialize, Serialize};

/// Node type tags used by the query grammar and the document model.
pub mod kind {
    pub const PROGRAM: &str = "Program";
    pub const QUERY: &str = "Query";
    pub const TABLE_NAME: &str = "TableName";
    pub const FILTER_EXPR: &str = "FilterExpr";
    pub const ORDER_CLAUSE: &str = "OrderClause";
    pub const ORDER_DIRECTION: &str = "OrderDirection";
    pub const LIMIT_CLAUSE: &str = "LimitClause";
    pub const SELECT_CLAUSE: &str = "SelectClause";
    pub const RENDER_CLAUSE: &str = "RenderClause";
    pub const NAME: &str = "Name";
    pub const VALUE: &str = "Value";
    pub const NUMBER: &str = "Number";
    pub const STRING: &str = "String";
    pub const BOOL: &str = "Bool";
    pub const NULL: &str = "Null";
    pub const REGEX: &str = "Regex";
    pub const PAGE_REF: &str = "PageRef";
    pub const LIST: &str = "List";
    pub const DIRECTIVE: &str = "Directive";
}

/// A node of a syntax tree.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParseTree {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ParseTree>,
}

/// What [`ParseTree::replace_nodes_matching`] does with a visited node.
#[derive(Debug, Clone, PartialEq)]
pub enum Replacement {
    /// Leave the node in place and descend into it.
    Keep,
    Remove,
    /// Swap the node for another one; the new node is not visited.
    Replace(ParseTree),
}

impl ParseTree {
    /// Typed node with children.
    pub fn node(node_type: &str, children: Vec<ParseTree>) -> Self {
        Self {
            node_type: Some(node_type.to_string()),
            children,
            ..Default::default()
        }
    }

    /// Untyped leaf holding literal text.
    pub fn leaf(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn with_span(mut self, from: usize, to: usize) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn is_type(&self, node_type: &str) -> bool {
        self.node_type.as_deref() == Some(node_type)
    }

    /// Human readable position, used in error messages.
    pub fn describe(&self) -> String {
        let name = self.node_type.as_deref().unwrap_or("text");
        match (self.from, self.to) {
            (Some(from), Some(to)) => format!("{} at {}..{}", name, from, to),
            _ => name.to_string(),
        }
    }

    /// Depth-first, pre-order iteration over this node and its descendants.
    pub fn traverse(&self) -> Traverse<'_> {
        Traverse { stack: vec![self] }
    }

    /// Collect the outermost nodes of the given type.
    ///
    /// A matching node is returned without looking inside it, so nested
    /// matches below a match are not reported.
    pub fn collect_nodes_of_type(&self, node_type: &str) -> Vec<&ParseTree> {
        let mut found = Vec::new();
        self.collect_into(node_type, &mut found);
        found
    }

    fn collect_into<'a>(&'a self, node_type: &str, found: &mut Vec<&'a ParseTree>) {
        if self.is_type(node_type) {
            found.push(self);
            return;
        }
        for child in &self.children {
            child.collect_into(node_type, found);
        }
    }

    /// First node of the given type in pre-order, including `self`.
    pub fn find_node_of_type(&self, node_type: &str) -> Option<&ParseTree> {
        self.traverse().find(|node| node.is_type(node_type))
    }

    /// Visit every descendant (not `self`) and keep, remove or replace it.
    ///
    /// The callback may also edit the node in place before returning
    /// [`Replacement::Keep`].
    pub fn replace_nodes_matching<F>(&mut self, substitute: &mut F)
    where
        F: FnMut(&mut ParseTree) -> Replacement,
    {
        let children = std::mem::take(&mut self.children);
        for mut child in children {
            match substitute(&mut child) {
                Replacement::Keep => {
                    child.replace_nodes_matching(substitute);
                    self.children.push(child);
                }
                Replacement::Remove => {}
                Replacement::Replace(other) => self.children.push(other),
            }
        }
    }

    /// Concatenated text of all leaves below this node.
    pub fn render_to_text(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out);
        out
    }

    fn render_into(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
            return;
        }
        for child in &self.children {
            child.render_into(out);
        }
    }
}

/// Iterator returned by [`ParseTree::traverse`].
pub struct Traverse<'a> {
    stack: Vec<&'a ParseTree>,
}

impl<'a> Iterator for Traverse<'a> {
    type Item = &'a ParseTree;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}
