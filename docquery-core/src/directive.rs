//! Directive markers inside documents.
//!
//! A directive is an HTML comment pair wrapping a body:
//!
//! ```text
//! <!-- #query page where done = false -->
//! ...body...
//! <!-- /query -->
//! ```
//!
//! Start and end markers are located in two passes so that several
//! directives in one document never swallow each other.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::tree::{kind, ParseTree, Replacement};

/// Directive name reserved for queries.
pub const QUERY_DIRECTIVE: &str = "query";

static DIRECTIVE_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--\s*#([\w\-]+)\s+(.+?)-->").expect("valid start marker regex"));

static DIRECTIVE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--\s*\/([\w\-]+)\s*-->").expect("valid end marker regex"));

/// A directive found in a document, with byte ranges into that document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub name: String,
    /// Argument text exactly as written between the name and `-->`.
    pub args: String,
    pub start_marker: Range<usize>,
    pub body: Range<usize>,
    pub end_marker: Range<usize>,
}

impl Directive {
    /// Whole directive, markers included.
    pub fn span(&self) -> Range<usize> {
        self.start_marker.start..self.end_marker.end
    }

    pub fn is_query(&self) -> bool {
        self.name == QUERY_DIRECTIVE
    }
}

struct StartMarker {
    name: String,
    args: String,
    range: Range<usize>,
}

/// Locate every closed directive in `text`, in document order.
///
/// A start marker without a matching end marker is ignored, as is a start
/// marker lying inside a directive that was already matched.
pub fn find_directives(text: &str) -> Vec<Directive> {
    let starts: Vec<StartMarker> = DIRECTIVE_START
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(StartMarker {
                name: caps.get(1)?.as_str().to_string(),
                args: caps.get(2)?.as_str().to_string(),
                range: whole.range(),
            })
        })
        .collect();

    let mut directives = Vec::new();
    let mut cursor = 0;
    for start in starts {
        if start.range.start < cursor {
            continue;
        }

        let rest = &text[start.range.end..];
        let end = DIRECTIVE_END.captures_iter(rest).find_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.get(1)?;
            (name.as_str() == start.name).then(|| {
                (start.range.end + whole.start())..(start.range.end + whole.end())
            })
        });

        if let Some(end_marker) = end {
            cursor = end_marker.end;
            directives.push(Directive {
                name: start.name,
                args: start.args,
                body: start.range.end..end_marker.start,
                start_marker: start.range,
                end_marker,
            });
        }
    }

    directives
}

/// Only the `#query` directives of `text`.
pub fn find_query_directives(text: &str) -> Vec<Directive> {
    find_directives(text)
        .into_iter()
        .filter(Directive::is_query)
        .collect()
}

/// Blank out every directive, keeping the byte length of the document.
///
/// Each directive span of N bytes becomes N spaces; everything outside the
/// spans is copied unchanged.
pub fn scrub_directives(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for directive in find_directives(text) {
        let span = directive.span();
        out.push_str(&text[last..span.start]);
        out.extend(std::iter::repeat(' ').take(span.len()));
        last = span.end;
    }
    out.push_str(&text[last..]);
    out
}

/// Tree variant of [`scrub_directives`]: every `Directive` node becomes a
/// leaf of spaces as long as its rendered text.
pub fn remove_queries(tree: &mut ParseTree) {
    tree.replace_nodes_matching(&mut |node| {
        if !node.is_type(kind::DIRECTIVE) {
            return Replacement::Keep;
        }
        let width = node.render_to_text().len();
        let mut blank = ParseTree::leaf(" ".repeat(width));
        blank.from = node.from;
        blank.to = node.to;
        Replacement::Replace(blank)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "# Projects\n<!-- #query page where name =~ /^Proj/ -->\n| name |\n<!-- /query -->\ntext\n<!-- #use [[template]] -->x<!-- /use -->\n";

    #[test]
    fn test_find_directives() {
        let directives = find_directives(DOC);
        assert_eq!(directives.len(), 2);

        let query = &directives[0];
        assert_eq!(query.name, "query");
        assert_eq!(query.args, "page where name =~ /^Proj/ ");
        assert_eq!(&DOC[query.body.clone()], "\n| name |\n");
        assert_eq!(&DOC[query.end_marker.clone()], "<!-- /query -->");
        assert!(query.is_query());

        let other = &directives[1];
        assert_eq!(other.name, "use");
        assert_eq!(&DOC[other.body.clone()], "x");
        assert!(!other.is_query());

        assert_eq!(find_query_directives(DOC).len(), 1);
    }

    #[test]
    fn test_multiple_directives_do_not_overlap() {
        let doc = "<!-- #query a -->1<!-- /query -->mid<!-- #query b -->2<!-- /query -->";
        let directives = find_directives(doc);
        assert_eq!(directives.len(), 2);
        assert_eq!(&doc[directives[0].body.clone()], "1");
        assert_eq!(&doc[directives[1].body.clone()], "2");
        assert_eq!(directives[1].args, "b ");
    }

    #[test]
    fn test_end_marker_must_match_name() {
        let doc = "<!-- #query a -->x<!-- /use --><!-- /query -->";
        let directives = find_directives(doc);
        assert_eq!(directives.len(), 1);
        assert_eq!(&doc[directives[0].body.clone()], "x<!-- /use -->");
    }

    #[test]
    fn test_unclosed_and_nested_starts() {
        assert!(find_directives("<!-- #query a --> no end").is_empty());

        let doc = "<!-- #query a --><!-- #query b -->in<!-- /query -->";
        let directives = find_directives(doc);
        assert_eq!(directives.len(), 1);
        assert_eq!(directives[0].args, "a ");
    }

    #[test]
    fn test_marker_whitespace_variants() {
        let doc = "<!--#query page-->\nbody\n<!--/query-->";
        let directives = find_directives(doc);
        assert_eq!(directives.len(), 1);
        assert_eq!(directives[0].args, "page");

        let doc = "<!--   #query\npage\nlimit 1 -->b<!--  /query  -->";
        let directives = find_directives(doc);
        assert_eq!(directives[0].args, "page\nlimit 1 ");
    }

    #[test]
    fn test_scrub_preserves_length_and_offsets() {
        let scrubbed = scrub_directives(DOC);
        assert_eq!(scrubbed.len(), DOC.len());

        for directive in find_directives(DOC) {
            let span = directive.span();
            assert!(scrubbed[span.clone()].chars().all(|c| c == ' '));
            assert_eq!(scrubbed[span].len(), directive.span().len());
        }
        assert!(scrubbed.starts_with("# Projects\n"));
        assert!(scrubbed.contains("\ntext\n"));
        assert!(scrubbed.ends_with(" \n"));
    }

    #[test]
    fn test_scrub_without_directives() {
        assert_eq!(scrub_directives("plain text"), "plain text");
    }

    #[test]
    fn test_remove_queries_tree() {
        let mut tree = ParseTree::node(
            "Document",
            vec![
                ParseTree::leaf("before "),
                ParseTree::node(
                    kind::DIRECTIVE,
                    vec![
                        ParseTree::leaf("<!-- #query page -->"),
                        ParseTree::leaf("body"),
                        ParseTree::leaf("<!-- /query -->"),
                    ],
                )
                .with_span(7, 46),
                ParseTree::leaf(" after"),
            ],
        );
        let original = tree.render_to_text();

        remove_queries(&mut tree);

        let text = tree.render_to_text();
        assert_eq!(text.len(), original.len());
        assert_eq!(text, format!("before {} after", " ".repeat(39)));
        assert_eq!((tree.children[1].from, tree.children[1].to), (Some(7), Some(46)));
    }
}
