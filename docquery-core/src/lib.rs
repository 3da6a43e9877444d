//! docquery-core - storage-independent query directive parser and executor.
//!
//! Documents embed queries such as
//! `<!-- #query page where name =~ /^Proj/ order by name desc limit 2 -->`.
//! This crate turns the directive's argument into a [`ParsedQuery`] and runs
//! it over an in-memory sequence of schema-less [`Record`]s. It has no I/O
//! and no knowledge of where records come from.
//!
//! # Main Components
//!
//! - **Grammar / Lexer**: query text to a generic [`ParseTree`]
//! - **Parser**: [`ParseTree`] to [`ParsedQuery`]
//! - **Executor**: filter, order, limit and select over records
//! - **Directive**: locating and blanking directive blocks in documents
//!
//! # Example
//!
//! ```rust
//! use docquery_core::{apply_query, parse_query_text, Record};
//! use serde_json::json;
//!
//! let records: Vec<Record> = vec![
//!     json!({"name": "Proj A"}),
//!     json!({"name": "X"}),
//!     json!({"name": "Proj B"}),
//! ]
//! .into_iter()
//! .map(|v| Record::try_from(v).unwrap())
//! .collect();
//!
//! let query = parse_query_text("page where name =~ /^Proj/ order by name desc").unwrap();
//! let results = apply_query(&query, &records).unwrap();
//! assert_eq!(results[0].field("name").to_string(), "Proj B");
//! ```

pub mod ast;
pub mod directive;
pub mod error;
pub mod executor;
pub mod grammar;
pub mod lexer;
pub mod parser;
pub mod tree;
pub mod value;

// Re-export main types for convenience
pub use ast::{FilterOp, ParsedQuery, QueryFilter};
pub use directive::{
    find_directives, find_query_directives, remove_queries, scrub_directives, Directive,
    QUERY_DIRECTIVE,
};
pub use error::{QueryError, QueryResult};
pub use executor::{apply_query, InMemoryRecordSource, QueryEngine, RecordSource};
pub use grammar::parse_query_tree;
pub use parser::{parse_query, parse_query_text, value_node_to_value};
pub use tree::{ParseTree, Replacement};
pub use value::{Record, Value};
