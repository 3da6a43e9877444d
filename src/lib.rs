pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod render;

pub use config::Config;
pub use document::{load_record_file, DirectiveOutcome, DocumentEvaluator, Evaluation};
pub use error::{DocqueryError, DocqueryResult};
pub use render::{markdown_table, TemplateRenderer, NO_RESULTS};

pub use docquery_core::{
    apply_query, parse_query, parse_query_text, remove_queries, scrub_directives,
    InMemoryRecordSource, ParsedQuery, QueryEngine, QueryError, Record, RecordSource, Value,
};
