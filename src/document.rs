//! Evaluating the query directives of a markdown document.
//!
//! Every `<!-- #query ... -->` block gets its body replaced with the rendered
//! results of its query. Other directives are copied through untouched.

use std::path::Path;

use docquery_core::{
    find_query_directives, parse_query_text, InMemoryRecordSource, QueryEngine, RecordSource,
};
use tracing::{debug, warn};

use crate::error::DocqueryResult;
use crate::render::{markdown_table, TemplateRenderer};

/// Result of evaluating a single query directive.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveOutcome {
    /// Query text as written in the start marker, trimmed.
    pub query: String,
    /// Number of result rows, or the error message that was rendered.
    pub result: Result<usize, String>,
}

/// A document after evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub text: String,
    pub outcomes: Vec<DirectiveOutcome>,
}

impl Evaluation {
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }
}

/// Runs query directives against a record source.
pub struct DocumentEvaluator<S: RecordSource> {
    engine: QueryEngine<S>,
    renderer: Option<Box<dyn TemplateRenderer>>,
}

impl<S: RecordSource> DocumentEvaluator<S> {
    pub fn new(source: S) -> Self {
        Self {
            engine: QueryEngine::new(source),
            renderer: None,
        }
    }

    /// Install a renderer for queries carrying a `render` hint.
    pub fn with_renderer(mut self, renderer: Box<dyn TemplateRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Evaluate every query directive of `text`.
    ///
    /// A failing query does not stop the others: its body shows the error
    /// instead of results.
    pub fn evaluate(&self, text: &str) -> Evaluation {
        let mut out = String::with_capacity(text.len());
        let mut outcomes = Vec::new();
        let mut last = 0;

        for directive in find_query_directives(text) {
            let query = directive.args.trim().to_string();
            let (body, result) = match self.render_query(&query) {
                Ok((rendered, rows)) => (rendered, Ok(rows)),
                Err(e) => {
                    warn!("Query directive '{}' failed: {}", query, e);
                    (format!("**Error:** {}", e), Err(e.to_string()))
                }
            };

            out.push_str(&text[last..directive.body.start]);
            out.push('\n');
            out.push_str(&body);
            out.push('\n');
            last = directive.body.end;

            outcomes.push(DirectiveOutcome { query, result });
        }
        out.push_str(&text[last..]);

        Evaluation {
            text: out,
            outcomes,
        }
    }

    fn render_query(&self, query: &str) -> DocqueryResult<(String, usize)> {
        let parsed = parse_query_text(query)?;
        let results = self.engine.execute_query(&parsed)?;
        debug!(table = %parsed.table, rows = results.len(), "evaluated query directive");

        let rendered = match (&parsed.render, &self.renderer) {
            (Some(template), Some(renderer)) => renderer.render(template, &results)?,
            (Some(template), None) => {
                warn!(
                    "No template renderer installed, rendering '{}' results as a table",
                    template
                );
                markdown_table(&results)
            }
            (None, _) => markdown_table(&results),
        };
        Ok((rendered, results.len()))
    }
}

/// Load record tables from a JSON file shaped `{"table": [{...}, ...]}`.
pub fn load_record_file(path: &Path) -> DocqueryResult<InMemoryRecordSource> {
    let content = std::fs::read_to_string(path)?;
    let json: serde_json::Value = serde_json::from_str(&content)?;
    let source = InMemoryRecordSource::from_json(json)?;
    debug!(path = %path.display(), tables = ?source.tables(), "loaded record data");
    Ok(source)
}
