//! In-memory query pipeline: filter, order, limit, select.

use tracing::debug;

use crate::ast::ParsedQuery;
use crate::error::{QueryError, QueryResult};
use crate::parser::parse_query_text;
use crate::value::Record;

use super::helpers::{compile_filters, matches_all};
use super::RecordSource;

/// Apply a parsed query to a sequence of records.
///
/// The input is never modified. Either the whole result is returned or the
/// evaluation fails (for example on an invalid regex); there are no partial
/// results.
pub fn apply_query(query: &ParsedQuery, records: &[Record]) -> QueryResult<Vec<Record>> {
    let filters = compile_filters(&query.filter)?;

    let mut results: Vec<&Record> = records
        .iter()
        .filter(|record| matches_all(&filters, record))
        .collect();
    debug!(
        table = %query.table,
        scanned = records.len(),
        matched = results.len(),
        "filtered records"
    );

    if let Some(field) = &query.order_by {
        // sort_by is stable: records with equal keys keep their input order
        // in both directions.
        results.sort_by(|a, b| {
            let ord = a.field(field).total_cmp(b.field(field));
            if query.order_desc {
                ord.reverse()
            } else {
                ord
            }
        });
    }

    if let Some(limit) = query.limit {
        results.truncate(limit);
    }

    let projected: Vec<Record> = match &query.select {
        Some(fields) => results
            .into_iter()
            .map(|record| {
                fields
                    .iter()
                    .map(|field| (field.clone(), record.field(field).clone()))
                    .collect::<Record>()
            })
            .collect(),
        None => results.into_iter().cloned().collect(),
    };

    Ok(projected)
}

/// Runs queries against a [`RecordSource`].
pub struct QueryEngine<S: RecordSource> {
    source: S,
}

impl<S: RecordSource> QueryEngine<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Parse and run query text such as `task where done = false`.
    pub fn execute(&self, query: &str) -> QueryResult<Vec<Record>> {
        let parsed = parse_query_text(query)?;
        self.execute_query(&parsed)
    }

    /// Run a parsed query against the table it names.
    pub fn execute_query(&self, query: &ParsedQuery) -> QueryResult<Vec<Record>> {
        let records = self
            .source
            .records(&query.table)
            .ok_or_else(|| QueryError::TableNotFound(query.table.clone()))?;
        apply_query(query, &records)
    }
}
