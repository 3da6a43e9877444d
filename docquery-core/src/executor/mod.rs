//! Executor module for parsed queries.
//!
//! [`apply_query`] is a pure function over a slice of records. Where those
//! records come from is up to the host: implement [`RecordSource`] to let a
//! [`QueryEngine`] resolve the table a query names.

mod helpers;
mod local;

pub use helpers::{compile_filters, matches_all, safe_regex, CompiledFilter, MAX_PATTERN_LEN};
pub use local::{apply_query, QueryEngine};

use std::borrow::Cow;
use std::collections::HashMap;

use crate::error::{QueryError, QueryResult};
use crate::value::Record;

/// Trait for hosts that supply the records of a table.
pub trait RecordSource {
    /// All records of `table`, in order, or `None` if the table is unknown.
    fn records(&self, table: &str) -> Option<Cow<'_, [Record]>>;

    /// Names of the known tables.
    fn tables(&self) -> Vec<String> {
        vec![]
    }
}

impl<S: RecordSource + ?Sized> RecordSource for &S {
    fn records(&self, table: &str) -> Option<Cow<'_, [Record]>> {
        (**self).records(table)
    }

    fn tables(&self) -> Vec<String> {
        (**self).tables()
    }
}

/// In-memory record source for tests and file-backed hosts.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRecordSource {
    tables: HashMap<String, Vec<Record>>,
}

impl InMemoryRecordSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a table.
    pub fn add_table(&mut self, name: &str, records: Vec<Record>) {
        self.tables.insert(name.to_string(), records);
    }

    /// Append one record to a table, creating the table if needed.
    pub fn push(&mut self, table: &str, record: Record) {
        self.tables.entry(table.to_string()).or_default().push(record);
    }

    /// Build from a JSON object mapping table names to arrays of objects.
    pub fn from_json(value: serde_json::Value) -> QueryResult<Self> {
        let serde_json::Value::Object(tables) = value else {
            return Err(QueryError::TypeError(
                "record data must be an object of tables".to_string(),
            ));
        };

        let mut source = Self::new();
        for (name, rows) in tables {
            let serde_json::Value::Array(rows) = rows else {
                return Err(QueryError::TypeError(format!(
                    "table '{}' must be an array of records",
                    name
                )));
            };
            let records = rows
                .into_iter()
                .map(Record::try_from)
                .collect::<QueryResult<Vec<_>>>()?;
            source.add_table(&name, records);
        }
        Ok(source)
    }
}

impl RecordSource for InMemoryRecordSource {
    fn records(&self, table: &str) -> Option<Cow<'_, [Record]>> {
        self.tables.get(table).map(|records| Cow::Borrowed(records.as_slice()))
    }

    fn tables(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.keys().cloned().collect();
        names.sort();
        names
    }
}
