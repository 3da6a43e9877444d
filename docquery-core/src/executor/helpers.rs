//! Predicate evaluation helpers.
//!
//! Filters are compiled once per query evaluation: regex operands are turned
//! into [`Regex`] values up front so that every record reuses them.

use std::cmp::Ordering;

use regex::Regex;

use crate::ast::{FilterOp, QueryFilter};
use crate::error::{QueryError, QueryResult};
use crate::value::{Record, Value};

/// Longest regex pattern accepted in a filter.
pub const MAX_PATTERN_LEN: usize = 1000;

/// Compile a regex with a size limit on the pattern.
pub fn safe_regex(pattern: &str) -> Result<Regex, regex::Error> {
    if pattern.len() > MAX_PATTERN_LEN {
        return Err(regex::Error::Syntax(format!(
            "Pattern too long (max {} chars)",
            MAX_PATTERN_LEN
        )));
    }
    Regex::new(pattern)
}

/// A filter ready to be evaluated against records.
#[derive(Debug)]
pub struct CompiledFilter<'q> {
    filter: &'q QueryFilter,
    pattern: Option<Regex>,
}

impl<'q> CompiledFilter<'q> {
    pub fn compile(filter: &'q QueryFilter) -> QueryResult<Self> {
        let pattern = if filter.op.is_regex() {
            let source = filter.value.match_text().ok_or_else(|| {
                QueryError::EvaluationError(format!(
                    "Filter '{} {}' needs a text pattern",
                    filter.prop, filter.op
                ))
            })?;
            let regex = safe_regex(&source).map_err(|e| {
                QueryError::EvaluationError(format!(
                    "Invalid regex /{}/ in filter on '{}': {}",
                    source, filter.prop, e
                ))
            })?;
            Some(regex)
        } else {
            None
        };

        Ok(Self { filter, pattern })
    }

    pub fn filter(&self) -> &QueryFilter {
        self.filter
    }

    /// Evaluate the predicate against one record.
    pub fn matches(&self, record: &Record) -> bool {
        let field = record.field(&self.filter.prop);
        let value = &self.filter.value;

        match self.filter.op {
            FilterOp::Equal => match (field, value) {
                (Value::List(items), Value::List(_)) => items.iter().any(|item| value.contains(item)),
                (Value::List(_), _) => field.contains(value),
                _ => field.loose_eq(value),
            },
            FilterOp::NotEqual => !field.loose_eq(value),
            FilterOp::LessThan => field.compare(value) == Some(Ordering::Less),
            FilterOp::LessThanOrEqual => {
                matches!(field.compare(value), Some(Ordering::Less | Ordering::Equal))
            }
            FilterOp::GreaterThan => field.compare(value) == Some(Ordering::Greater),
            FilterOp::GreaterThanOrEqual => {
                matches!(field.compare(value), Some(Ordering::Greater | Ordering::Equal))
            }
            FilterOp::RegexMatch => self.regex_matches(field),
            FilterOp::NotRegexMatch => !self.regex_matches(field),
            FilterOp::In => value.contains(field),
        }
    }

    fn regex_matches(&self, field: &Value) -> bool {
        match (&self.pattern, field.match_text()) {
            (Some(regex), Some(text)) => regex.is_match(&text),
            _ => false,
        }
    }
}

/// Compile every filter of a query, failing on the first bad pattern.
pub fn compile_filters(filters: &[QueryFilter]) -> QueryResult<Vec<CompiledFilter<'_>>> {
    filters.iter().map(CompiledFilter::compile).collect()
}

/// True if every filter accepts the record. Stops at the first rejection.
pub fn matches_all(filters: &[CompiledFilter<'_>], record: &Record) -> bool {
    filters.iter().all(|filter| filter.matches(record))
}
