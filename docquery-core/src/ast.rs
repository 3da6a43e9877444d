//! Structured form of a query directive.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::QueryError;
use crate::value::Value;

/// Comparison operator of a filter predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOp {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    RegexMatch,
    NotRegexMatch,
    In,
}

impl FilterOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Equal => "=",
            FilterOp::NotEqual => "!=",
            FilterOp::LessThan => "<",
            FilterOp::LessThanOrEqual => "<=",
            FilterOp::GreaterThan => ">",
            FilterOp::GreaterThanOrEqual => ">=",
            FilterOp::RegexMatch => "=~",
            FilterOp::NotRegexMatch => "!=~",
            FilterOp::In => "in",
        }
    }

    pub fn is_regex(&self) -> bool {
        matches!(self, FilterOp::RegexMatch | FilterOp::NotRegexMatch)
    }
}

impl FromStr for FilterOp {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "=" => FilterOp::Equal,
            "!=" => FilterOp::NotEqual,
            "<" => FilterOp::LessThan,
            "<=" => FilterOp::LessThanOrEqual,
            ">" => FilterOp::GreaterThan,
            ">=" => FilterOp::GreaterThanOrEqual,
            "=~" => FilterOp::RegexMatch,
            "!=~" => FilterOp::NotRegexMatch,
            "in" => FilterOp::In,
            other => {
                return Err(QueryError::ParseError(format!(
                    "Unknown filter operator '{}'",
                    other
                )))
            }
        })
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FilterOp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// A single predicate: `prop op value`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryFilter {
    pub op: FilterOp,
    pub prop: String,
    pub value: Value,
}

impl QueryFilter {
    pub fn new(prop: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            op,
            prop: prop.into(),
            value: value.into(),
        }
    }
}

/// A fully parsed query. Filters are AND-combined.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedQuery {
    pub table: String,
    pub filter: Vec<QueryFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
    pub order_desc: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render: Option<String>,
}

impl ParsedQuery {
    /// Query matching every record of `table`.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    pub fn filter(mut self, filter: QueryFilter) -> Self {
        self.filter.push(filter);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, desc: bool) -> Self {
        self.order_by = Some(field.into());
        self.order_desc = desc;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = Some(fields.into_iter().map(Into::into).collect());
        self
    }
}
