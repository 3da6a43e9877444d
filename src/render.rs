//! Rendering query results into markdown.

use docquery_core::{Record, Value};

use crate::error::DocqueryResult;

/// Text written into a directive body when a query matches nothing.
pub const NO_RESULTS: &str = "No results";

/// Renders results through a named template (the query's `render` hint).
pub trait TemplateRenderer {
    fn render(&self, template: &str, records: &[Record]) -> DocqueryResult<String>;
}

/// Render records as a markdown table.
///
/// Columns appear in the order their field is first seen across all
/// records; a record without a column leaves the cell empty.
pub fn markdown_table(records: &[Record]) -> String {
    if records.is_empty() {
        return NO_RESULTS.to_string();
    }

    let mut columns: Vec<&str> = Vec::new();
    for record in records {
        for key in record.keys() {
            if !columns.contains(&key) {
                columns.push(key);
            }
        }
    }

    let mut lines = Vec::with_capacity(records.len() + 2);
    lines.push(format!("|{}|", columns.join("|")));
    lines.push(format!("|{}|", vec!["--"; columns.len()].join("|")));
    for record in records {
        let cells: Vec<String> = columns
            .iter()
            .map(|column| table_cell(record.field(column)))
            .collect();
        lines.push(format!("|{}|", cells.join("|")));
    }
    lines.join("\n")
}

fn table_cell(value: &Value) -> String {
    value
        .to_string()
        .replace('|', "\\|")
        .replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(values: Vec<serde_json::Value>) -> Vec<Record> {
        values
            .into_iter()
            .map(|v| Record::try_from(v).unwrap())
            .collect()
    }

    #[test]
    fn test_markdown_table() {
        let rows = records(vec![
            json!({"done": false, "name": "Proj C"}),
            json!({"name": "Proj B", "owner": "ann"}),
        ]);
        assert_eq!(
            markdown_table(&rows),
            "|done|name|owner|\n|--|--|--|\n|false|Proj C||\n||Proj B|ann|"
        );
    }

    #[test]
    fn test_columns_follow_json_key_order() {
        let rows = records(vec![json!({"title": "T", "due": 1, "assignee": "x"})]);
        assert_eq!(
            markdown_table(&rows),
            "|title|due|assignee|\n|--|--|--|\n|T|1|x|"
        );
    }

    #[test]
    fn test_projected_column_order() {
        let mut record = Record::new();
        record.insert("z", 1i64);
        record.insert("a", Value::PageRef("Home".to_string()));
        assert_eq!(
            markdown_table(&[record]),
            "|z|a|\n|--|--|\n|1|[[Home]]|"
        );
    }

    #[test]
    fn test_cells_are_escaped() {
        let rows = records(vec![json!({"text": "a|b\nc"})]);
        assert_eq!(markdown_table(&rows), "|text|\n|--|\n|a\\|b c|");
    }

    #[test]
    fn test_empty_results() {
        assert_eq!(markdown_table(&[]), NO_RESULTS);
    }
}
