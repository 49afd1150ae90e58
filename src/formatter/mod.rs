//! Output formatting for fetched pages
//!
//! Records are converted from BSON to relaxed extended JSON and rendered as:
//! - `json`: one compact object per line
//! - `json-pretty`: an indented array
//! - `compact`: a one-line summary with the next cursor

use bson::{Bson, Document};
use colored_json::prelude::*;
use serde_json::{Map, Value as JsonValue};

use crate::config::{DisplayConfig, OutputFormat};
use crate::error::{PagerError, Result};
use crate::reader::{Phase, ReadState};
use crate::record::{Cursor, Page, Record};

/// Renders records for the terminal
#[derive(Debug, Clone)]
pub struct Formatter {
    format: OutputFormat,
    use_colors: bool,
}

impl Formatter {
    pub fn new(format: OutputFormat, use_colors: bool) -> Self {
        Self { format, use_colors }
    }

    /// Create a formatter from display configuration
    pub fn from_config(config: &DisplayConfig) -> Self {
        Self::new(config.format, config.color_output)
    }

    /// Format one stateless page
    pub fn format_page(&self, page: &Page<Document>) -> Result<String> {
        match self.format {
            OutputFormat::Compact => Ok(summary(page.len(), page.next_cursor.as_ref())),
            _ => self.format_records(&page.data),
        }
    }

    /// Format the accumulated state of a stateful read
    pub fn format_state(&self, state: &ReadState<Document>) -> Result<String> {
        let status = match (&state.phase, &state.error) {
            (Phase::Error, Some(err)) => format!("error: {err}"),
            (phase, _) => format!("{phase:?}").to_lowercase(),
        };
        let footer = format!(
            "{} | has more: {} | {}",
            summary(state.items.len(), state.cursor.as_ref()),
            state.has_more,
            status
        );

        match self.format {
            OutputFormat::Compact => Ok(footer),
            _ if state.items.is_empty() => Ok(footer),
            _ => Ok(format!("{}\n{footer}", self.format_records(&state.items)?)),
        }
    }

    /// Format a list of records in the configured JSON style
    pub fn format_records(&self, records: &[Record<Document>]) -> Result<String> {
        let values: Vec<JsonValue> = records.iter().map(record_to_json).collect();

        match self.format {
            OutputFormat::JsonPretty => self.render(&JsonValue::Array(values), true),
            _ => values
                .iter()
                .map(|value| self.render(value, false))
                .collect::<Result<Vec<_>>>()
                .map(|lines| lines.join("\n")),
        }
    }

    fn render(&self, value: &JsonValue, pretty: bool) -> Result<String> {
        let text = if pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        }
        .map_err(|e| PagerError::Generic(format!("JSON serialization error: {e}")))?;

        if self.use_colors {
            text.to_colored_json_auto()
                .map_err(|e| PagerError::Generic(format!("JSON coloring error: {e}")))
        } else {
            Ok(text)
        }
    }
}

/// Convert a record to a JSON object with `id` as its first key. The record
/// id replaces any `id` field of the body.
pub fn record_to_json(record: &Record<Document>) -> JsonValue {
    let mut object = Map::new();
    object.insert("id".to_string(), JsonValue::String(record.id.clone()));
    for (key, value) in record.data.iter().filter(|(key, _)| key.as_str() != "id") {
        object.insert(key.clone(), Bson::into_relaxed_extjson(value.clone()));
    }
    JsonValue::Object(object)
}

fn summary(count: usize, cursor: Option<&Cursor>) -> String {
    match cursor {
        Some(cursor) => format!("{count} record(s), next cursor: {cursor}"),
        None => format!("{count} record(s), no next cursor"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn page() -> Page<Document> {
        Page {
            data: vec![
                Record::new("a", doc! { "n": 1 }),
                Record::new("b", doc! { "n": 2_i64, "at": bson::DateTime::from_millis(0) }),
            ],
            next_cursor: Some(Cursor::from_id_str("b")),
        }
    }

    #[test]
    fn test_json_lines() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_page(&page()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], r#"{"id":"a","n":1}"#);
        let second: JsonValue = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["id"], "b");
        assert_eq!(second["n"], 2);
        assert!(second["at"].get("$date").is_some());
    }

    #[test]
    fn test_record_id_wins_over_body_field() {
        let record = Record::new("store-id", doc! { "id": "body-id", "x": true });
        let json = record_to_json(&record);
        assert_eq!(json["id"], "store-id");
        assert_eq!(json["x"], true);
        assert_eq!(json.to_string(), r#"{"id":"store-id","x":true}"#);
    }

    #[test]
    fn test_pretty_is_array() {
        let formatter = Formatter::new(OutputFormat::JsonPretty, false);
        let output = formatter.format_page(&page()).unwrap();
        let parsed: JsonValue = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed.as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_compact_summary() {
        let formatter = Formatter::new(OutputFormat::Compact, false);
        assert_eq!(
            formatter.format_page(&page()).unwrap(),
            "2 record(s), next cursor: b"
        );

        let empty = Page::<Document> {
            data: Vec::new(),
            next_cursor: None,
        };
        assert_eq!(
            formatter.format_page(&empty).unwrap(),
            "0 record(s), no next cursor"
        );
    }

    #[test]
    fn test_state_footer() {
        let mut state = ReadState::<Document>::initial();
        state.items = page().data;
        state.cursor = Some(Cursor::from_id_str("b"));
        state.has_more = false;
        state.phase = Phase::Success;

        let formatter = Formatter::new(OutputFormat::Compact, false);
        assert_eq!(
            formatter.format_state(&state).unwrap(),
            "2 record(s), next cursor: b | has more: false | success"
        );
    }
}
