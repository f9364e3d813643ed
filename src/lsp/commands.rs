//! workspace/executeCommand surface.
//!
//! Argument parsing and result shapes for the three docfold commands. The
//! client renders the returned ranges as invisible decorations; the server
//! never edits text.

use serde::Serialize;
use serde_json::Value;
use tower_lsp::lsp_types::{Position, Range, Url};

use crate::document::{DocumentState, LineIndex};
use crate::hide::{DocstringListing, ToggleOutcome};

/// Whole-buffer toggle: `[uri]`.
pub const TOGGLE_ALL: &str = "docfold.toggleAll";
/// Point toggle: `[uri, position]`.
pub const TOGGLE_AT_POINT: &str = "docfold.toggleAtPoint";
/// Inspection feed: `[uri]`.
pub const LIST: &str = "docfold.list";

/// Command names for the server capability declaration.
pub fn all_commands() -> Vec<String> {
    vec![
        TOGGLE_ALL.to_string(),
        TOGGLE_AT_POINT.to_string(),
        LIST.to_string(),
    ]
}

/// Parsed command arguments: a document, optionally with a position.
#[derive(Debug)]
pub struct CommandArgs {
    pub uri: Url,
    pub position: Option<Position>,
}

impl CommandArgs {
    /// Parse `[uri]` or `[uri, position]` argument arrays.
    pub fn parse(arguments: &[Value]) -> Option<Self> {
        let uri = arguments
            .first()
            .and_then(|v| v.as_str())
            .and_then(|s| Url::parse(s).ok())?;
        let position = arguments
            .get(1)
            .and_then(|v| serde_json::from_value::<Position>(v.clone()).ok());
        Some(Self { uri, position })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToggleAllResult {
    hidden: bool,
    found: usize,
    ranges: Vec<Range>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToggleAtPointResult {
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    range: Option<Range>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListEntry {
    range: Range,
    char_count: usize,
    first_lines: Vec<String>,
    last_lines: Vec<String>,
}

/// Result of a whole-buffer toggle, with the currently-annotated ranges so
/// the client can refresh its decorations in one pass.
pub fn toggle_all_result(doc: &DocumentState, found: usize) -> Value {
    let ranges = doc
        .annotations
        .iter()
        .map(|a| doc.line_index.span_to_range(&a.range))
        .collect();
    to_value(ToggleAllResult {
        hidden: doc.hidden,
        found,
        ranges,
    })
}

/// Result of a point toggle.
pub fn toggle_at_point_result(line_index: &LineIndex, outcome: &ToggleOutcome) -> Value {
    let (outcome_str, range) = match outcome {
        ToggleOutcome::Hidden(range) => {
            ("hidden", range.as_ref().map(|r| line_index.span_to_range(r)))
        }
        ToggleOutcome::Shown => ("shown", None),
        ToggleOutcome::NotFound => ("notFound", None),
    };
    to_value(ToggleAtPointResult {
        outcome: outcome_str,
        range,
    })
}

/// Result of the inspection feed.
pub fn list_result(line_index: &LineIndex, listings: &[DocstringListing]) -> Value {
    let entries: Vec<ListEntry> = listings
        .iter()
        .map(|l| ListEntry {
            range: line_index.span_to_range(&l.span.as_range()),
            char_count: l.char_count,
            first_lines: l.first_lines.clone(),
            last_lines: l.last_lines.clone(),
        })
        .collect();
    to_value(entries)
}

fn to_value<T: Serialize>(value: T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_uri_only() {
        let args = [json!("file:///tmp/init.el")];
        let parsed = CommandArgs::parse(&args).unwrap();
        assert_eq!(parsed.uri.path(), "/tmp/init.el");
        assert!(parsed.position.is_none());
    }

    #[test]
    fn parse_uri_and_position() {
        let args = [
            json!("file:///tmp/init.el"),
            json!({"line": 3, "character": 7}),
        ];
        let parsed = CommandArgs::parse(&args).unwrap();
        assert_eq!(parsed.position, Some(Position::new(3, 7)));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(CommandArgs::parse(&[]).is_none());
        assert!(CommandArgs::parse(&[json!(42)]).is_none());
        assert!(CommandArgs::parse(&[json!("not a uri")]).is_none());
    }

    #[test]
    fn toggle_at_point_result_shape() {
        let idx = LineIndex::new("(defun f () \"Doc.\" nil)".to_string());
        let value = toggle_at_point_result(&idx, &ToggleOutcome::Hidden(Some(13..17)));
        assert_eq!(value["outcome"], "hidden");
        assert_eq!(value["range"]["start"]["character"], 13);

        let value = toggle_at_point_result(&idx, &ToggleOutcome::NotFound);
        assert_eq!(value["outcome"], "notFound");
        assert!(value.get("range").is_none());
    }
}
