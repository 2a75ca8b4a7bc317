//! JSON-lines scripts of UI events, used to drive a board without a renderer.
//!
//! One event per line, e.g.
//!
//! ```text
//! {"event": "add", "color": "#ff0000"}
//! {"event": "text", "note": 0, "text": "hello"}
//! {"event": "drag_start", "note": 0, "x": 10, "y": 10}
//! {"event": "drag_move", "x": 60, "y": 90}
//! {"event": "drag_end"}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use crate::error::{BoardError, Result};
use crate::model::NoteHandle;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A UI event, as the renderer would report it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum UiEvent {
    /// "New note" button; `color` falls back to the configured default.
    Add {
        #[serde(default)]
        color: Option<String>,
    },
    Text {
        note: NoteHandle,
        text: String,
    },
    /// The renderer reports where layout placed a note.
    Layout {
        note: NoteHandle,
        x: f64,
        y: f64,
    },
    DragStart {
        note: NoteHandle,
        x: f64,
        y: f64,
    },
    DragMove {
        x: f64,
        y: f64,
    },
    DragEnd,
    Delete {
        note: NoteHandle,
    },
}

/// Parse a script from a string.
///
/// # Errors
///
/// Returns an error naming the first line that is not a valid event.
pub fn parse_script(input: &str) -> Result<Vec<UiEvent>> {
    input
        .lines()
        .enumerate()
        .filter_map(|(line_num, line)| parse_line(line_num, line).transpose())
        .collect()
}

/// Read a script file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or contains an invalid event.
pub fn read_script(path: &Path) -> Result<Vec<UiEvent>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut events = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        if let Some(event) = parse_line(line_num, &line)? {
            events.push(event);
        }
    }

    Ok(events)
}

fn parse_line(line_num: usize, line: &str) -> Result<Option<UiEvent>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(trimmed).map(Some).map_err(|e| {
        BoardError::Config(format!("Invalid event at line {}: {}", line_num + 1, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_event_kind() {
        let script = r##"
# seed
{"event": "add"}
{"event": "add", "color": "#00ff00"}
{"event": "text", "note": 1, "text": "hi"}
{"event": "layout", "note": 1, "x": 4, "y": 8}
{"event": "drag_start", "note": 1, "x": 10, "y": 10}
{"event": "drag_move", "x": 20.5, "y": 30}
{"event": "drag_end"}
{"event": "delete", "note": 1}
"##;
        let events = parse_script(script).unwrap();
        assert_eq!(events.len(), 8);
        assert_eq!(events[0], UiEvent::Add { color: None });
        assert_eq!(
            events[2],
            UiEvent::Text {
                note: NoteHandle(1),
                text: "hi".to_string()
            }
        );
        assert_eq!(events[5], UiEvent::DragMove { x: 20.5, y: 30.0 });
        assert_eq!(events[6], UiEvent::DragEnd);
    }

    #[test]
    fn reports_offending_line() {
        let err = parse_script("{\"event\": \"add\"}\n\n{\"event\": \"fly\"}").unwrap_err();
        assert!(err.to_string().contains("line 3"), "got: {err}");
    }

    #[test]
    fn reads_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("events.jsonl");
        std::fs::write(&path, "{\"event\": \"drag_end\"}\n").unwrap();
        assert_eq!(read_script(&path).unwrap(), vec![UiEvent::DragEnd]);
    }
}
