//! Note data types shared by the store and the board.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Durable identity of a stored note, assigned by the store on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(pub i64);

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transient identity of a rendered note, assigned by the board.
///
/// A handle exists from the moment a note is drawn, which can be before the
/// store has handed out a [`NoteId`] for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteHandle(pub u64);

impl fmt::Display for NoteHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "note-{}", self.0)
    }
}

/// A stored note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub id: NoteId,
    pub color: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
}

impl NoteRecord {
    /// The stored position, if both offsets are present and readable.
    #[must_use]
    pub fn position(&self) -> Option<Point> {
        let x = parse_px(self.x.as_deref()?)?;
        let y = parse_px(self.y.as_deref()?)?;
        Some(Point { x, y })
    }
}

/// Fields supplied when creating a note. Position is never set at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNote {
    pub color: String,
    #[serde(default)]
    pub text: String,
}

impl NewNote {
    #[must_use]
    pub fn new(color: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            color: color.into(),
            text: text.into(),
        }
    }
}

/// Partial update of a stored note. `None` fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
}

impl NotePatch {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn position(point: Point) -> Self {
        Self {
            x: Some(format_px(point.x)),
            y: Some(format_px(point.y)),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.color.is_none() && self.text.is_none() && self.x.is_none() && self.y.is_none()
    }

    /// Merge this patch over `record`, field by field.
    pub fn apply_to(&self, record: &mut NoteRecord) {
        if let Some(color) = &self.color {
            record.color.clone_from(color);
        }
        if let Some(text) = &self.text {
            record.text.clone_from(text);
        }
        if let Some(x) = &self.x {
            record.x = Some(x.clone());
        }
        if let Some(y) = &self.y {
            record.y = Some(y.clone());
        }
    }
}

/// A screen coordinate or offset, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// `self` moved by the distance travelled from `from` to `to`.
    #[must_use]
    pub fn translated(self, from: Self, to: Self) -> Self {
        Self {
            x: self.x + (to.x - from.x),
            y: self.y + (to.y - from.y),
        }
    }
}

/// Format a pixel offset the way it is persisted, e.g. `120px`.
#[must_use]
pub fn format_px(value: f64) -> String {
    format!("{value}px")
}

/// Parse a persisted pixel offset. Accepts a bare number as well as `Npx`.
#[must_use]
pub fn parse_px(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let number = trimmed.strip_suffix("px").unwrap_or(trimmed).trim();
    number.parse::<f64>().ok().filter(|v| v.is_finite())
}
