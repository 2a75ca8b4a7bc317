//! In-memory picture of what the renderer shows.

use crate::model::{NoteHandle, NoteId, NoteRecord, Point};
use serde::Serialize;
use std::collections::BTreeMap;

/// One note as currently drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedNote {
    pub handle: NoteHandle,
    /// Durable id; `None` until the store acknowledges creation.
    pub id: Option<NoteId>,
    pub color: String,
    pub text: String,
    /// Explicit position (restored from the store or set by dragging).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<Point>,
    /// Where the layout engine placed the note, as reported by the renderer.
    #[serde(skip)]
    pub layout_offset: Option<Point>,
    pub z_index: u32,
}

impl RenderedNote {
    /// Unbound notes accept no edits, drags or deletes.
    #[must_use]
    pub const fn is_interactive(&self) -> bool {
        self.id.is_some()
    }

    /// The note's on-screen offset.
    #[must_use]
    pub fn current_offset(&self) -> Point {
        self.offset.or(self.layout_offset).unwrap_or_default()
    }
}

/// What a user-facing notice is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    SaveFailed,
    UpdateFailed,
    DeleteFailed,
    LoadFailed,
}

/// A message the UI should show the user (the board's "alert").
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<NoteHandle>,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn new(kind: NoticeKind, note: Option<NoteHandle>) -> Self {
        let message = match kind {
            NoticeKind::SaveFailed => "Could not save the note. Please try again.",
            NoticeKind::UpdateFailed => "Could not save your latest change to the note.",
            NoticeKind::DeleteFailed => "Could not delete the note. Please try again.",
            NoticeKind::LoadFailed => "Could not load your notes. Please reload the board.",
        };
        Self {
            kind,
            note,
            message: message.to_string(),
        }
    }
}

/// Rendered notes plus pending notices.
#[derive(Debug, Default)]
pub struct Board {
    notes: BTreeMap<NoteHandle, RenderedNote>,
    next_handle: u64,
    next_z: u32,
    notices: Vec<Notice>,
}

impl Board {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw a note the store has not acknowledged yet.
    pub fn render_pending(&mut self, color: &str) -> NoteHandle {
        self.insert(None, color.to_string(), String::new(), None)
    }

    /// Draw a stored note, restoring its position when it has one.
    pub fn render_record(&mut self, record: &NoteRecord) -> NoteHandle {
        self.insert(
            Some(record.id),
            record.color.clone(),
            record.text.clone(),
            record.position(),
        )
    }

    fn insert(
        &mut self,
        id: Option<NoteId>,
        color: String,
        text: String,
        offset: Option<Point>,
    ) -> NoteHandle {
        let handle = NoteHandle(self.next_handle);
        self.next_handle += 1;
        self.notes.insert(
            handle,
            RenderedNote {
                handle,
                id,
                color,
                text,
                offset,
                layout_offset: None,
                z_index: 0,
            },
        );
        handle
    }

    #[must_use]
    pub fn get(&self, handle: NoteHandle) -> Option<&RenderedNote> {
        self.notes.get(&handle)
    }

    pub fn get_mut(&mut self, handle: NoteHandle) -> Option<&mut RenderedNote> {
        self.notes.get_mut(&handle)
    }

    pub fn remove(&mut self, handle: NoteHandle) -> Option<RenderedNote> {
        self.notes.remove(&handle)
    }

    /// Put `handle` above every other note. Returns its new z-index.
    pub fn raise(&mut self, handle: NoteHandle) -> Option<u32> {
        let note = self.notes.get_mut(&handle)?;
        self.next_z += 1;
        note.z_index = self.next_z;
        Some(note.z_index)
    }

    pub fn notes(&self) -> impl Iterator<Item = &RenderedNote> {
        self.notes.values()
    }

    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}
