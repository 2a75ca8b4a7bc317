//! Drag state machine: `Idle → Dragging → Idle`.
//!
//! Only one note can be dragged at a time. A new pointer-down replaces the
//! active drag; the replaced note stays wherever it was last drawn.

use crate::model::{NoteHandle, Point};

/// A drag in progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveDrag {
    pub note: NoteHandle,
    /// Pointer position at pointer-down.
    pub origin: Point,
    /// Note offset at pointer-down.
    pub start: Point,
    /// Latest pointer position.
    pub pointer: Point,
}

impl ActiveDrag {
    /// Where the note is drawn for the latest pointer position.
    #[must_use]
    pub fn position(&self) -> Point {
        self.start.translated(self.origin, self.pointer)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(ActiveDrag),
}

impl DragState {
    /// Begin dragging `note`. Returns the drag it replaced, if any.
    pub fn start(&mut self, note: NoteHandle, origin: Point, start: Point) -> Option<ActiveDrag> {
        let previous = self.active();
        *self = Self::Dragging(ActiveDrag {
            note,
            origin,
            start,
            pointer: origin,
        });
        previous
    }

    /// Record a pointer move. Returns the note and its new position while dragging.
    pub fn pointer_moved(&mut self, pointer: Point) -> Option<(NoteHandle, Point)> {
        match self {
            Self::Idle => None,
            Self::Dragging(drag) => {
                drag.pointer = pointer;
                Some((drag.note, drag.position()))
            }
        }
    }

    /// Release the drag, returning it so the final position can be saved.
    pub fn finish(&mut self) -> Option<ActiveDrag> {
        std::mem::take(self).active()
    }

    /// Abandon the drag if it targets `note`.
    pub fn cancel_for(&mut self, note: NoteHandle) -> bool {
        if self.active().is_some_and(|drag| drag.note == note) {
            *self = Self::Idle;
            true
        } else {
            false
        }
    }

    #[must_use]
    pub const fn active(&self) -> Option<ActiveDrag> {
        match self {
            Self::Idle => None,
            Self::Dragging(drag) => Some(*drag),
        }
    }
}
