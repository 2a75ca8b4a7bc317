//! Synchronization between the rendered board and the note store.
//!
//! UI events land here. Each one updates the rendered [`Board`] and issues
//! the matching store call:
//!
//! - add: draw first, then bind the durable id once `create` returns
//! - text edit: update the drawing, save in a background task
//! - delete: remove the drawing only after the store delete succeeds
//! - drag: move the drawing on every pointer move, save once on release
//!
//! Failures never roll the drawing back; they are logged and turned into a
//! [`Notice`] for the user. Nothing is retried.
//!
//! Background saves commit in the order they were issued: each one waits for
//! the save before it, so the store ends up holding what the board shows.
//!
//! # Submodules
//!
//! - [`board`] - Rendered notes and notices
//! - [`drag`] - Drag state machine
//! - [`script`] - JSON-lines UI event scripts

pub mod board;
pub mod drag;
pub mod script;

pub use board::{Board, Notice, NoticeKind, RenderedNote};
pub use drag::{ActiveDrag, DragState};
pub use script::{UiEvent, parse_script, read_script};

use crate::error::{BoardError, Result};
use crate::model::{NewNote, NoteHandle, NoteId, NotePatch, NoteRecord, Point};
use crate::storage::NoteStore;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Maps UI events onto store calls and keeps the board in step.
///
/// Cheap to share behind an `Arc`; events may arrive while earlier store
/// calls are still in flight.
#[derive(Debug)]
pub struct NoteSync {
    store: Arc<NoteStore>,
    board: Arc<Mutex<Board>>,
    drag: Mutex<DragState>,
    /// Completion signal of the most recently issued save.
    save_tail: Mutex<Option<oneshot::Receiver<()>>>,
}

/// A save's place in the queue: wait on `previous`, then fire `done`.
struct SaveSlot {
    previous: Option<oneshot::Receiver<()>>,
    done: oneshot::Sender<()>,
}

impl NoteSync {
    #[must_use]
    pub fn new(store: Arc<NoteStore>) -> Self {
        Self {
            store,
            board: Arc::new(Mutex::new(Board::new())),
            drag: Mutex::new(DragState::Idle),
            save_tail: Mutex::new(None),
        }
    }

    #[must_use]
    pub const fn store(&self) -> &Arc<NoteStore> {
        &self.store
    }

    /// Render every stored note.
    ///
    /// On failure nothing is rendered and a load notice is raised.
    ///
    /// # Errors
    ///
    /// Returns the store error if the notes cannot be read.
    pub async fn load_all(&self) -> Result<Vec<NoteHandle>> {
        let records = match self.fetch_all().await {
            Ok(records) => records,
            Err(err) => {
                error!(error = %err, "Error loading notes");
                self.notify(Notice::new(NoticeKind::LoadFailed, None));
                return Err(err);
            }
        };

        let mut board = self.board();
        let handles: Vec<NoteHandle> = records
            .iter()
            .map(|record| board.render_record(record))
            .collect();
        info!(count = handles.len(), "Loaded notes");
        Ok(handles)
    }

    async fn fetch_all(&self) -> Result<Vec<NoteRecord>> {
        self.store.open().await?;
        self.store.read_all().await
    }

    /// Handle the "new note" action.
    ///
    /// The note is drawn immediately but stays non-interactive until the
    /// store returns its id. If creation fails the drawing remains unbound
    /// and a save notice is raised; a new add is needed to retry.
    ///
    /// # Errors
    ///
    /// Returns the store error if the note could not be created.
    pub async fn on_add_requested(&self, color: &str) -> Result<NoteHandle> {
        let handle = self.board().render_pending(color);
        debug!(%handle, color, "Rendered pending note");

        match create_note(&self.store, NewNote::new(color, "")).await {
            Ok(id) => {
                if let Some(note) = self.board().get_mut(handle) {
                    note.id = Some(id);
                }
                info!(%handle, %id, "Note added");
                Ok(handle)
            }
            Err(err) => {
                error!(%handle, error = %err, "Error adding note");
                self.notify(Notice::new(NoticeKind::SaveFailed, Some(handle)));
                Err(err)
            }
        }
    }

    /// Handle a text change. The drawing updates now; the save runs in the
    /// returned task, which callers may await or drop.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::UnknownNote`] or [`BoardError::Unbound`] without
    /// touching the store.
    pub fn on_text_changed(&self, handle: NoteHandle, text: &str) -> Result<JoinHandle<()>> {
        let (id, slot) = {
            let mut board = self.board();
            let note = interactive_note(&mut board, handle)?;
            let id = note.id.ok_or(BoardError::Unbound(handle))?;
            note.text = text.to_string();
            (id, self.next_save_slot())
        };
        Ok(self.spawn_update(handle, id, NotePatch::text(text), slot))
    }

    /// Handle a delete. The drawing is removed only once the store delete
    /// succeeds; on failure the note stays and a delete notice is raised.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::UnknownNote`] or [`BoardError::Unbound`] before
    /// any store call, or the store error from the delete.
    pub async fn on_delete_requested(&self, handle: NoteHandle) -> Result<()> {
        let id = self.bound_id(handle)?;

        match delete_note(&self.store, id).await {
            Ok(()) => {
                self.board().remove(handle);
                if self.drag_state().cancel_for(handle) {
                    debug!(%handle, "Dropped drag of deleted note");
                }
                info!(%handle, %id, "Note deleted");
                Ok(())
            }
            Err(err) => {
                error!(%handle, %id, error = %err, "Error deleting note");
                self.notify(Notice::new(NoticeKind::DeleteFailed, Some(handle)));
                Err(err)
            }
        }
    }

    /// Record where layout placed a note that has no explicit position.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::UnknownNote`] if the note is not rendered.
    pub fn report_layout(&self, handle: NoteHandle, offset: Point) -> Result<()> {
        let mut board = self.board();
        let note = board
            .get_mut(handle)
            .ok_or(BoardError::UnknownNote(handle))?;
        note.layout_offset = Some(offset);
        Ok(())
    }

    /// Pointer-down on a note header. Any drag already active is abandoned
    /// where it was last drawn.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::UnknownNote`] or [`BoardError::Unbound`].
    pub fn on_drag_start(&self, handle: NoteHandle, origin: Point) -> Result<()> {
        let start = {
            let mut board = self.board();
            let start = interactive_note(&mut board, handle)?.current_offset();
            board.raise(handle);
            start
        };

        if let Some(replaced) = self.drag_state().start(handle, origin, start) {
            warn!(
                abandoned = %replaced.note,
                %handle,
                "Drag started while another was active"
            );
        }
        debug!(%handle, ?origin, ?start, "Drag started");
        Ok(())
    }

    /// Pointer move. Repositions the dragged note on the board only; nothing
    /// is saved. Returns the note's new offset, or `None` when idle.
    pub fn on_drag_move(&self, pointer: Point) -> Option<Point> {
        let mut drag = self.drag_state();
        let (handle, position) = drag.pointer_moved(pointer)?;

        let mut board = self.board();
        if let Some(note) = board.get_mut(handle) {
            note.offset = Some(position);
            Some(position)
        } else {
            drag.cancel_for(handle);
            debug!(%handle, "Dragged note disappeared");
            None
        }
    }

    /// Pointer-up. Releases the drag and saves the final position once in
    /// the returned task. Returns `None` when no drag was active.
    ///
    /// The drag is released whether or not the save succeeds; a failed save
    /// leaves the note where it was dropped and raises an update notice.
    pub fn on_drag_end(&self) -> Option<JoinHandle<()>> {
        let drag = self.drag_state().finish()?;

        let (id, position, slot) = {
            let mut board = self.board();
            let note = board.get_mut(drag.note)?;
            let position = drag.position();
            note.offset = Some(position);
            (note.id?, position, self.next_save_slot())
        };

        debug!(handle = %drag.note, %id, ?position, "Drag ended");
        Some(self.spawn_update(
            drag.note,
            id,
            NotePatch::position(position),
            slot,
        ))
    }

    /// Apply one scripted UI event.
    ///
    /// Returns the background save task, when the event started one.
    ///
    /// # Errors
    ///
    /// Returns whatever the matching handler returns.
    pub async fn apply(
        &self,
        event: &UiEvent,
        default_color: &str,
    ) -> Result<Option<JoinHandle<()>>> {
        match event {
            UiEvent::Add { color } => {
                self.on_add_requested(color.as_deref().unwrap_or(default_color))
                    .await?;
                Ok(None)
            }
            UiEvent::Text { note, text } => self.on_text_changed(*note, text).map(Some),
            UiEvent::Layout { note, x, y } => {
                self.report_layout(*note, Point::new(*x, *y))?;
                Ok(None)
            }
            UiEvent::DragStart { note, x, y } => {
                self.on_drag_start(*note, Point::new(*x, *y))?;
                Ok(None)
            }
            UiEvent::DragMove { x, y } => {
                self.on_drag_move(Point::new(*x, *y));
                Ok(None)
            }
            UiEvent::DragEnd => Ok(self.on_drag_end()),
            UiEvent::Delete { note } => {
                self.on_delete_requested(*note).await?;
                Ok(None)
            }
        }
    }

    /// A copy of one rendered note.
    #[must_use]
    pub fn note(&self, handle: NoteHandle) -> Option<RenderedNote> {
        self.board().get(handle).cloned()
    }

    /// A copy of every rendered note, in handle order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<RenderedNote> {
        self.board().notes().cloned().collect()
    }

    /// The active drag, if any.
    #[must_use]
    pub fn active_drag(&self) -> Option<ActiveDrag> {
        self.drag_state().active()
    }

    /// Drain notices raised since the last call.
    pub fn take_notices(&self) -> Vec<Notice> {
        self.board().take_notices()
    }

    /// Queue the next save behind the last one issued. Callers take the slot
    /// while holding the board lock, so save order matches edit order.
    fn next_save_slot(&self) -> SaveSlot {
        let (done, tail) = oneshot::channel();
        let previous = lock(&self.save_tail).replace(tail);
        SaveSlot { previous, done }
    }

    fn spawn_update(
        &self,
        handle: NoteHandle,
        id: NoteId,
        patch: NotePatch,
        slot: SaveSlot,
    ) -> JoinHandle<()> {
        let store = Arc::clone(&self.store);
        let board = Arc::clone(&self.board);
        tokio::spawn(async move {
            if let Some(previous) = slot.previous {
                // A closed channel means the earlier save task ended early.
                let _ = previous.await;
            }
            match update_note(&store, id, patch).await {
                Ok(_) => debug!(%handle, %id, "Note saved"),
                Err(err) => {
                    error!(%handle, %id, error = %err, "Error saving note");
                    lock(&board).push_notice(Notice::new(NoticeKind::UpdateFailed, Some(handle)));
                }
            }
            let _ = slot.done.send(());
        })
    }

    fn bound_id(&self, handle: NoteHandle) -> Result<NoteId> {
        let mut board = self.board();
        let note = interactive_note(&mut board, handle)?;
        note.id.ok_or(BoardError::Unbound(handle))
    }

    fn notify(&self, notice: Notice) {
        self.board().push_notice(notice);
    }

    fn board(&self) -> MutexGuard<'_, Board> {
        lock(&self.board)
    }

    fn drag_state(&self) -> MutexGuard<'_, DragState> {
        lock(&self.drag)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn interactive_note(board: &mut Board, handle: NoteHandle) -> Result<&mut RenderedNote> {
    let note = board
        .get_mut(handle)
        .ok_or(BoardError::UnknownNote(handle))?;
    if note.is_interactive() {
        Ok(note)
    } else {
        Err(BoardError::Unbound(handle))
    }
}

async fn create_note(store: &NoteStore, note: NewNote) -> Result<NoteId> {
    store.open().await?;
    store.create(note).await
}

async fn update_note(store: &NoteStore, id: NoteId, patch: NotePatch) -> Result<NoteRecord> {
    store.open().await?;
    store.update(id, patch).await
}

async fn delete_note(store: &NoteStore, id: NoteId) -> Result<()> {
    store.open().await?;
    store.delete(id).await?;
    Ok(())
}
