//! `SQLite` note store.
//!
//! The store owns one lazily opened connection. Every CRUD call runs on
//! tokio's blocking pool inside its own transaction, so callers on the async
//! side only ever suspend, never block.

use crate::error::{BoardError, Result};
use crate::model::{NewNote, NoteId, NotePatch, NoteRecord};
use crate::storage::schema::{self, CURRENT_SCHEMA_VERSION, SchemaAction};
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Default time a write waits on a lock held by another process.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the note database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    File(PathBuf),
    /// A private in-memory database; its contents die with the connection.
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    pub location: StoreLocation,
    pub busy_timeout: Duration,
}

impl StoreOptions {
    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            location: StoreLocation::File(path.into()),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn memory() -> Self {
        Self {
            location: StoreLocation::Memory,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }
}

/// Observable phase of the connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Closed,
    Opening,
    SchemaUpgrade,
    Open,
}

type SharedConnection = Arc<Mutex<Connection>>;

enum Slot {
    Closed,
    Opening,
    SchemaUpgrade,
    Open(SharedConnection),
}

impl Slot {
    const fn state(&self) -> ConnectionState {
        match self {
            Self::Closed => ConnectionState::Closed,
            Self::Opening => ConnectionState::Opening,
            Self::SchemaUpgrade => ConnectionState::SchemaUpgrade,
            Self::Open(_) => ConnectionState::Open,
        }
    }
}

/// Durable, versioned note storage.
///
/// Construct one per board and share it (e.g. behind an `Arc`); the store
/// assumes it is the only handle opening its database in this process.
pub struct NoteStore {
    options: StoreOptions,
    slot: Arc<Mutex<Slot>>,
    open_gate: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for NoteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoteStore")
            .field("options", &self.options)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl NoteStore {
    /// Create a closed store. Nothing touches disk until [`open`](Self::open).
    #[must_use]
    pub fn new(options: StoreOptions) -> Self {
        Self {
            options,
            slot: Arc::new(Mutex::new(Slot::Closed)),
            open_gate: tokio::sync::Mutex::new(()),
        }
    }

    #[must_use]
    pub fn at_path(path: &Path) -> Self {
        Self::new(StoreOptions::file(path))
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(StoreOptions::memory())
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        lock_slot(&self.slot).state()
    }

    /// Open the database, running the schema upgrade if it is out of date.
    ///
    /// Returns immediately when already open. Concurrent callers wait for the
    /// attempt in flight and share its outcome.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Connection`] if the database cannot be opened,
    /// is not a database, or was written by a newer schema version. The
    /// store is left `Closed` so a later call can try again.
    pub async fn open(&self) -> Result<()> {
        if self.state() == ConnectionState::Open {
            return Ok(());
        }

        let _gate = self.open_gate.lock().await;
        if self.state() == ConnectionState::Open {
            return Ok(());
        }

        *lock_slot(&self.slot) = Slot::Opening;
        info!(location = ?self.options.location, "Opening note store");

        let options = self.options.clone();
        let slot = Arc::clone(&self.slot);
        let opened = match tokio::task::spawn_blocking(move || open_connection(&options, &slot))
            .await
        {
            Ok(result) => result,
            Err(join) => Err(BoardError::connection(format!("open task failed: {join}"))),
        };

        match opened {
            Ok(conn) => {
                *lock_slot(&self.slot) = Slot::Open(Arc::new(Mutex::new(conn)));
                info!("Note store open");
                Ok(())
            }
            Err(err) => {
                *lock_slot(&self.slot) = Slot::Closed;
                error!(error = %err, "Failed to open note store");
                Err(err)
            }
        }
    }

    /// Drop the connection and return to `Closed`.
    ///
    /// Operations already running keep their connection until they finish.
    pub async fn close(&self) {
        let _gate = self.open_gate.lock().await;
        *lock_slot(&self.slot) = Slot::Closed;
        debug!("Note store closed");
    }

    /// Insert a new note without a position and return its assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotOpen`] before a successful `open()`, or
    /// [`BoardError::Write`] if the insert fails.
    pub async fn create(&self, note: NewNote) -> Result<NoteId> {
        let id = self
            .run("create", move |conn| {
                mutate(conn, "create", |tx| {
                    tx.execute(
                        "INSERT INTO notes (color, text) VALUES (?1, ?2)",
                        rusqlite::params![note.color, note.text],
                    )?;
                    Ok(NoteId(tx.last_insert_rowid()))
                })
            })
            .await
            .inspect_err(|err| warn!(error = %err, "Failed to create note"))?;

        debug!(%id, "Created note");
        Ok(id)
    }

    /// Fetch one note.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotFound`] if no note has this id,
    /// [`BoardError::NotOpen`] before `open()`, or [`BoardError::Connection`]
    /// on a database fault.
    pub async fn read(&self, id: NoteId) -> Result<NoteRecord> {
        self.run("read", move |conn| {
            let tx = conn.transaction().map_err(BoardError::connection)?;
            fetch_note(&tx, id)
                .map_err(BoardError::connection)?
                .ok_or(BoardError::NotFound { id })
        })
        .await
    }

    /// Fetch every stored note, in ascending id order.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotOpen`] before `open()`, or
    /// [`BoardError::Connection`] on a database fault.
    pub async fn read_all(&self) -> Result<Vec<NoteRecord>> {
        let notes = self
            .run("read_all", |conn| {
                let tx = conn.transaction().map_err(BoardError::connection)?;
                let mut stmt = tx
                    .prepare("SELECT id, color, text, x, y FROM notes ORDER BY id")
                    .map_err(BoardError::connection)?;
                let rows = stmt
                    .query_map([], note_from_row)
                    .map_err(BoardError::connection)?;
                let notes = rows
                    .collect::<rusqlite::Result<Vec<_>>>()
                    .map_err(BoardError::connection)?;
                Ok(notes)
            })
            .await?;

        debug!(count = notes.len(), "Read all notes");
        Ok(notes)
    }

    /// Merge `patch` over the stored note and write the result back.
    ///
    /// The read and the write share one immediate transaction. If the row is
    /// gone by the time the write lands, the call fails with `NotFound`.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotFound`] for a missing id,
    /// [`BoardError::NotOpen`] before `open()`, or [`BoardError::Write`].
    pub async fn update(&self, id: NoteId, patch: NotePatch) -> Result<NoteRecord> {
        let note = self
            .run("update", move |conn| {
                mutate(conn, "update", |tx| {
                    let Some(mut note) = fetch_note(tx, id)? else {
                        return Err(Missing(id).into());
                    };
                    if patch.is_empty() {
                        return Ok(note);
                    }
                    patch.apply_to(&mut note);

                    let changed = tx.execute(
                        "UPDATE notes SET color = ?1, text = ?2, x = ?3, y = ?4 WHERE id = ?5",
                        rusqlite::params![note.color, note.text, note.x, note.y, id.0],
                    )?;
                    if changed == 0 {
                        return Err(Missing(id).into());
                    }
                    Ok(note)
                })
            })
            .await
            .inspect_err(|err| warn!(%id, error = %err, "Failed to update note"))?;

        debug!(%id, "Updated note");
        Ok(note)
    }

    /// Delete a note. Deleting an id that does not exist is not an error.
    ///
    /// Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotOpen`] before `open()`, or [`BoardError::Write`].
    pub async fn delete(&self, id: NoteId) -> Result<bool> {
        let removed = self
            .run("delete", move |conn| {
                mutate(conn, "delete", |tx| {
                    Ok(tx.execute("DELETE FROM notes WHERE id = ?1", [id.0])? > 0)
                })
            })
            .await
            .inspect_err(|err| warn!(%id, error = %err, "Failed to delete note"))?;

        debug!(%id, removed, "Deleted note");
        Ok(removed)
    }

    /// Number of stored notes.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotOpen`] before `open()`, or
    /// [`BoardError::Connection`] on a database fault.
    pub async fn count(&self) -> Result<usize> {
        self.run("count", |conn| {
            let count: i64 = conn
                .query_row("SELECT count(*) FROM notes", [], |row| row.get(0))
                .map_err(BoardError::connection)?;
            Ok(usize::try_from(count).unwrap_or(0))
        })
        .await
    }

    /// Schema version recorded in the open database.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotOpen`] before `open()`, or
    /// [`BoardError::Connection`] if the version cannot be read.
    pub async fn schema_version(&self) -> Result<i32> {
        self.run("schema_version", |conn| {
            schema::schema_version(conn).map_err(BoardError::connection)
        })
        .await
    }

    /// Run `f` against the open connection on the blocking pool.
    async fn run<T, F>(&self, op: &'static str, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let conn = self.connection()?;
        match tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut guard)
        })
        .await
        {
            Ok(result) => result,
            Err(join) => Err(BoardError::connection(format!("{op} task failed: {join}"))),
        }
    }

    fn connection(&self) -> Result<SharedConnection> {
        match &*lock_slot(&self.slot) {
            Slot::Open(conn) => Ok(Arc::clone(conn)),
            Slot::Closed | Slot::Opening | Slot::SchemaUpgrade => Err(BoardError::NotOpen),
        }
    }
}

fn lock_slot(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

fn open_connection(options: &StoreOptions, slot: &Mutex<Slot>) -> Result<Connection> {
    let mut conn = match &options.location {
        StoreLocation::File(path) => Connection::open(path),
        StoreLocation::Memory => Connection::open_in_memory(),
    }
    .map_err(BoardError::connection)?;

    schema::configure(&conn, options.busy_timeout).map_err(BoardError::connection)?;

    match schema::plan(&conn).map_err(BoardError::connection)? {
        SchemaAction::Current => {}
        SchemaAction::Upgrade { from } => {
            *lock_slot(slot) = Slot::SchemaUpgrade;
            info!(from, to = CURRENT_SCHEMA_VERSION, "Upgrading note store schema");
            schema::upgrade(&mut conn, from).map_err(BoardError::connection)?;
        }
        SchemaAction::TooNew { found } => {
            return Err(BoardError::connection(format!(
                "database schema version {found} is newer than supported version {CURRENT_SCHEMA_VERSION}"
            )));
        }
    }

    Ok(conn)
}

/// A note vanished inside a write transaction.
struct Missing(NoteId);

/// Failure inside a write transaction, before it is mapped to a `BoardError`.
enum TxError {
    Sql(rusqlite::Error),
    Missing(NoteId),
}

impl From<rusqlite::Error> for TxError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Sql(err)
    }
}

impl From<Missing> for TxError {
    fn from(Missing(id): Missing) -> Self {
        Self::Missing(id)
    }
}

/// Run `f` in an immediate transaction, committing only if it succeeds.
fn mutate<R>(
    conn: &mut Connection,
    op: &'static str,
    f: impl FnOnce(&Transaction<'_>) -> std::result::Result<R, TxError>,
) -> Result<R> {
    let to_board_error = |err: TxError| match err {
        TxError::Sql(source) => BoardError::write(op, source),
        TxError::Missing(id) => BoardError::NotFound { id },
    };

    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|source| BoardError::write(op, source))?;
    let result = f(&tx).map_err(to_board_error)?;
    tx.commit().map_err(|source| BoardError::write(op, source))?;
    Ok(result)
}

fn fetch_note(conn: &Connection, id: NoteId) -> rusqlite::Result<Option<NoteRecord>> {
    conn.query_row(
        "SELECT id, color, text, x, y FROM notes WHERE id = ?1",
        [id.0],
        note_from_row,
    )
    .optional()
}

fn note_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<NoteRecord> {
    Ok(NoteRecord {
        id: NoteId(row.get(0)?),
        color: row.get(1)?,
        text: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        x: row.get(3)?,
        y: row.get(4)?,
    })
}
