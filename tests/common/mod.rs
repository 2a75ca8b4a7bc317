#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Once};
use stickyboard::storage::NoteStore;
use stickyboard::sync::NoteSync;
use tempfile::TempDir;

pub mod scenarios;

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        stickyboard::logging::init_test_logging();
    });
}

pub async fn test_store() -> NoteStore {
    init_test_logging();
    let store = NoteStore::in_memory();
    store.open().await.expect("Failed to open test store");
    store
}

pub async fn test_store_with_dir() -> (NoteStore, TempDir) {
    init_test_logging();
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = NoteStore::at_path(&db_path(&dir));
    store.open().await.expect("Failed to open test store");
    (store, dir)
}

pub fn db_path(dir: &TempDir) -> PathBuf {
    dir.path().join("notes.db")
}

pub async fn test_sync() -> NoteSync {
    NoteSync::new(Arc::new(test_store().await))
}

/// A sync layer whose store can never open: its database would live in a
/// directory that does not exist.
pub fn broken_sync(dir: &TempDir) -> NoteSync {
    init_test_logging();
    let path = dir.path().join("missing").join("notes.db");
    NoteSync::new(Arc::new(NoteStore::at_path(&path)))
}
