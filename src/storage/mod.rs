//! `SQLite` storage layer for the note board.
//!
//! This module provides the persistence layer using `SQLite` with:
//! - A connection lifecycle (`Closed → Opening → [SchemaUpgrade →] Open`)
//! - Schema versioning through `PRAGMA user_version`
//! - One short-lived transaction per CRUD operation
//!
//! # Submodules
//!
//! - [`schema`] - Database schema definitions and upgrades
//! - [`sqlite`] - The async note store

pub mod schema;
pub mod sqlite;

pub use sqlite::{ConnectionState, NoteStore, StoreLocation, StoreOptions};
