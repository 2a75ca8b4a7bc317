//! `stickyboard` - sticky-notes board with a persistent note store
//!
//! This crate provides the note store, the layer that keeps a rendered board
//! in step with it, and the `stickyboard` CLI built on both.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - [`model`] - Data types (`NoteRecord`, `NotePatch`, ids, positions)
//! - [`storage`] - `SQLite` note store with an explicit connection lifecycle
//! - [`sync`] - Board synchronization: optimistic add, saves, drag
//! - [`config`] - Configuration management
//! - [`cli`] - Command-line interface using clap
//! - [`error`] - Error types and handling
//! - [`logging`] - tracing setup

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod storage;
pub mod sync;

pub use error::{BoardError, Result};
pub use model::{NewNote, NoteHandle, NoteId, NotePatch, NoteRecord, Point};
pub use storage::{ConnectionState, NoteStore, StoreLocation, StoreOptions};
pub use sync::NoteSync;
