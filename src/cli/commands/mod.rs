//! Command implementations.

pub mod notes;
pub mod replay;
