//! Replay command: drive a board from a JSON-lines event script.

use crate::cli::{CommandContext, ReplayArgs};
use crate::config;
use crate::error::Result;
use crate::sync::{NoteSync, Notice, RenderedNote, read_script};
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Serialize)]
struct ReplayOutput<'a> {
    notes: &'a [RenderedNote],
    notices: &'a [Notice],
}

/// Execute the replay command.
///
/// Events are applied in order. Background saves are awaited before the
/// final board is printed, including when an event fails.
///
/// # Errors
///
/// Returns an error if the script cannot be read, or the first error raised
/// by an event.
pub async fn execute(ctx: &CommandContext, args: &ReplayArgs) -> Result<()> {
    let events = read_script(&args.script)?;
    let default_color = &ctx.config.default_color;

    let store = Arc::new(config::board_store(&ctx.config)?);
    let sync = NoteSync::new(store);
    sync.load_all().await?;

    let mut pending: Vec<JoinHandle<()>> = Vec::new();
    let mut outcome = Ok(());
    for (index, event) in events.iter().enumerate() {
        debug!(line = index + 1, ?event, "Applying event");
        match sync.apply(event, default_color).await {
            Ok(Some(task)) => pending.push(task),
            Ok(None) => {}
            Err(err) => {
                warn!(line = index + 1, error = %err, "Replay stopped");
                outcome = Err(err);
                break;
            }
        }
    }

    for task in pending {
        if let Err(err) = task.await {
            warn!(error = %err, "Save task did not finish");
        }
    }
    outcome?;

    let notes = sync.snapshot();
    let notices = sync.take_notices();
    info!(events = events.len(), notes = notes.len(), "Replay finished");

    if ctx.json {
        let output = ReplayOutput {
            notes: &notes,
            notices: &notices,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    for note in &notes {
        let id = note
            .id
            .map_or_else(|| "unbound".to_string(), |id| id.to_string());
        let offset = note.current_offset();
        println!(
            "{}  id={}  {}  ({}, {})  {}",
            note.handle, id, note.color, offset.x, offset.y, note.text
        );
    }
    for notice in &notices {
        println!("! {}", notice.message);
    }
    Ok(())
}
