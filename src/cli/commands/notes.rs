//! Direct note commands: list, show, add, edit, move, delete.

use crate::cli::CommandContext;
use crate::error::{BoardError, Result};
use crate::model::{NewNote, NoteId, NotePatch, NoteRecord, Point, parse_px};
use serde_json::json;
use tracing::{debug, info};

/// Execute the list command.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or read.
pub async fn list(ctx: &CommandContext) -> Result<()> {
    let store = ctx.open_store().await?;
    let notes = store.read_all().await?;
    debug!(count = notes.len(), "Listing notes");

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&notes)?);
        return Ok(());
    }

    if notes.is_empty() {
        println!("No notes.");
        return Ok(());
    }
    for note in &notes {
        println!("{}", summary_line(note));
    }
    Ok(())
}

/// Execute the show command.
///
/// # Errors
///
/// Returns [`BoardError::NotFound`] if no note has this id.
pub async fn show(ctx: &CommandContext, id: i64) -> Result<()> {
    let store = ctx.open_store().await?;
    let note = store.read(NoteId(id)).await?;

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&note)?);
    } else {
        println!("Note {}", note.id);
        println!("  color: {}", note.color);
        println!("  position: {}", position_label(&note));
        if note.text.is_empty() {
            println!("  text: (empty)");
        } else {
            println!("  text:");
            for line in note.text.lines() {
                println!("    {line}");
            }
        }
    }
    Ok(())
}

/// Execute the add command.
///
/// # Errors
///
/// Returns an error if the note cannot be created.
pub async fn add(ctx: &CommandContext, text: &str) -> Result<()> {
    let store = ctx.open_store().await?;
    let color = ctx.config.default_color.clone();
    let id = store.create(NewNote::new(color, text)).await?;
    info!(%id, "Created note");

    if ctx.json {
        println!("{}", json!({ "id": id }));
    } else {
        println!("Created note {id}");
    }
    Ok(())
}

/// Execute the edit command.
///
/// # Errors
///
/// Returns [`BoardError::NotFound`] if no note has this id.
pub async fn edit(ctx: &CommandContext, id: i64, text: &str) -> Result<()> {
    let store = ctx.open_store().await?;
    let note = store.update(NoteId(id), NotePatch::text(text)).await?;
    info!(id = %note.id, "Updated note text");
    print_updated(ctx, &note)
}

/// Execute the move command.
///
/// # Errors
///
/// Returns [`BoardError::InvalidPosition`] for unreadable offsets and
/// [`BoardError::NotFound`] if no note has this id.
pub async fn move_note(ctx: &CommandContext, id: i64, x: &str, y: &str) -> Result<()> {
    let point = Point::new(parse_offset(x)?, parse_offset(y)?);
    let store = ctx.open_store().await?;
    let note = store.update(NoteId(id), NotePatch::position(point)).await?;
    info!(id = %note.id, x = point.x, y = point.y, "Moved note");
    print_updated(ctx, &note)
}

/// Execute the delete command. Deleting a missing note is not an error.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or written.
pub async fn delete(ctx: &CommandContext, id: i64) -> Result<()> {
    let store = ctx.open_store().await?;
    let id = NoteId(id);
    let existed = store.delete(id).await?;
    info!(%id, existed, "Deleted note");

    if ctx.json {
        println!("{}", json!({ "id": id, "deleted": existed }));
    } else if existed {
        println!("Deleted note {id}");
    } else {
        println!("Note {id} did not exist");
    }
    Ok(())
}

fn parse_offset(value: &str) -> Result<f64> {
    parse_px(value).ok_or_else(|| BoardError::InvalidPosition(value.to_string()))
}

fn print_updated(ctx: &CommandContext, note: &NoteRecord) -> Result<()> {
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(note)?);
    } else {
        println!("Updated note {}", note.id);
    }
    Ok(())
}

fn summary_line(note: &NoteRecord) -> String {
    let first_line = note.text.lines().next().unwrap_or("");
    format!(
        "{:>4}  {:<8}  {:<16}  {}",
        note.id,
        note.color,
        position_label(note),
        first_line
    )
}

fn position_label(note: &NoteRecord) -> String {
    match (&note.x, &note.y) {
        (Some(x), Some(y)) => format!("({x}, {y})"),
        _ => "-".to_string(),
    }
}
