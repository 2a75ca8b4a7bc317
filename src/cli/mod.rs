//! Command-line interface using clap.

pub mod commands;

use crate::config::{self, BoardConfig, CliOverrides};
use crate::error::Result;
use crate::storage::NoteStore;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Sticky-notes board backed by a local note store.
#[derive(Parser, Debug)]
#[command(name = "stickyboard", version, about)]
pub struct Cli {
    /// Database path (defaults to .stickyboard/notes.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Emit JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Also write JSON logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// How long to wait on a locked database, in milliseconds
    #[arg(long, global = true)]
    pub busy_timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List every note
    List,
    /// Show one note
    Show { id: i64 },
    /// Create a note
    Add(AddArgs),
    /// Replace a note's text
    Edit { id: i64, text: String },
    /// Move a note (pixel offsets such as `120` or `120px`)
    Move {
        id: i64,
        #[arg(allow_hyphen_values = true)]
        x: String,
        #[arg(allow_hyphen_values = true)]
        y: String,
    },
    /// Delete a note (no-op if it does not exist)
    Delete { id: i64 },
    /// Drive the board with a JSON-lines script of UI events
    Replay(ReplayArgs),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Header color (overrides the configured default-color)
    #[arg(long)]
    pub color: Option<String>,

    /// Initial text
    #[arg(long, default_value = "")]
    pub text: String,
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Script file, one JSON event per line
    pub script: PathBuf,

    /// Color for `add` events that do not name one
    #[arg(long)]
    pub color: Option<String>,
}

/// Resolved settings shared by every command.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub config: BoardConfig,
    pub json: bool,
}

impl CommandContext {
    /// Build the board store and open it.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be created or opened.
    pub async fn open_store(&self) -> Result<NoteStore> {
        let store = config::board_store(&self.config)?;
        store.open().await?;
        Ok(store)
    }
}

/// Resolve configuration and run the selected command.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the command fails.
pub async fn run(cli: Cli) -> Result<()> {
    let board_dir = config::board_dir(Some(Path::new(".")))?;
    let db = match cli.db {
        Some(path) if path.is_relative() => Some(env::current_dir()?.join(path)),
        other => other,
    };
    let color = match &cli.command {
        Commands::Add(args) => args.color.clone(),
        Commands::Replay(args) => args.color.clone(),
        _ => None,
    };
    let overrides = CliOverrides {
        db,
        color,
        busy_timeout_ms: cli.busy_timeout_ms,
    };
    let config = config::load_config(&board_dir, &overrides)?;
    debug!(db = %config.db_path.display(), "Resolved board config");

    let ctx = CommandContext {
        config,
        json: cli.json,
    };

    match cli.command {
        Commands::List => commands::notes::list(&ctx).await,
        Commands::Show { id } => commands::notes::show(&ctx, id).await,
        Commands::Add(args) => commands::notes::add(&ctx, &args.text).await,
        Commands::Edit { id, text } => commands::notes::edit(&ctx, id, &text).await,
        Commands::Move { id, x, y } => commands::notes::move_note(&ctx, id, &x, &y).await,
        Commands::Delete { id } => commands::notes::delete(&ctx, id).await,
        Commands::Replay(args) => commands::replay::execute(&ctx, &args).await,
    }
}
