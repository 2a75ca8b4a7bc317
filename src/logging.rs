//! tracing setup for the `stickyboard` binary and tests.
//!
//! Human-readable events go to stderr so stdout stays clean for `--json`
//! output. `--log-file` adds a JSON copy of every event, appended across runs.

use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::{Mutex, Once};

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise [`default_filter`] picks directives
/// from `-v`/`-q`.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened, `RUST_LOG` is not a
/// valid filter, or a global subscriber is already installed.
pub fn init_logging(verbosity: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(&directives)
            .with_context(|| format!("invalid {}: {directives}", EnvFilter::DEFAULT_ENV))?,
        _ => EnvFilter::try_new(default_filter(verbosity, quiet))?,
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbosity >= 2)
        .with_file(verbosity >= 3)
        .with_line_number(verbosity >= 3)
        .with_ansi(std::io::stderr().is_terminal());

    let json_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .json()
                    .with_current_span(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(json_layer)
        .try_init()
        .context("a global tracing subscriber is already installed")
}

/// Filter directives for a verbosity level.
///
/// `-q` keeps only this crate's errors. Release builds are quieter than debug
/// builds at the default level.
#[must_use]
pub const fn default_filter(verbosity: u8, quiet: bool) -> &'static str {
    if quiet {
        return "stickyboard=error";
    }
    match verbosity {
        0 if cfg!(debug_assertions) => "stickyboard=info",
        0 => "stickyboard=warn",
        1 => "stickyboard=debug",
        2 => "stickyboard=debug,rusqlite=debug",
        _ => "stickyboard=trace,rusqlite=trace",
    }
}

/// Route crate events to the libtest capture buffer. Safe to call from every
/// test; only the first call installs anything.
pub fn init_test_logging() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter(1, false)));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}
