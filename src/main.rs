use clap::Parser;
use stickyboard::cli::{self, Cli};
use stickyboard::logging::init_logging;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.quiet, cli.log_file.as_deref()) {
        eprintln!("Warning: failed to initialize logging: {e}");
    }

    if let Err(err) = cli::run(cli).await {
        eprintln!("Error: {err}");
        std::process::exit(err.exit_code());
    }
}
