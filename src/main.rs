mod api;
mod cli;
mod cli_help;
mod commands;
mod contrib;
mod filescore;
mod git;
mod identity;
mod model;
mod patch;
mod pipeline;
mod policy;
mod ranking;
mod report_helpers;
mod similarity;
mod sources;
mod store;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;

/// Log to stderr, filtered by `RUST_LOG` (default: warnings only).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(err) = commands::dispatch(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
