/// CLI argument definitions for the `rv` command.
///
/// Defines all subcommands, their arguments, and long help text
/// using the `clap` derive macros.
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::cli_help;

/// Top-level CLI parser with a single subcommand selector.
#[derive(Parser)]
#[command(name = "rv", version, about = "Reviewer suggestions from code ownership")]
pub struct Cli {
    /// Policy file (default: revisor.toml in the current directory, if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Locations of the persisted state shared by most commands.
#[derive(Args)]
pub struct StoreArgs {
    /// Identity map file (alias → account)
    #[arg(long, default_value = "authors.json")]
    pub authors: PathBuf,

    /// File ownership score table
    #[arg(long, default_value = "scores.json")]
    pub scores: PathBuf,

    /// Aggregated participation statistics
    #[arg(long, default_value = "stats.json")]
    pub stats: PathBuf,
}

/// All available subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Fold new revisions and bug data into the stores
    #[command(long_about = cli_help::UPDATE)]
    Update {
        #[command(flatten)]
        store: StoreArgs,

        /// Revision log snapshot (JSON)
        #[arg(long)]
        revisions: PathBuf,

        /// Bug tracker snapshot (JSON)
        #[arg(long)]
        bugs: PathBuf,

        /// Reference date for identity expiry, YYYY-MM-DD (default: today)
        #[arg(long)]
        today: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Suggest reviewers for a patch
    #[command(long_about = cli_help::REVIEWERS)]
    Reviewers {
        #[command(flatten)]
        store: StoreArgs,

        /// Patch file in git diff format, or - for stdin
        patch: PathBuf,

        /// Patch author identifier
        #[arg(long)]
        author: String,

        /// Author identifier kind: hg (version-control author) or bz (account)
        #[arg(long, default_value = "hg", value_parser = ["hg", "bz"])]
        author_kind: String,

        /// Skip line attribution, rank by file ownership only
        #[arg(long)]
        no_blame: bool,

        /// Repository to blame against (default: current directory)
        #[arg(long)]
        repo: Option<PathBuf>,

        /// Number of reviewers to show (default: from policy, 5)
        #[arg(long)]
        count: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the main contributors to a set of files
    Top {
        #[command(flatten)]
        store: StoreArgs,

        /// Files, relative to the repository root
        #[arg(required = true)]
        files: Vec<String>,

        /// Number of contributors to show (default: from policy, 5)
        #[arg(long)]
        count: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Look up the account of version-control authors
    Resolve {
        #[command(flatten)]
        store: StoreArgs,

        /// Author strings (default: the whole map)
        names: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Score how alike two identifiers are
    #[command(long_about = cli_help::SIMILARITY)]
    Similarity {
        a: String,
        b: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
