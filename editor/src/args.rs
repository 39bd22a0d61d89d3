//! Command line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Hammer editor session arguments.
#[derive(Parser, Debug)]
#[command(
    name = "hammer-editor",
    about = "Replays a map edit script against an undoable document",
    long_about = "Runs the commands of an edit script (create, set, move, delete, group, \
                  select, undo, redo, print) against an in-memory map, recording every \
                  edit in the undo history.\n\n\
                  Lines starting with '#' are comments."
)]
pub struct EditorArgs {
    /// Edit script to run.
    pub script: PathBuf,

    /// Editor configuration file.
    #[arg(long, short, default_value = "hammer.toml")]
    pub config: PathBuf,

    /// Override the configured number of undo levels.
    #[arg(long)]
    pub undo_levels: Option<usize>,

    /// Log history bookkeeping (track open/close, eviction).
    #[arg(long, short)]
    pub verbose: bool,
}

impl EditorArgs {
    /// Default log filter when `RUST_LOG` is not set.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}
