mod args;
mod config;
mod entity;
mod script;
mod session;

use std::process::ExitCode;

use clap::Parser;

use args::EditorArgs;
use config::{EditorError, EditorResult};
use session::Session;

fn main() -> ExitCode {
    let args = EditorArgs::parse();

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_filter()))
        .init();

    hammer_core::init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &EditorArgs) -> EditorResult {
    let mut config = config::load_or_default(&args.config);
    if let Some(undo_levels) = args.undo_levels {
        config.history.undo_levels = undo_levels;
    }

    let source = std::fs::read_to_string(&args.script).map_err(|source| EditorError::Io {
        path: args.script.clone(),
        source,
    })?;
    let commands = script::parse_script(&source)?;
    log::info!(
        "Running {} ({} commands)",
        args.script.display(),
        commands.len()
    );

    let mut session = Session::new(config.history);
    let result = session.run(&commands);
    for line in session.take_output() {
        println!("{line}");
    }
    result
}
