mod cli;
mod commands;
mod config;
mod data_sources;
mod engine;
mod progress;
mod provider;
mod resources;
mod state;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    /// Provider settings file, if given
    pub config: Option<PathBuf>,
    /// Resource declarations file
    pub file: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config: cli.config,
        file: cli.file,
    };

    match cli.command {
        Command::Schema(args) => commands::schema::run(&ctx, args),
        Command::Validate => commands::declarative::validate(&ctx),
        Command::Plan(args) => commands::declarative::plan(&ctx, args),
        Command::Apply(args) => commands::declarative::apply(&ctx, args),
        Command::Refresh => commands::declarative::refresh(&ctx),
        Command::Import {
            type_name,
            address,
            id,
        } => commands::declarative::import(&ctx, &type_name, &address, &id),
        Command::Read(args) => commands::declarative::read(&ctx, args),
        Command::State(cmd) => commands::state::run(&ctx, cmd),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "panos-provider", &mut io::stdout());
            Ok(())
        }
    }
}
