//! umldoc CLI - PlantUML diagrams from documentation comments.
//!
//! Provides commands for:
//! - `build`: Write diagram sources and render images for every `@startuml` block
//! - `list`: Show which diagrams a build would produce

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{BuildArgs, ListArgs};
use output::Output;

/// umldoc - PlantUML diagrams from documentation comments.
#[derive(Parser)]
#[command(name = "umldoc", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write diagram sources and images.
    Build(BuildArgs),
    /// List diagrams without writing anything.
    List(ListArgs),
}

impl Commands {
    fn verbose(&self) -> bool {
        match self {
            Self::Build(args) => args.selection.verbose,
            Self::List(args) => args.selection.verbose,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.command.verbose() {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Build(args) => args.execute(),
        Commands::List(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&err);
        std::process::exit(1);
    }
}
