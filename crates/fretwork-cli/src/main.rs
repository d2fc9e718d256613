mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fretwork")]
#[command(about = "Tablature file inspector and converter", version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a tablature file and print a summary
    Info {
        /// File to inspect
        path: PathBuf,
    },
    /// Decode a tablature file and dump the score as JSON
    Json {
        /// File to decode
        path: PathBuf,
    },
    /// Convert a tablature file to the native format
    Convert {
        /// File to convert
        input: PathBuf,
        /// Destination file
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("fretwork=info".parse()?)
                .add_directive("fretwork_core=info".parse()?),
        )
        .init();

    let args = Args::parse();
    match args.command {
        Command::Info { path } => commands::info::run(&path),
        Command::Json { path } => commands::json::run(&path),
        Command::Convert { input, output } => commands::convert::run(&input, &output),
    }
}
