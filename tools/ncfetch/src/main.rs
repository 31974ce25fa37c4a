mod commands;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use commands::{dump::DumpArgs, materialize::MaterializeArgs, schema::SchemaArgs};
use log::LevelFilter;

#[derive(Parser)]
#[command(name = "ncfetch", about = "Read and copy ncstream datasets")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG
    /// overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy a remote dataset into a local file
    Materialize(MaterializeArgs),
    /// Print the schema of a remote dataset or local copy
    Schema(SchemaArgs),
    /// Print the values of one variable
    Dump(DumpArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match cli.command {
        Commands::Materialize(args) => args.run(),
        Commands::Schema(args) => args.run(),
        Commands::Dump(args) => args.run(),
    }
}
