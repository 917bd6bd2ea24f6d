mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{catalog, check, stats, CatalogArgs, CheckArgs, StatsArgs};

/// Folio CLI - inspect and repair album documents
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report structure issues and stale layouts
    Check(CheckArgs),

    /// Print counts, version marker and fingerprint of an album
    Stats(StatsArgs),

    /// Summarize a layout catalog
    Catalog(CatalogArgs),
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;

    match cli.command {
        Command::Check(args) => check(args, &cwd),
        Command::Stats(args) => stats(args, &cwd),
        Command::Catalog(args) => catalog(args),
    }
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
