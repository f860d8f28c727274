//! peridyn CLI: run, validate and inspect peridynamic jobs.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod job_file;

#[derive(Parser)]
#[command(name = "peridyn")]
#[command(version, about = "peridyn: explicit peridynamic fracture simulation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a job file.
    Run {
        /// Path to the job description (JSON).
        job: PathBuf,

        /// Run on this many threads, one chunk each.
        #[arg(long, conflicts_with = "ranks")]
        threads: Option<usize>,

        /// Run on this many message-passing ranks, one chunk each.
        #[arg(long)]
        ranks: Option<usize>,

        /// Directory for snapshot files.
        #[arg(short, long, default_value = "output")]
        out: PathBuf,

        /// Suppress progress logging.
        #[arg(short, long)]
        quiet: bool,
    },

    /// Print a summary of a snapshot file.
    Inspect {
        /// Path to the snapshot file.
        path: PathBuf,
    },

    /// Check a job file without running it.
    Validate {
        /// Path to the job description (JSON).
        path: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            job,
            threads,
            ranks,
            out,
            quiet,
        } => commands::run(&job, commands::RunOptions { threads, ranks, out, quiet }),
        Commands::Inspect { path } => commands::inspect(&path),
        Commands::Validate { path } => commands::validate(&path),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
