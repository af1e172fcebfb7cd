mod generate;
mod validate;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "boxgen")]
#[command(version)]
#[command(
    about = "Generate deterministic synthetic e-commerce datasets",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a dataset (products, customers, sellers, orders, order items)
    Generate {
        /// Output directory for dataset files
        #[arg(short, long, default_value = "data")]
        output: PathBuf,

        /// Number of customers to generate
        #[arg(long)]
        customers: Option<usize>,

        /// Number of sellers to generate
        #[arg(long)]
        sellers: Option<usize>,

        /// Number of orders to generate
        #[arg(long)]
        orders: Option<usize>,

        /// Random seed for reproducibility. Output is identical for the
        /// same seed and worker count.
        #[arg(long)]
        seed: Option<u64>,

        /// Worker threads for order generation (default: one per core)
        #[arg(long)]
        workers: Option<usize>,

        /// Output format: csv or jsonl
        #[arg(short, long, default_value = "csv")]
        format: String,

        /// Compress output files with gzip
        #[arg(long)]
        gzip: bool,

        /// YAML generation profile (CLI flags take precedence)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Show progress during generation
        #[arg(short, long)]
        progress: bool,

        /// Output a machine-readable JSON summary instead of text
        #[arg(long)]
        json: bool,

        /// Generate and report without writing files
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate the integrity of a previously generated dataset
    Validate {
        /// Dataset directory containing the five table files
        dir: PathBuf,

        /// File format: csv or jsonl (auto-detected if not specified)
        #[arg(short, long)]
        format: Option<String>,

        /// Treat warnings as errors (non-zero exit on any warning)
        #[arg(long)]
        strict: bool,

        /// Output results as JSON instead of human-readable text
        #[arg(long)]
        json: bool,

        /// Maximum issues to report before truncating
        #[arg(long, default_value = "1000")]
        max_issues: usize,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate {
            output,
            customers,
            sellers,
            orders,
            seed,
            workers,
            format,
            gzip,
            config,
            progress,
            json,
            dry_run,
        } => generate::run(generate::GenerateArgs {
            output,
            customers,
            sellers,
            orders,
            seed,
            workers,
            format,
            gzip,
            config,
            progress,
            json,
            dry_run,
        }),
        Commands::Validate {
            dir,
            format,
            strict,
            json,
            max_issues,
        } => validate::run(dir, format, strict, json, max_issues),
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "boxgen", &mut io::stdout());
            Ok(())
        }
    }
}
