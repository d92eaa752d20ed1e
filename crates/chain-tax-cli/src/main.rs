mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::compare::CompareArgs;
use commands::seed::SeedArgs;
use commands::sensitivity::SensitivityArgs;
use commands::simulate::SimulateArgs;

/// Trade-chain tax and profit simulation
#[derive(Parser)]
#[command(
    name = "ctax",
    version,
    about = "Trade-chain tax and profit simulation",
    long_about = "Simulates VAT, surcharges, income tax, regional refunds, financing cost \
                  and profit for every company in a manufacturer -> funder -> platform -> \
                  intermediary -> retailer chain, with decimal precision. Supports \
                  structure comparison and parameter sweeps."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG wins when set
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate one chain configuration
    Simulate(SimulateArgs),
    /// Emit a run document seeded from catalog defaults
    Seed(SeedArgs),
    /// Compare alternative chain structures against a base configuration
    Compare(CompareArgs),
    /// Sweep one or two parameters and record a metric
    Sensitivity(SensitivityArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Simulate(args) => commands::simulate::run_simulate(args),
        Commands::Seed(args) => commands::seed::run_seed(args),
        Commands::Compare(args) => commands::compare::run_compare(args),
        Commands::Sensitivity(args) => commands::sensitivity::run_sweep(args),
        Commands::Version => {
            println!("ctax {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
