//! Perimeter Fuzz Runner CLI
//!
//! Usage:
//!   perimeter-fuzz run [--cases N] [--seed S] [--output text|json]
//!   perimeter-fuzz list

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use perimeter_fuzz::runner::{FuzzConfig, FuzzRunner};
use perimeter_fuzz::targets::{run_all, TARGETS};
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Output {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run every fuzz target
    Run {
        /// Cases per target
        #[arg(long, default_value_t = 10_000)]
        cases: u64,

        /// Random seed (0 = random)
        #[arg(long, default_value_t = 0)]
        seed: u64,

        #[arg(long, value_enum, default_value_t = Output::Text)]
        output: Output,
    },
    /// List available fuzz targets
    List,
}

#[derive(Parser, Debug)]
#[command(name = "perimeter-fuzz", about = "Property-based fuzzing of the perimeter risk model")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::List => {
            for (name, description) in TARGETS {
                println!("{:<28} {}", name, description);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Run { cases, seed, output } => {
            info!("Running {} targets with {} cases each", TARGETS.len(), cases);
            let mut runner = FuzzRunner::new(FuzzConfig::new().cases(cases).seed(seed));
            run_all(&mut runner);

            match output {
                Output::Text => {
                    println!("{}", "=".repeat(60));
                    for result in runner.results() {
                        println!("{}", result.summary_line());
                        for failure in &result.failures {
                            println!("    {}", failure.message);
                            if let Some(input) = &failure.input {
                                println!("      input: {}", input);
                            }
                        }
                    }
                    println!("{}", "=".repeat(60));
                }
                Output::Json => println!("{}", runner.export_json()?),
            }

            let total: u64 = runner.results().iter().map(|r| r.cases_run).sum();
            info!("{} cases run", total);

            Ok(if runner.all_passed() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}
