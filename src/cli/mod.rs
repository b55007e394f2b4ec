// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// clap and delegates every command to Layer 2 (application).
// Reports are printed as pretty JSON on stdout; progress goes
// through tracing.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use serde::Serialize;

use commands::{BatchesArgs, Commands, PrepareArgs, StreamArgs};

#[derive(Parser, Debug)]
#[command(
    name = "classify-corpus",
    version = "0.1.0",
    about = "Encode a text-classification corpus and iterate it in batches."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route the subcommand to its use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Prepare(args) => run_prepare(args),
            Commands::Batches(args) => run_batches(args),
            Commands::Stream(args) => run_stream(args),
        }
    }
}

fn print_json<T: Serialize>(report: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

fn run_prepare(args: PrepareArgs) -> Result<()> {
    use crate::application::prepare_use_case::PrepareUseCase;

    let config = args.corpus.resolve()?;
    tracing::info!("Preparing corpus in: {}", config.data_dir.display());

    let summary = PrepareUseCase::new(config).execute()?;
    print_json(&summary)
}

fn run_batches(args: BatchesArgs) -> Result<()> {
    use crate::application::inspect_use_case::BatchesUseCase;

    let report = BatchesUseCase::new(args.into_config()?).execute()?;
    print_json(&report)
}

fn run_stream(args: StreamArgs) -> Result<()> {
    use crate::application::inspect_use_case::StreamUseCase;

    let report = StreamUseCase::new(args.into_config()?).execute()?;
    print_json(&report)
}
