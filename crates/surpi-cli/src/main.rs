//! Surpi CLI - extract SURPI results into feature and taxonomy tables.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let result = match cli.command {
        Commands::Extract {
            counts,
            sample_sheet,
            output,
            sheet_format,
            format,
            merge_duplicates,
            report,
        } => commands::extract::run(commands::extract::ExtractArgs {
            counts,
            sample_sheet,
            output,
            sheet_format,
            format,
            merge_duplicates,
            report,
            verbose: cli.verbose,
        }),

        Commands::ValidateCounts { file, all, json } => {
            commands::validate::run_counts(file, all, json, cli.verbose)
        }

        Commands::ValidateSheet {
            file,
            sheet_format,
            all,
            json,
        } => commands::validate::run_sheet(file, sheet_format, all, json, cli.verbose),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
