//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use surpi::{OutputFormat, SampleSheetFormat};

/// Surpi: extract SURPI count tables into feature and taxonomy tables
#[derive(Parser)]
#[command(name = "surpi")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Join a count table with a sample sheet and write feature and taxonomy tables
    Extract {
        /// Path to the SURPI count table (TSV)
        #[arg(value_name = "COUNTS")]
        counts: PathBuf,

        /// Path to the sample sheet
        #[arg(value_name = "SAMPLE_SHEET")]
        sample_sheet: PathBuf,

        /// Output directory (default: current directory)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Sample sheet layout (sectioned, flat)
        #[arg(long, default_value = "sectioned")]
        sheet_format: SampleSheetFormat,

        /// Output format (tsv, csv, json)
        #[arg(short, long, default_value = "tsv")]
        format: OutputFormat,

        /// Sum counts of taxa that map to the same feature id instead of failing
        #[arg(long)]
        merge_duplicates: bool,

        /// Also write extraction-report.json
        #[arg(long)]
        report: bool,
    },

    /// Check the structure of a count table
    ValidateCounts {
        /// Path to the count table
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Report every defect instead of stopping at the first
        #[arg(long)]
        all: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check the structure of a sample sheet
    ValidateSheet {
        /// Path to the sample sheet
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Sample sheet layout (sectioned, flat)
        #[arg(long, default_value = "sectioned")]
        sheet_format: SampleSheetFormat,

        /// Report every defect instead of stopping at the first
        #[arg(long)]
        all: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_extract_defaults() {
        let cli = Cli::parse_from(["surpi", "extract", "counts.tsv", "SampleSheet.csv"]);
        match cli.command {
            Commands::Extract {
                sheet_format,
                format,
                output,
                merge_duplicates,
                report,
                ..
            } => {
                assert_eq!(sheet_format, SampleSheetFormat::Sectioned);
                assert_eq!(format, OutputFormat::Tsv);
                assert!(output.is_none());
                assert!(!merge_duplicates);
                assert!(!report);
            }
            _ => panic!("expected extract"),
        }
    }

    #[test]
    fn test_validate_sheet_flags() {
        let cli = Cli::parse_from([
            "surpi",
            "-v",
            "validate-sheet",
            "samples.tsv",
            "--sheet-format",
            "flat",
            "--all",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Commands::ValidateSheet {
                sheet_format, all, ..
            } => {
                assert_eq!(sheet_format, SampleSheetFormat::Flat);
                assert!(all);
            }
            _ => panic!("expected validate-sheet"),
        }
    }
}
