//! Extract command - join a count table with a sample sheet.

use std::path::PathBuf;

use colored::Colorize;
use surpi::{
    DuplicateFeaturePolicy, ExtractConfig, OutputFormat, SampleSheetFormat, Surpi, SurpiConfig,
};

pub struct ExtractArgs {
    pub counts: PathBuf,
    pub sample_sheet: PathBuf,
    pub output: Option<PathBuf>,
    pub sheet_format: SampleSheetFormat,
    pub format: OutputFormat,
    pub merge_duplicates: bool,
    pub report: bool,
    pub verbose: bool,
}

pub fn run(args: ExtractArgs) -> Result<(), Box<dyn std::error::Error>> {
    for path in [&args.counts, &args.sample_sheet] {
        if !path.exists() {
            return Err(format!("File not found: {}", path.display()).into());
        }
    }

    println!(
        "{} {} with {}",
        "Extracting".cyan().bold(),
        args.counts.display().to_string().white(),
        args.sample_sheet.display().to_string().white()
    );

    let config = SurpiConfig {
        sheet_format: args.sheet_format,
        extract: ExtractConfig {
            duplicate_features: if args.merge_duplicates {
                DuplicateFeaturePolicy::Merge
            } else {
                DuplicateFeaturePolicy::Reject
            },
        },
        ..SurpiConfig::default()
    };

    let result = Surpi::with_config(config).extract(&args.counts, &args.sample_sheet)?;

    println!(
        "Linked {} samples to {} features",
        result.feature_table.sample_count().to_string().white().bold(),
        result.feature_table.feature_count().to_string().white().bold()
    );
    if result.report.unused_sheet_rows > 0 {
        println!(
            "{} {} sample sheet rows have no barcode in the count table",
            "Note:".yellow().bold(),
            result.report.unused_sheet_rows
        );
    }

    if args.verbose {
        println!();
        println!("{}", "Samples:".yellow().bold());
        for sample_id in &result.feature_table.sample_ids {
            println!("  {}", sample_id);
        }
        println!();
        println!(
            "Count table: {} ({})",
            result.report.count_table.file, result.report.count_table.hash
        );
        println!(
            "Sample sheet: {} ({}, {})",
            result.report.sample_sheet.file,
            result.report.sample_sheet.format,
            result.report.sample_sheet.hash
        );
    }

    let dir = args.output.unwrap_or_else(|| PathBuf::from("."));
    let saved = result.save(&dir, args.format, args.report)?;

    println!();
    println!(
        "{} {}",
        "Saved feature table to".green().bold(),
        saved.feature_table.display().to_string().white()
    );
    println!(
        "{} {}",
        "Saved taxonomy to".green().bold(),
        saved.taxonomy.display().to_string().white()
    );
    if let Some(report) = saved.report {
        println!(
            "{} {}",
            "Saved report to".green().bold(),
            report.display().to_string().white()
        );
    }

    Ok(())
}
