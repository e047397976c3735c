//! Validate commands - check count tables and sample sheets without extracting.

use std::path::{Path, PathBuf};

use colored::Colorize;
use surpi::formats::{count_table, sample_sheet};
use surpi::{FormatDefect, SampleSheetFormat, SurpiError, ValidationMode};

fn mode(all: bool) -> ValidationMode {
    if all {
        ValidationMode::CollectAll
    } else {
        ValidationMode::FailFast
    }
}

pub fn run_counts(
    file: PathBuf,
    all: bool,
    json_output: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let outcome = count_table::load(&file, mode(all)).map(|(table, _)| {
        format!(
            "{} taxa, {} barcodes",
            table.row_count(),
            count_table::barcodes(&table).len()
        )
    });
    report(&file, outcome, json_output, verbose)
}

pub fn run_sheet(
    file: PathBuf,
    format: SampleSheetFormat,
    all: bool,
    json_output: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let outcome = sample_sheet::parse_file(&file, format, mode(all))
        .map(|(sheet, _)| format!("{} samples ({} layout)", sheet.len(), format));
    report(&file, outcome, json_output, verbose)
}

/// Print the outcome of a validation. Structural defects are reported and
/// turned into a failure; any other error propagates unchanged.
fn report(
    file: &Path,
    outcome: surpi::Result<String>,
    json_output: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (summary, defects, context) = match outcome {
        Ok(summary) => (Some(summary), Vec::new(), None),
        Err(SurpiError::Format { context, defects }) => (None, defects, Some(context)),
        Err(e) => return Err(e.into()),
    };

    if json_output {
        let status = serde_json::json!({
            "file": file.display().to_string(),
            "valid": defects.is_empty(),
            "defects": defects,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else if let Some(summary) = summary {
        println!(
            "{} {}",
            "Valid".green().bold(),
            file.display().to_string().white()
        );
        if verbose {
            println!("  {}", summary);
        }
    } else {
        println!(
            "{} {}",
            "Invalid".red().bold(),
            file.display().to_string().white()
        );
        for defect in &defects {
            print_defect(defect);
        }
    }

    match context {
        Some(context) => Err(format!("Invalid {} ({} defects)", context, defects.len()).into()),
        None => Ok(()),
    }
}

fn print_defect(defect: &FormatDefect) {
    println!(
        "  {} {}",
        format!("[{}]", defect.kind.label()).red(),
        defect
    );
}
