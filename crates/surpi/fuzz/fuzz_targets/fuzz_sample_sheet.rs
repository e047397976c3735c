//! Fuzz target for sample sheet parsing in both layouts.

#![no_main]

use libfuzzer_sys::fuzz_target;
use surpi::formats::sample_sheet;
use surpi::{SampleSheetFormat, ValidationMode};

fuzz_target!(|data: &str| {
    if data.len() > 100_000 {
        return;
    }

    let _ = sample_sheet::extract_data_section(data);
    for format in [SampleSheetFormat::Sectioned, SampleSheetFormat::Flat] {
        let _ = sample_sheet::parse_str(data, format, ValidationMode::CollectAll);
    }
});
