//! Fuzz target for the delimited parser and count table reader.
//!
//! This fuzzer tests that parsing and record conversion:
//! 1. Never panic on malformed input
//! 2. Report bad counts as errors

#![no_main]

use libfuzzer_sys::fuzz_target;
use surpi::formats::count_table;
use surpi::{Parser, ParserConfig, ValidationMode};

fuzz_target!(|data: &[u8]| {
    // Only process reasonable-sized inputs to avoid OOM
    if data.len() > 100_000 {
        return;
    }

    for config in [ParserConfig::tsv(), ParserConfig::csv()] {
        if let Ok(table) = Parser::with_config(config).parse_bytes(data) {
            if count_table::validate(&table, ValidationMode::CollectAll).is_ok() {
                let _ = count_table::records(&table);
            }
        }
    }
});
