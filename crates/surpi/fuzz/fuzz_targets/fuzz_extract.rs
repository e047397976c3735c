//! Fuzz target for the count table and sample sheet join.
//!
//! Barcodes and sample names come from small alphabets so that collisions,
//! unmatched barcodes and duplicate sample names all occur often.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use surpi::{CountRecord, Extractor, SampleSheet};

#[derive(Debug, Arbitrary)]
struct Input {
    barcodes: Vec<u8>,
    sheet: Vec<(u8, u8)>,
    taxa: Vec<(u8, Option<u8>, Vec<u16>)>,
}

fuzz_target!(|input: Input| {
    if input.barcodes.len() > 64 || input.sheet.len() > 64 || input.taxa.len() > 64 {
        return;
    }

    let barcodes: Vec<String> = input.barcodes.iter().map(|b| format!("BC{}", b % 16)).collect();
    let records: Vec<CountRecord> = input
        .taxa
        .iter()
        .map(|(species, genus, counts)| CountRecord {
            species: format!("species {}", species % 8),
            genus: genus.map(|g| format!("genus {}", g % 4)),
            family: None,
            tag: String::new(),
            counts: (0..barcodes.len())
                .map(|i| counts.get(i).copied().unwrap_or(0) as u64)
                .collect(),
        })
        .collect();
    let sheet = SampleSheet::from_pairs(
        input
            .sheet
            .iter()
            .map(|(name, bc)| (format!("s{}", name % 32), format!("BC{}", bc % 16))),
    );

    if let Ok((table, taxonomy)) = Extractor::new().extract_records(&barcodes, &records, &sheet) {
        assert_eq!(table.sample_count(), barcodes.len());
        assert_eq!(table.feature_count(), taxonomy.len());
    }
});
