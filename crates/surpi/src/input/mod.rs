//! Input parsing and data source handling.

mod parser;
mod source;

pub use parser::{Parser, ParserConfig, RawSource};
pub use source::{DataTable, SourceMetadata};
