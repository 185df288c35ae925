//! Street range index: street name and type to house number ranges.
//!
//! Loaded once from the joined TSV file and queried read-only afterwards.

mod loader;
mod street;

pub use loader::{load_index, read_rows, DataRowError, SourceRow, COLUMNS};
pub use street::{Candidates, IndexStats, MatchTier, StreetIndex};
