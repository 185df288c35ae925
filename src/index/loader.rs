//! Lookup table loading from the joined TSV file.

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use thiserror::Error;
use tracing::info;

use super::StreetIndex;
use crate::models::SideCode;

/// Header of the joined file, in output order
pub const COLUMNS: [&str; 7] = [
    "StreetName",
    "StreetType",
    "SideCode",
    "HouseNumLo",
    "HouseNumHi",
    "District",
    "Neighborhood",
];

/// One row of the joined TSV file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SourceRow {
    pub street_name: String,
    pub street_type: String,
    pub side_code: SideCode,
    pub house_num_lo: u32,
    pub house_num_hi: u32,
    pub district: String,
    pub neighborhood: String,
}

#[derive(Debug, Error)]
pub enum DataRowError {
    #[error("failed to read header: {0}")]
    Header(#[source] csv::Error),
    #[error("header is missing column {0:?}")]
    MissingColumn(&'static str),
    #[error("malformed row at line {line}: {source}")]
    Malformed {
        line: u64,
        #[source]
        source: csv::Error,
    },
}

/// Read and validate every row. The first malformed row fails the whole read.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<SourceRow>, DataRowError> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(b'\t')
        .from_reader(reader);

    let headers = csv_reader.headers().map_err(DataRowError::Header)?.clone();
    for column in COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(DataRowError::MissingColumn(column));
        }
    }

    let mut rows = Vec::new();
    for (i, result) in csv_reader.deserialize::<SourceRow>().enumerate() {
        let row = result.map_err(|source| DataRowError::Malformed {
            line: source
                .position()
                .map(|p| p.line())
                .unwrap_or(i as u64 + 2),
            source,
        })?;
        rows.push(row);
    }
    Ok(rows)
}

/// Load the index from a TSV file, gunzipping when the name ends in `.gz`.
pub fn load_index(path: &Path) -> Result<StreetIndex> {
    info!("Loading street ranges from {}", path.display());

    let file = File::open(path)
        .with_context(|| format!("Failed to open data file: {}", path.display()))?;
    let reader: Box<dyn Read> = if path.extension().map_or(false, |e| e == "gz") {
        Box::new(GzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    let rows = read_rows(reader)
        .with_context(|| format!("Failed to parse data file: {}", path.display()))?;

    info!("Loaded {} rows", rows.len());
    Ok(StreetIndex::build(rows))
}
