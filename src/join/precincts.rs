//! Join of the elections street extract with the precinct table.

use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use hashbrown::HashMap;
use indicatif::ProgressBar;
use std::io::{Read, Write};
use tracing::{info, warn};

use sfhood::index::SourceRow;
use sfhood::SideCode;

/// Street names starting with this are placeholder records in the extract
const EXCLUDED_PREFIX: char = '@';

/// District and neighborhood for each precinct
#[derive(Debug, Default)]
pub struct PrecinctTable {
    by_id: HashMap<String, (String, String)>,
}

impl PrecinctTable {
    pub fn get(&self, precinct_id: &str) -> Option<&(String, String)> {
        self.by_id.get(precinct_id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }
}

fn column(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .with_context(|| format!("Column '{}' not found", name))
}

fn tsv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(reader)
}

/// Load the precinct table. Precinct ids must be unique.
pub fn load_precincts<R: Read>(reader: R) -> Result<PrecinctTable> {
    let mut csv_reader = tsv_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let id_idx = column(&headers, "PrecinctID")?;
    let district_idx = column(&headers, "District")?;
    let neighborhood_idx = column(&headers, "Neighborhood")?;

    let mut table = PrecinctTable::default();
    for result in csv_reader.records() {
        let record = result?;
        let field = |i: usize| record.get(i).unwrap_or("").trim().to_string();
        let id = field(id_idx);
        if table
            .by_id
            .insert(id.clone(), (field(district_idx), field(neighborhood_idx)))
            .is_some()
        {
            bail!("Precinct id {} is not unique", id);
        }
    }

    info!("Loaded {} precincts", table.len());
    Ok(table)
}

/// Inner-join extract rows with the precinct table, normalize case, drop
/// placeholder streets and sort by every output column.
pub fn join_streets<R: Read>(
    extract: R,
    precincts: &PrecinctTable,
    progress: &ProgressBar,
) -> Result<Vec<SourceRow>> {
    let mut csv_reader = tsv_reader(extract);
    let headers = csv_reader.headers()?.clone();
    let id_idx = column(&headers, "PrecinctID")?;
    let name_idx = column(&headers, "StreetName")?;
    let type_idx = column(&headers, "StreetType")?;
    let side_idx = column(&headers, "SideCode")?;
    let lo_idx = column(&headers, "HouseNumLo")?;
    let hi_idx = column(&headers, "HouseNumHi")?;

    let mut rows = Vec::new();
    let mut unmatched = 0usize;
    let mut excluded = 0usize;

    for result in csv_reader.records() {
        let record = result?;
        progress.inc(1);
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let field = |i: usize| record.get(i).unwrap_or("").trim();

        let Some((district, neighborhood)) = precincts.get(field(id_idx)) else {
            unmatched += 1;
            continue;
        };

        let street_name = field(name_idx);
        if street_name.starts_with(EXCLUDED_PREFIX) {
            excluded += 1;
            continue;
        }

        let side_code: SideCode = field(side_idx)
            .to_uppercase()
            .parse()
            .with_context(|| format!("Bad side code at line {}", line))?;
        let house_num_lo = field(lo_idx)
            .parse()
            .with_context(|| format!("Bad HouseNumLo at line {}", line))?;
        let house_num_hi = field(hi_idx)
            .parse()
            .with_context(|| format!("Bad HouseNumHi at line {}", line))?;

        rows.push(SourceRow {
            street_name: street_name.to_lowercase(),
            street_type: field(type_idx).to_lowercase(),
            side_code,
            house_num_lo,
            house_num_hi,
            district: district.clone(),
            neighborhood: neighborhood.clone(),
        });
    }

    if unmatched > 0 {
        warn!("{} extract rows had no matching precinct", unmatched);
    }
    info!(
        "Joined {} rows ({} placeholder streets dropped)",
        rows.len(),
        excluded
    );

    rows.sort_by(|a, b| {
        (
            &a.street_name,
            &a.street_type,
            a.side_code.as_str(),
            a.house_num_lo,
            a.house_num_hi,
            &a.district,
            &a.neighborhood,
        )
            .cmp(&(
                &b.street_name,
                &b.street_type,
                b.side_code.as_str(),
                b.house_num_lo,
                b.house_num_hi,
                &b.district,
                &b.neighborhood,
            ))
    });
    Ok(rows)
}

/// Write rows as the TSV the index loads
pub fn write_rows<W: Write>(rows: &[SourceRow], writer: W) -> Result<()> {
    let mut csv_writer = WriterBuilder::new().delimiter(b'\t').from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}
