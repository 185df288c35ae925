//! Offline join that produces the neighborhood data file.
//!
//! Takes the Department of Elections "Street Data Extract" and a precinct
//! table mapping precinct id to district and neighborhood.
//!
//! ```text
//! join elections-data.txt precincts.tsv -o data/neighborhood_data.tsv
//! ```

mod precincts;

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::precincts::{join_streets, load_precincts, write_rows};

#[derive(Parser, Debug)]
#[command(name = "join")]
#[command(about = "Join the elections street extract with precinct neighborhoods")]
struct Args {
    /// Street data extract (TSV)
    extract: PathBuf,

    /// Precinct table with PrecinctID, District and Neighborhood columns (TSV)
    precincts: PathBuf,

    /// Output file; stdout when omitted. A .gz suffix compresses it.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout can carry the data
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("Precincts: {}", args.precincts.display());
    let precincts = load_precincts(open(&args.precincts)?)?;

    info!("Extract: {}", args.extract.display());
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template(
        "{spinner:.green} [{elapsed_precise}] {pos} rows ({per_sec})",
    )?);
    let rows = join_streets(open(&args.extract)?, &precincts, &pb)?;
    pb.finish_and_clear();

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let writer: Box<dyn Write> = if is_gz(path) {
                Box::new(GzEncoder::new(BufWriter::new(file), Compression::default()))
            } else {
                Box::new(BufWriter::new(file))
            };
            write_rows(&rows, writer)?;
            info!("Wrote {} rows to {}", rows.len(), path.display());
        }
        None => write_rows(&rows, io::stdout().lock())?,
    }

    Ok(())
}

fn is_gz(path: &Path) -> bool {
    path.extension().map_or(false, |e| e == "gz")
}

fn open(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(if is_gz(path) {
        Box::new(GzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    })
}
