//! Command-line neighborhood lookup.
//!
//! Prints one JSON result per address, in input order.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use rayon::prelude::*;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use sfhood::config::Config;
use sfhood::NeighborhoodService;

#[derive(Parser, Debug)]
#[command(name = "lookup")]
#[command(about = "Find the San Francisco district and neighborhood of street addresses")]
struct Args {
    /// Addresses to look up, e.g. "123 Main St"
    addresses: Vec<String>,

    /// File with one address per line ("-" for stdin)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Joined neighborhood data file (.tsv or .tsv.gz)
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Print matched (district, neighborhood) pairs instead of label lists
    #[arg(long)]
    pairs: bool,

    /// Disable the street-name prefix fallback
    #[arg(long)]
    no_prefix_fallback: bool,

    /// Log lookup details to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(data) = args.data {
        config.data.file = data;
    }
    if args.no_prefix_fallback {
        config.matching.prefix_fallback = false;
    }

    let mut addresses = args.addresses;
    if let Some(input) = &args.input {
        addresses.extend(read_addresses(input)?);
    }
    if addresses.is_empty() {
        anyhow::bail!("No addresses given");
    }

    let service = NeighborhoodService::from_config(&config).context("Failed to load index")?;
    info!("Looking up {} addresses", addresses.len());

    let lines: Vec<String> = addresses
        .par_iter()
        .map(|address| {
            if args.pairs {
                serde_json::to_string(&service.find_pairs(address))
            } else {
                serde_json::to_string(&service.find(address))
            }
        })
        .collect::<Result<_, _>>()?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in lines {
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

fn read_addresses(path: &Path) -> Result<Vec<String>> {
    let reader: Box<dyn BufRead> = if path.as_os_str() == "-" {
        Box::new(io::stdin().lock())
    } else {
        let file = File::open(path)
            .with_context(|| format!("Failed to open input file: {}", path.display()))?;
        Box::new(BufReader::new(file))
    };

    let mut addresses = Vec::new();
    for line in reader.lines() {
        addresses.push(line?);
    }
    Ok(addresses)
}
