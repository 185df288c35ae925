//! Query server for neighborhood lookups.
//!
//! Loads the street index once at startup and answers address lookups over
//! HTTP. Unparseable and unmatched addresses get an empty result, not an error.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use sfhood::config::Config;
use sfhood::index::IndexStats;
use sfhood::{Assignment, FindResponse, NeighborhoodService};

#[derive(Parser, Debug)]
#[command(name = "query")]
#[command(about = "San Francisco neighborhood lookup server")]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Joined neighborhood data file (.tsv or .tsv.gz)
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Listen address (defaults to 0.0.0.0:$PORT)
    #[arg(short, long)]
    listen: Option<String>,

    /// Disable the street-name prefix fallback
    #[arg(long)]
    no_prefix_fallback: bool,
}

/// Application state shared across handlers
struct AppState {
    service: NeighborhoodService,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(data) = args.data {
        config.data.file = data;
    }
    if let Some(listen) = args.listen {
        config.server.listen = Some(listen);
    }
    if args.no_prefix_fallback {
        config.matching.prefix_fallback = false;
    }

    info!("sfhood Query Server");

    // A missing or malformed data file is fatal here, never per request
    let service = NeighborhoodService::from_config(&config).context("Failed to load index")?;
    let state = Arc::new(AppState { service });

    // Build router
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/sf", get(find_handler))
        .route("/sf/pairs", get(pairs_handler))
        .route("/sf/district", get(district_handler))
        .route("/sf/neighborhood", get(neighborhood_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listen = config.listen_addr();
    info!("Starting server on {}", listen);

    let listener = tokio::net::TcpListener::bind(&listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Deserialize)]
struct AddressQueryParams {
    /// Free-text street address; missing is the same as empty
    #[serde(default)]
    address: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    index: IndexStats,
}

/// Health check endpoint
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let stats = state.service.index().stats();
    Json(HealthResponse {
        status: if stats.ranges > 0 { "ok" } else { "empty" },
        index: stats,
    })
}

/// Districts and neighborhoods for an address
async fn find_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AddressQueryParams>,
) -> Json<FindResponse> {
    Json(state.service.find(&params.address))
}

/// Paired (district, neighborhood) matches
async fn pairs_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AddressQueryParams>,
) -> Json<Vec<Assignment>> {
    Json(state.service.find_pairs(&params.address))
}

async fn district_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AddressQueryParams>,
) -> String {
    state.service.find_district(&params.address)
}

async fn neighborhood_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AddressQueryParams>,
) -> String {
    state.service.find_neighborhood(&params.address)
}
