//! Adds sea temperature and salinity to every occurrence in a CSV file.
//!
//! Credentials are read from `COPERNICUS_USER` and `COPERNICUS_PASS` (a `.env` file is
//! honoured). The run stops before reading any row if they are missing.

use biomarine::{
    check_output_columns, enriched_table, init_logging, read_csv, require_columns,
    service_url_from_env, write_csv, BiomarineError, Enricher, IncompletePolicy, NamedLookup,
    OceanClient, OceanCredentials, OceanVariableLookup, DEFAULT_CONCURRENCY_LIMIT,
    DEFAULT_DATASET, DEFAULT_MAX_DEPTH, DEFAULT_MIN_DEPTH, OCCURRENCE_FIELDS,
};
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "ocean-enrich")]
#[command(about = "Enrich occurrence records with ocean variables looked up by position and date")]
#[command(version)]
struct Args {
    /// Input CSV with decimalLongitude, decimalLatitude, year, month and day columns
    #[arg(long)]
    csv: PathBuf,

    /// Output CSV path
    #[arg(long = "out-csv", alias = "out_csv")]
    out_csv: PathBuf,

    /// Variables to look up, comma separated
    #[arg(long, value_delimiter = ',', default_value = "thetao,so")]
    variables: Vec<String>,

    /// Maximum number of lookups in flight at once
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY_LIMIT)]
    workers: usize,

    /// Dataset to query
    #[arg(long, default_value = DEFAULT_DATASET)]
    dataset: String,

    /// Upper edge of the depth band, in metres
    #[arg(long, default_value_t = DEFAULT_MIN_DEPTH, allow_negative_numbers = true)]
    min_depth: f64,

    /// Lower edge of the depth band, in metres
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH, allow_negative_numbers = true)]
    max_depth: f64,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,

    /// Base URL of the data service; falls back to COPERNICUS_URL
    #[arg(long)]
    service_url: Option<String>,

    /// Keep rows with missing or failed lookups and add outcome columns
    #[arg(long)]
    keep_incomplete: bool,
}

#[tokio::main]
async fn main() -> Result<(), BiomarineError> {
    init_logging();
    dotenv::dotenv().ok();
    let args = Args::parse();

    let credentials = OceanCredentials::from_env()?;
    let service_url = match args.service_url {
        Some(url) => url,
        None => service_url_from_env()?,
    };
    let client = Arc::new(
        OceanClient::builder()
            .base_url(service_url)
            .credentials(credentials)
            .dataset(args.dataset)
            .min_depth(args.min_depth)
            .max_depth(args.max_depth)
            .timeout(Duration::from_secs(args.timeout_secs))
            .build()?,
    );

    let lookups = args
        .variables
        .iter()
        .map(|variable| {
            NamedLookup::new(
                variable.clone(),
                OceanVariableLookup::new(client.clone(), variable.clone()),
            )
        })
        .collect();
    let enricher = Enricher::builder()
        .lookups(lookups)
        .concurrency_limit(args.workers)
        .build()?;
    let policy = if args.keep_incomplete {
        IncompletePolicy::Keep
    } else {
        IncompletePolicy::Drop
    };

    let table = read_csv(&args.csv).await?;
    if let Err(e) = require_columns(&table, &args.csv, &OCCURRENCE_FIELDS) {
        warn!("{}; affected rows will be marked failed", e);
    }
    let (columns, rows) = table.into_parts();
    check_output_columns(&columns, &enricher.lookup_names(), policy)?;

    let enriched = enricher.run(rows).await;
    let output = enriched_table(&columns, &enricher.lookup_names(), enriched, policy);
    write_csv(&output, &args.out_csv).await?;

    info!(
        "Enriched table with {} rows written to {} (incomplete rows: {})",
        output.len(),
        args.out_csv.display(),
        policy
    );
    Ok(())
}
