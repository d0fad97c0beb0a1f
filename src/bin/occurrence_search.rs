//! Searches species occurrences inside a bounding box and date range and writes their
//! coordinates and dates to a CSV file.

use biomarine::{
    init_logging, write_csv, BiomarineError, BoundingBox, EventDateRange, OccurrenceClient,
    OccurrenceError, BASE_URL_VAR, DEFAULT_LIMIT,
};
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "occurrence-search")]
#[command(about = "Search georeferenced species occurrences and save them as CSV")]
#[command(version)]
struct Args {
    /// Scientific name of the species
    #[arg(long = "specie", alias = "species")]
    specie: String,

    /// Bounding box edges
    #[arg(
        long,
        num_args = 4,
        required = true,
        allow_negative_numbers = true,
        value_names = ["LAT_MAX", "LAT_MIN", "LON_MAX", "LON_MIN"]
    )]
    bbox: Vec<f64>,

    /// Maximum number of occurrences to fetch
    #[arg(long, default_value_t = DEFAULT_LIMIT)]
    limit: usize,

    /// First event date, YYYY-MM-DD
    #[arg(long = "begin-date", alias = "begin_date")]
    begin_date: NaiveDate,

    /// Last event date, YYYY-MM-DD
    #[arg(long = "end-date", alias = "end_date")]
    end_date: NaiveDate,

    /// Output CSV path
    #[arg(long = "out-csv", alias = "out_csv")]
    out_csv: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), BiomarineError> {
    init_logging();
    dotenv::dotenv().ok();
    let args = Args::parse();

    let bounding_box = match args.bbox.as_slice() {
        [lat_max, lat_min, lon_max, lon_min] => {
            BoundingBox::new(*lat_max, *lat_min, *lon_max, *lon_min)?
        }
        other => {
            return Err(OccurrenceError::InvalidBoundingBox(format!(
                "expected 4 values, got {}",
                other.len()
            ))
            .into())
        }
    };
    let event_dates = EventDateRange::new(args.begin_date, args.end_date)?;

    let client = OccurrenceClient::builder()
        .maybe_base_url(std::env::var(BASE_URL_VAR).ok())
        .build()?;
    let table = client
        .search()
        .scientific_name(&args.specie)
        .bounding_box(bounding_box)
        .event_dates(event_dates)
        .limit(args.limit)
        .call()
        .await?;

    write_csv(&table, &args.out_csv).await?;
    Ok(())
}
