mod enrich;
mod error;
mod logging;
mod occurrences;
mod ocean;
mod table;
mod types;

pub use error::BiomarineError;
pub use logging::init_logging;

pub use types::coordinate::LatLon;
pub use types::outcome::{EnrichedRow, LookupResult, Outcome};
pub use types::row::{Row, Table};
pub use types::value::Value;

pub use table::csv::{read_csv, require_columns, write_csv};
pub use table::error::TableError;

pub use enrich::enricher::{enrich, filter_complete, Enricher, DEFAULT_CONCURRENCY_LIMIT};
pub use enrich::error::{EnrichError, LookupError};
pub use enrich::lookup::{Lookup, NamedLookup};
pub use enrich::output::{
    check_output_columns, enriched_table, IncompletePolicy, OUTCOME_COLUMN, REASON_COLUMN,
};

pub use ocean::client::{
    OceanClient, DEFAULT_DATASET, DEFAULT_MAX_DEPTH, DEFAULT_MIN_DEPTH, DEFAULT_TIMEOUT,
};
pub use ocean::credentials::{service_url_from_env, OceanCredentials};
pub use ocean::error::OceanError;
pub use ocean::lookup::{
    occurrence_position, OceanVariableLookup, OCCURRENCE_FIELDS, SALINITY, TEMPERATURE,
};

pub use occurrences::client::{OccurrenceClient, BASE_URL_VAR, DEFAULT_LIMIT, MAX_PAGE_SIZE};
pub use occurrences::error::OccurrenceError;
pub use occurrences::projection::OCCURRENCE_COLUMNS;
pub use occurrences::query::{BoundingBox, EventDateRange};
