use crate::enrich::error::EnrichError;
use crate::occurrences::error::OccurrenceError;
use crate::ocean::error::OceanError;
use crate::table::error::TableError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BiomarineError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Enrich(#[from] EnrichError),

    #[error(transparent)]
    Ocean(#[from] OceanError),

    #[error(transparent)]
    Occurrence(#[from] OccurrenceError),
}
