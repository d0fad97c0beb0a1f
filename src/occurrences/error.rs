use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OccurrenceError {
    #[error("Invalid bounding box: {0}")]
    InvalidBoundingBox(String),

    #[error("Begin date {begin} is after end date {end}")]
    InvalidDateRange { begin: NaiveDate, end: NaiveDate },

    #[error("Failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to decode occurrence page from {0}")]
    Decode(String, #[source] reqwest::Error),
}
