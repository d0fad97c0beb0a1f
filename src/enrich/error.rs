use thiserror::Error;

/// Configuration problems detected before any lookup is scheduled.
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("Concurrency limit must be at least 1, got {0}")]
    InvalidConcurrencyLimit(usize),

    #[error("Lookup '{0}' is defined more than once")]
    DuplicateLookup(String),

    #[error("Column '{0}' is reserved for the row outcome when incomplete rows are kept")]
    ReservedColumn(String),
}

/// Failure of a single lookup for a single row.
///
/// These never abort a batch; the enricher turns them into the row's failure reason.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("row has no '{0}' field")]
    MissingField(String),

    #[error("field '{field}' has unusable value '{value}'")]
    InvalidField { field: String, value: String },

    #[error("invalid date {year}-{month:02}-{day:02}")]
    InvalidDate { year: i64, month: i64, day: i64 },

    #[error("coordinate lat={0}, lon={1} is out of range")]
    InvalidCoordinate(f64, f64),

    #[error("no data record found at {0}")]
    NotFound(String),

    #[error("request timed out for {0}")]
    Timeout(String),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to decode response from {0}")]
    Decode(String, #[source] reqwest::Error),

    #[error("Unexpected response from {url}: {message}")]
    UnexpectedResponse { url: String, message: String },

    #[error("{0}")]
    Message(String),
}

impl LookupError {
    /// Maps a transport error from `url`, separating timeouts from other failures.
    pub(crate) fn from_request(url: &str, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LookupError::Timeout(url.to_string())
        } else {
            LookupError::NetworkRequest(url.to_string(), e)
        }
    }

    /// The error message followed by its chain of causes, joined by `": "`.
    pub fn reason(&self) -> String {
        let mut reason = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            reason.push_str(": ");
            reason.push_str(&cause.to_string());
            source = cause.source();
        }
        reason
    }
}
