//! The [`Lookup`] capability and its named wrapper.

use crate::enrich::error::LookupError;
use crate::types::row::Row;
use crate::types::value::Value;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Produces one field's value for a row, typically by asking a remote service.
///
/// Returning `Ok(None)` means the source answered but had no data for the row. An
/// implementation is expected to bound its own latency (for example with a request
/// timeout) and report a timeout as an error rather than hang.
///
/// Plain functions and closures with the signature
/// `Fn(&Row) -> Result<Option<Value>, LookupError>` implement this trait, which makes
/// substituting a deterministic lookup in tests straightforward.
///
/// # Examples
///
/// ```
/// use biomarine::{LookupError, NamedLookup, Row, Value};
///
/// fn coordinate_sum(row: &Row) -> Result<Option<Value>, LookupError> {
///     let lon = row.get("decimalLongitude").and_then(Value::as_f64);
///     let lat = row.get("decimalLatitude").and_then(Value::as_f64);
///     match (lon, lat) {
///         (Some(lon), Some(lat)) => Ok(Some(Value::Float(lon + lat))),
///         _ => Err(LookupError::MissingField("decimalLongitude".to_string())),
///     }
/// }
///
/// let lookup = NamedLookup::new("sum", coordinate_sum);
/// assert_eq!(lookup.name(), "sum");
/// ```
#[async_trait]
pub trait Lookup: Send + Sync {
    async fn lookup(&self, row: &Row) -> Result<Option<Value>, LookupError>;
}

#[async_trait]
impl<F> Lookup for F
where
    F: Fn(&Row) -> Result<Option<Value>, LookupError> + Send + Sync,
{
    async fn lookup(&self, row: &Row) -> Result<Option<Value>, LookupError> {
        self(row)
    }
}

/// A [`Lookup`] together with the name of the output field it fills.
#[derive(Clone)]
pub struct NamedLookup {
    name: String,
    lookup: Arc<dyn Lookup>,
}

impl NamedLookup {
    pub fn new(name: impl Into<String>, lookup: impl Lookup + 'static) -> Self {
        Self {
            name: name.into(),
            lookup: Arc::new(lookup),
        }
    }

    /// Wraps a lookup that is already shared elsewhere.
    pub fn from_shared(name: impl Into<String>, lookup: Arc<dyn Lookup>) -> Self {
        Self {
            name: name.into(),
            lookup,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) async fn run(&self, row: &Row) -> Result<Option<Value>, LookupError> {
        self.lookup.lookup(row).await
    }
}

impl fmt::Debug for NamedLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedLookup")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
