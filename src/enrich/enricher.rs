//! Concurrent per-row enrichment.
//!
//! Every (row, lookup) pair is an independent unit of work. Units are driven through a
//! bounded pool whose size is the concurrency limit, so at most that many lookups are in
//! flight at any instant across the whole batch. Each unit carries the position of its
//! row and the slot of its lookup, and its result is written to exactly that place, so
//! completion order never affects where results land.

use crate::enrich::error::EnrichError;
use crate::enrich::lookup::NamedLookup;
use crate::types::outcome::{EnrichedRow, LookupResult, Outcome};
use crate::types::row::Row;
use bon::bon;
use futures_util::{stream, StreamExt};
use log::{debug, info, warn};
use std::collections::HashSet;

/// Number of concurrent lookups used when none is configured.
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 5;

/// A validated set of lookups plus the concurrency limit to run them with.
///
/// Construction fails if the limit is zero or two lookups share a name, so a run that
/// has started can no longer fail as a whole: lookup errors only ever affect their own
/// row.
///
/// # Examples
///
/// ```
/// use biomarine::{Enricher, LookupError, NamedLookup, Row, Value};
///
/// fn year_plus_one(row: &Row) -> Result<Option<Value>, LookupError> {
///     Ok(row.get("year").and_then(Value::as_i64).map(|y| Value::Int(y + 1)))
/// }
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let enricher = Enricher::builder()
///     .lookups(vec![NamedLookup::new("next_year", year_plus_one)])
///     .concurrency_limit(2)
///     .build()?;
///
/// let rows = vec![Row::new(0, vec![("year".to_string(), Value::Int(2020))])];
/// let enriched = enricher.run(rows).await;
/// assert_eq!(enriched[0].value("next_year"), Some(&Value::Int(2021)));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Enricher {
    lookups: Vec<NamedLookup>,
    concurrency_limit: usize,
}

#[bon]
impl Enricher {
    #[builder]
    pub fn new(
        lookups: Vec<NamedLookup>,
        #[builder(default = DEFAULT_CONCURRENCY_LIMIT)] concurrency_limit: usize,
    ) -> Result<Self, EnrichError> {
        validate(&lookups, concurrency_limit)?;
        Ok(Self {
            lookups,
            concurrency_limit,
        })
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    /// Names of the output fields, in lookup order.
    pub fn lookup_names(&self) -> Vec<String> {
        self.lookups.iter().map(|l| l.name().to_string()).collect()
    }

    /// Enriches `rows`, returning one [`EnrichedRow`] per input row in input order.
    pub async fn run(&self, rows: Vec<Row>) -> Vec<EnrichedRow> {
        dispatch(rows, &self.lookups, self.concurrency_limit).await
    }
}

/// Enriches `rows` with `lookups`, running at most `concurrency_limit` lookups at once.
///
/// The result has the same length and order as `rows`. A lookup error marks its row
/// [`Outcome::Failed`] and leaves every other row untouched. Each lookup is attempted
/// exactly once per row.
///
/// # Errors
///
/// Returns [`EnrichError::InvalidConcurrencyLimit`] if `concurrency_limit` is zero and
/// [`EnrichError::DuplicateLookup`] if two lookups share a name. In both cases no lookup
/// has been attempted.
pub async fn enrich(
    rows: Vec<Row>,
    lookups: &[NamedLookup],
    concurrency_limit: usize,
) -> Result<Vec<EnrichedRow>, EnrichError> {
    validate(lookups, concurrency_limit)?;
    Ok(dispatch(rows, lookups, concurrency_limit).await)
}

/// Keeps only [`Outcome::Complete`] rows, preserving their order.
pub fn filter_complete(rows: Vec<EnrichedRow>) -> Vec<EnrichedRow> {
    rows.into_iter().filter(EnrichedRow::is_complete).collect()
}

fn validate(lookups: &[NamedLookup], concurrency_limit: usize) -> Result<(), EnrichError> {
    if concurrency_limit < 1 {
        return Err(EnrichError::InvalidConcurrencyLimit(concurrency_limit));
    }
    let mut seen = HashSet::new();
    for lookup in lookups {
        if !seen.insert(lookup.name()) {
            return Err(EnrichError::DuplicateLookup(lookup.name().to_string()));
        }
    }
    Ok(())
}

async fn dispatch(
    rows: Vec<Row>,
    lookups: &[NamedLookup],
    concurrency_limit: usize,
) -> Vec<EnrichedRow> {
    if rows.is_empty() {
        return Vec::new();
    }
    info!(
        "Enriching {} rows with {} lookups ({} concurrent)",
        rows.len(),
        lookups.len(),
        concurrency_limit
    );

    // slots[position][lookup] is written exactly once, by the unit for that pair.
    let mut slots: Vec<Vec<Option<LookupResult>>> = rows
        .iter()
        .map(|_| (0..lookups.len()).map(|_| None).collect())
        .collect();

    let completed: Vec<(usize, usize, LookupResult)> = {
        let units = rows.iter().enumerate().flat_map(move |(position, row)| {
            lookups
                .iter()
                .enumerate()
                .map(move |(slot, lookup)| (position, slot, row, lookup))
        });
        stream::iter(units)
            .map(|(position, slot, row, lookup)| async move {
                let result = LookupResult::from(lookup.run(row).await);
                if let LookupResult::Failed(reason) = &result {
                    debug!(
                        "Lookup '{}' failed for row {}: {}",
                        lookup.name(),
                        row.index(),
                        reason
                    );
                }
                (position, slot, result)
            })
            .buffer_unordered(concurrency_limit)
            .collect()
            .await
    };

    for (position, slot, result) in completed {
        slots[position][slot] = Some(result);
    }

    let enriched: Vec<EnrichedRow> = rows
        .into_iter()
        .zip(slots)
        .map(|(row, results)| {
            let named = lookups
                .iter()
                .zip(results)
                .map(|(lookup, result)| {
                    let result = result.unwrap_or_else(|| {
                        LookupResult::Failed("lookup did not complete".to_string())
                    });
                    (lookup.name().to_string(), result)
                })
                .collect();
            EnrichedRow::new(row, named)
        })
        .collect();

    log_summary(&enriched);
    enriched
}

fn log_summary(rows: &[EnrichedRow]) {
    let mut complete = 0;
    let mut partial = 0;
    let mut failed = 0;
    for row in rows {
        match row.outcome() {
            Outcome::Complete => complete += 1,
            Outcome::Partial => partial += 1,
            Outcome::Failed { reason } => {
                failed += 1;
                warn!("Row {} failed: {}", row.index(), reason);
                debug!("Row {} contents: {:?}", row.index(), row.row().fields());
            }
        }
    }
    info!(
        "Enrichment finished: {} complete, {} partial, {} failed",
        complete, partial, failed
    );
}
