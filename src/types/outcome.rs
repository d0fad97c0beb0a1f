//! Per-lookup results and the per-row classification derived from them.

use crate::enrich::error::LookupError;
use crate::types::row::Row;
use crate::types::value::Value;
use std::fmt;

/// What a single lookup produced for a single row.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupResult {
    /// The lookup returned a value.
    Value(Value),
    /// The lookup ran but the data source had nothing for this row.
    Missing,
    /// The lookup raised an error; the message is kept as the failure reason.
    Failed(String),
}

impl LookupResult {
    pub fn value(&self) -> Option<&Value> {
        match self {
            LookupResult::Value(value) => Some(value),
            _ => None,
        }
    }
}

impl From<Result<Option<Value>, LookupError>> for LookupResult {
    fn from(result: Result<Option<Value>, LookupError>) -> Self {
        match result {
            Ok(Some(Value::Null)) | Ok(None) => LookupResult::Missing,
            Ok(Some(Value::Float(v))) if !v.is_finite() => LookupResult::Missing,
            Ok(Some(value)) => LookupResult::Value(value),
            Err(e) => LookupResult::Failed(e.reason()),
        }
    }
}

/// Classification of a row once all of its lookups have finished.
///
/// A row with at least one failed lookup is [`Outcome::Failed`] even if another lookup
/// came back empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Complete,
    Partial,
    Failed { reason: String },
}

impl Outcome {
    /// Derives the outcome from a row's lookup results. Multiple failure reasons are
    /// joined with `"; "` in lookup order.
    pub fn classify(results: &[LookupResult]) -> Outcome {
        let reasons: Vec<&str> = results
            .iter()
            .filter_map(|result| match result {
                LookupResult::Failed(reason) => Some(reason.as_str()),
                _ => None,
            })
            .collect();
        if !reasons.is_empty() {
            return Outcome::Failed {
                reason: reasons.join("; "),
            };
        }
        if results.iter().any(|r| matches!(r, LookupResult::Missing)) {
            Outcome::Partial
        } else {
            Outcome::Complete
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Outcome::Complete)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Complete => "complete",
            Outcome::Partial => "partial",
            Outcome::Failed { .. } => "failed",
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Outcome::Failed { reason } => Some(reason),
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Failed { reason } => write!(f, "failed: {}", reason),
            other => f.write_str(other.label()),
        }
    }
}

/// A row after enrichment: the untouched source row plus one result per lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRow {
    row: Row,
    results: Vec<(String, LookupResult)>,
    outcome: Outcome,
}

impl EnrichedRow {
    pub fn new(row: Row, results: Vec<(String, LookupResult)>) -> Self {
        let outcome = Outcome::classify(
            &results
                .iter()
                .map(|(_, result)| result.clone())
                .collect::<Vec<_>>(),
        );
        Self {
            row,
            results,
            outcome,
        }
    }

    /// Index of the source row.
    pub fn index(&self) -> usize {
        self.row.index()
    }

    pub fn row(&self) -> &Row {
        &self.row
    }

    pub fn results(&self) -> &[(String, LookupResult)] {
        &self.results
    }

    /// Result of the lookup named `name`.
    pub fn result(&self, name: &str) -> Option<&LookupResult> {
        self.results
            .iter()
            .find(|(lookup, _)| lookup == name)
            .map(|(_, result)| result)
    }

    /// Value of the lookup named `name`, if it produced one.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.result(name).and_then(LookupResult::value)
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn is_complete(&self) -> bool {
        self.outcome.is_complete()
    }

    pub(crate) fn into_parts(self) -> (Row, Vec<(String, LookupResult)>, Outcome) {
        (self.row, self.results, self.outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_wins_over_missing() {
        let outcome = Outcome::classify(&[
            LookupResult::Missing,
            LookupResult::Failed("timed out".to_string()),
            LookupResult::Value(Value::Float(35.1)),
        ]);
        assert_eq!(
            outcome,
            Outcome::Failed {
                reason: "timed out".to_string()
            }
        );
    }

    #[test]
    fn test_reasons_are_joined_in_order() {
        let outcome = Outcome::classify(&[
            LookupResult::Failed("thetao unavailable".to_string()),
            LookupResult::Failed("so unavailable".to_string()),
        ]);
        assert_eq!(outcome.reason(), Some("thetao unavailable; so unavailable"));
    }

    #[test]
    fn test_no_lookups_is_complete() {
        assert_eq!(Outcome::classify(&[]), Outcome::Complete);
    }

    #[test]
    fn test_null_value_counts_as_missing() {
        assert_eq!(LookupResult::from(Ok(Some(Value::Null))), LookupResult::Missing);
        assert_eq!(
            LookupResult::from(Err(LookupError::Message("not found".to_string()))),
            LookupResult::Failed("not found".to_string())
        );
    }

    #[test]
    fn test_non_finite_float_counts_as_missing() {
        for v in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert_eq!(
                LookupResult::from(Ok(Some(Value::Float(v)))),
                LookupResult::Missing
            );
        }
        assert_eq!(
            Outcome::classify(&[LookupResult::from(Ok(Some(Value::Float(f64::NAN))))]),
            Outcome::Partial
        );
        assert_eq!(
            LookupResult::from(Ok(Some(Value::Float(24.5)))),
            LookupResult::Value(Value::Float(24.5))
        );
    }
}
