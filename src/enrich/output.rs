//! Turning enriched rows back into a writable [`Table`].

use crate::enrich::enricher::filter_complete;
use crate::enrich::error::EnrichError;
use crate::types::outcome::{EnrichedRow, LookupResult};
use crate::types::row::{Row, Table};
use crate::types::value::Value;
use log::info;
use std::fmt;
use std::str::FromStr;

/// Column holding the outcome label when incomplete rows are kept.
pub const OUTCOME_COLUMN: &str = "outcome";
/// Column holding the failure reason when incomplete rows are kept.
pub const REASON_COLUMN: &str = "outcome_reason";

/// What to do with rows that are not [`crate::Outcome::Complete`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IncompletePolicy {
    /// Remove partial and failed rows from the output.
    #[default]
    Drop,
    /// Keep every row and annotate each with its outcome and failure reason.
    Keep,
}

impl fmt::Display for IncompletePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IncompletePolicy::Drop => f.write_str("drop"),
            IncompletePolicy::Keep => f.write_str("keep"),
        }
    }
}

impl FromStr for IncompletePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "drop" => Ok(IncompletePolicy::Drop),
            "keep" => Ok(IncompletePolicy::Keep),
            other => Err(format!("unknown incomplete-row policy '{}'", other)),
        }
    }
}

/// Checks that the output header can be assembled before any lookup runs.
///
/// With [`IncompletePolicy::Keep`] neither an input column nor a lookup may be called
/// [`OUTCOME_COLUMN`] or [`REASON_COLUMN`].
pub fn check_output_columns(
    input_columns: &[String],
    lookup_names: &[String],
    policy: IncompletePolicy,
) -> Result<(), EnrichError> {
    if policy == IncompletePolicy::Drop {
        return Ok(());
    }
    match input_columns
        .iter()
        .chain(lookup_names)
        .find(|name| *name == OUTCOME_COLUMN || *name == REASON_COLUMN)
    {
        Some(name) => Err(EnrichError::ReservedColumn(name.clone())),
        None => Ok(()),
    }
}

/// Builds the output table from the input header and the enriched rows.
///
/// Columns are the input columns followed by one column per lookup, in lookup order.
/// A lookup whose name matches an input column replaces that column's values in place.
/// Missing and failed lookups leave an empty cell. With [`IncompletePolicy::Keep`] two
/// more columns, [`OUTCOME_COLUMN`] and [`REASON_COLUMN`], are appended.
pub fn enriched_table(
    input_columns: &[String],
    lookup_names: &[String],
    rows: Vec<EnrichedRow>,
    policy: IncompletePolicy,
) -> Table {
    let mut columns = input_columns.to_vec();
    for name in lookup_names {
        if !columns.contains(name) {
            columns.push(name.clone());
        }
    }
    if policy == IncompletePolicy::Keep {
        columns.push(OUTCOME_COLUMN.to_string());
        columns.push(REASON_COLUMN.to_string());
    }

    let total = rows.len();
    let rows = match policy {
        IncompletePolicy::Drop => filter_complete(rows),
        IncompletePolicy::Keep => rows,
    };
    if policy == IncompletePolicy::Drop {
        info!("Dropped {} incomplete rows of {}", total - rows.len(), total);
    }

    let mut table = Table::new(columns);
    for enriched in rows {
        let (row, results, outcome) = enriched.into_parts();
        let index = row.index();
        let mut fields = row.into_fields();
        for (name, result) in results {
            let value = match result {
                LookupResult::Value(value) => value,
                LookupResult::Missing | LookupResult::Failed(_) => Value::Null,
            };
            match fields.iter_mut().find(|(field, _)| *field == name) {
                Some((_, existing)) => *existing = value,
                None => fields.push((name, value)),
            }
        }
        if policy == IncompletePolicy::Keep {
            fields.push((OUTCOME_COLUMN.to_string(), Value::from(outcome.label())));
            fields.push((
                REASON_COLUMN.to_string(),
                outcome.reason().map(Value::from).unwrap_or(Value::Null),
            ));
        }
        table.push_row(Row::new(index, fields));
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input_columns() -> Vec<String> {
        vec!["year".to_string(), "thetao".to_string()]
    }

    fn enriched_rows() -> Vec<EnrichedRow> {
        vec![
            EnrichedRow::new(
                Row::new(
                    0,
                    vec![
                        ("year".to_string(), Value::Int(2019)),
                        ("thetao".to_string(), Value::Null),
                    ],
                ),
                vec![
                    ("thetao".to_string(), LookupResult::Value(Value::Float(24.5))),
                    ("so".to_string(), LookupResult::Value(Value::Float(36.1))),
                ],
            ),
            EnrichedRow::new(
                Row::new(
                    1,
                    vec![
                        ("year".to_string(), Value::Int(2020)),
                        ("thetao".to_string(), Value::Null),
                    ],
                ),
                vec![
                    ("thetao".to_string(), LookupResult::Missing),
                    ("so".to_string(), LookupResult::Failed("timed out".to_string())),
                ],
            ),
        ]
    }

    fn lookup_names() -> Vec<String> {
        vec!["thetao".to_string(), "so".to_string()]
    }

    #[test]
    fn test_drop_keeps_only_complete_rows() {
        let table = enriched_table(
            &input_columns(),
            &lookup_names(),
            enriched_rows(),
            IncompletePolicy::Drop,
        );
        assert_eq!(table.columns(), &["year", "thetao", "so"]);
        assert_eq!(table.len(), 1);
        let row = &table.rows()[0];
        assert_eq!(row.get("thetao"), Some(&Value::Float(24.5)));
        assert_eq!(row.get("so"), Some(&Value::Float(36.1)));
    }

    #[test]
    fn test_keep_annotates_outcomes() {
        let table = enriched_table(
            &input_columns(),
            &lookup_names(),
            enriched_rows(),
            IncompletePolicy::Keep,
        );
        assert_eq!(
            table.columns(),
            &["year", "thetao", "so", OUTCOME_COLUMN, REASON_COLUMN]
        );
        assert_eq!(table.len(), 2);
        let failed = &table.rows()[1];
        assert_eq!(failed.index(), 1);
        assert_eq!(failed.get("thetao"), Some(&Value::Null));
        assert_eq!(failed.get(OUTCOME_COLUMN), Some(&Value::from("failed")));
        assert_eq!(failed.get(REASON_COLUMN), Some(&Value::from("timed out")));
        assert_eq!(
            table.rows()[0].get(REASON_COLUMN),
            Some(&Value::Null)
        );
    }

    #[test]
    fn test_outcome_columns_reserved_when_keeping() {
        let columns = vec!["decimalLongitude".to_string(), OUTCOME_COLUMN.to_string()];
        let lookups = vec!["thetao".to_string()];
        match check_output_columns(&columns, &lookups, IncompletePolicy::Keep) {
            Err(EnrichError::ReservedColumn(name)) => assert_eq!(name, OUTCOME_COLUMN),
            other => panic!("expected ReservedColumn, got {:?}", other),
        }

        let lookups = vec![REASON_COLUMN.to_string()];
        assert!(check_output_columns(&input_columns(), &lookups, IncompletePolicy::Keep).is_err());

        assert!(check_output_columns(&columns, &lookups, IncompletePolicy::Drop).is_ok());
        assert!(
            check_output_columns(&input_columns(), &lookup_names(), IncompletePolicy::Keep)
                .is_ok()
        );
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("Keep".parse::<IncompletePolicy>(), Ok(IncompletePolicy::Keep));
        assert_eq!(IncompletePolicy::default(), IncompletePolicy::Drop);
        assert!("sometimes".parse::<IncompletePolicy>().is_err());
    }
}
