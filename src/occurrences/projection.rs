use crate::types::row::Table;
use crate::types::value::Value;
use serde_json::{Map, Value as JsonValue};

/// Columns kept from occurrence records, in output order.
pub const OCCURRENCE_COLUMNS: [&str; 5] = [
    "decimalLongitude",
    "decimalLatitude",
    "year",
    "day",
    "month",
];

/// Projects raw occurrence records onto [`OCCURRENCE_COLUMNS`].
///
/// A column is kept when at least one record carries it; records lacking a kept column
/// get an empty cell there.
pub fn project_records(records: &[Map<String, JsonValue>]) -> Table {
    let columns: Vec<String> = OCCURRENCE_COLUMNS
        .iter()
        .filter(|column| records.iter().any(|record| record.contains_key(**column)))
        .map(|column| column.to_string())
        .collect();

    let rows = records
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|column| record.get(column).map(Value::from).unwrap_or(Value::Null))
                .collect()
        })
        .collect();
    Table::from_records(columns, rows)
}
