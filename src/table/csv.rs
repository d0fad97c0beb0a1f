use crate::table::error::TableError;
use crate::types::row::Table;
use crate::types::value::Value;
use log::{debug, info};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::{fs, task};

/// Reads a comma separated file with a header row into a [`Table`].
///
/// Column types are inferred by polars over the whole file: integral columns become
/// [`Value::Int`], fractional ones [`Value::Float`], everything else [`Value::Str`].
/// Empty cells are [`Value::Null`]. Rows are indexed in file order starting at 0.
pub async fn read_csv(path: &Path) -> Result<Table, TableError> {
    let path_buf = path.to_path_buf();
    fs::metadata(&path_buf)
        .await
        .map_err(|e| TableError::Io(path_buf.clone(), e))?;

    let table = task::spawn_blocking(move || {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(None)
            .try_into_reader_with_file_path(Some(path_buf.clone()))
            .map_err(|e| TableError::Read {
                path: path_buf.clone(),
                source: e,
            })?
            .finish()
            .map_err(|e| TableError::Read {
                path: path_buf.clone(),
                source: e,
            })?;
        dataframe_to_table(&df).map_err(|e| TableError::Read {
            path: path_buf,
            source: e,
        })
    })
    .await??;

    info!(
        "Read {} rows with {} columns from {}",
        table.len(),
        table.columns().len(),
        path.display()
    );
    Ok(table)
}

/// Checks that the table header carries every column in `required`.
pub fn require_columns(table: &Table, path: &Path, required: &[&str]) -> Result<(), TableError> {
    let missing = table.missing_columns(required);
    if missing.is_empty() {
        return Ok(());
    }
    Err(TableError::MissingColumns {
        path: path.to_path_buf(),
        columns: missing.into_iter().map(str::to_string).collect(),
    })
}

/// Writes `table` as CSV with a header row.
///
/// The file is first written to a temporary file in the destination directory and
/// only moved over `path` once complete, so a failing run leaves no partial output.
pub async fn write_csv(table: &Table, path: &Path) -> Result<(), TableError> {
    let mut df = table_to_dataframe(table)?;
    let path_buf = path.to_path_buf();
    let rows = df.height();

    task::spawn_blocking(move || {
        let dir = output_dir(&path_buf);
        let mut temp_file =
            NamedTempFile::new_in(&dir).map_err(|e| TableError::TempFile(path_buf.clone(), e))?;
        CsvWriter::new(temp_file.as_file_mut())
            .include_header(true)
            .finish(&mut df)
            .map_err(|e| TableError::Write {
                path: path_buf.clone(),
                source: e,
            })?;
        temp_file
            .persist(&path_buf)
            .map_err(|e| TableError::Persist(path_buf.clone(), e.error))?;
        Ok::<(), TableError>(())
    })
    .await??;

    info!("Wrote {} rows to {}", rows, path.display());
    Ok(())
}

fn output_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn dataframe_to_table(df: &DataFrame) -> PolarsResult<Table> {
    let columns: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect();
    let series: Vec<&Series> = df
        .get_columns()
        .iter()
        .map(|column| column.as_materialized_series())
        .collect();

    let mut table = Table::new(columns);
    for idx in 0..df.height() {
        let record = series
            .iter()
            .map(|s| s.get(idx).map(value_from_any))
            .collect::<PolarsResult<Vec<Value>>>()?;
        table.push_record(record);
    }
    Ok(table)
}

fn value_from_any(value: AnyValue<'_>) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Int32(v) => Value::Int(v.into()),
        AnyValue::Int64(v) => Value::Int(v),
        AnyValue::UInt32(v) => Value::Int(v.into()),
        AnyValue::UInt64(v) => i64::try_from(v)
            .map(Value::Int)
            .unwrap_or(Value::Float(v as f64)),
        AnyValue::Float32(v) => Value::from(f64::from(v)),
        AnyValue::Float64(v) => Value::from(v),
        AnyValue::String(s) => Value::Str(s.to_string()),
        AnyValue::StringOwned(s) => Value::Str(s.to_string()),
        AnyValue::Boolean(b) => Value::Str(b.to_string()),
        other => Value::Str(other.to_string()),
    }
}

/// Storage type picked for an output column after looking at all of its cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Int,
    Float,
    Text,
}

impl ColumnKind {
    fn infer<'a>(values: impl Iterator<Item = &'a Value>) -> ColumnKind {
        let mut kind = ColumnKind::Int;
        for value in values {
            match value {
                Value::Null | Value::Int(_) => {}
                Value::Float(_) => kind = ColumnKind::Float,
                Value::Str(_) => return ColumnKind::Text,
            }
        }
        kind
    }
}

fn table_to_dataframe(table: &Table) -> Result<DataFrame, TableError> {
    let columns = table
        .columns()
        .iter()
        .map(|name| {
            let kind = ColumnKind::infer(table.column_values(name));
            debug!("Output column '{}' stored as {:?}", name, kind);
            let values = table.column_values(name);
            match kind {
                ColumnKind::Int => Column::new(
                    name.as_str().into(),
                    values.map(Value::as_i64).collect::<Vec<Option<i64>>>(),
                ),
                ColumnKind::Float => Column::new(
                    name.as_str().into(),
                    values.map(Value::as_f64).collect::<Vec<Option<f64>>>(),
                ),
                ColumnKind::Text => Column::new(
                    name.as_str().into(),
                    values
                        .map(|v| (!v.is_null()).then(|| v.to_string()))
                        .collect::<Vec<Option<String>>>(),
                ),
            }
        })
        .collect::<Vec<Column>>();

    DataFrame::new(columns).map_err(|e| TableError::Build {
        columns: table.columns().to_vec(),
        source: e,
    })
}
