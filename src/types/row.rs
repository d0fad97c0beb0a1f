//! Records and tables.
//!
//! A [`Row`] keeps its position in the table it was read from, so that work done on it
//! out of order can always be put back in the right place.

use crate::types::value::Value;

/// One record of a table: an ordered mapping from field name to [`Value`], together
/// with its stable position in the source table.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    index: usize,
    fields: Vec<(String, Value)>,
}

impl Row {
    pub fn new(index: usize, fields: Vec<(String, Value)>) -> Self {
        Self { index, fields }
    }

    /// Position of the row in its source table.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Looks up a field by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub(crate) fn into_fields(self) -> Vec<(String, Value)> {
        self.fields
    }
}

/// An ordered set of rows sharing a header.
///
/// Rows are not required to carry every column: writing a table fills the gaps with
/// empty cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Builds a table from positional records. Each record is matched to `columns` by
    /// position; short records are padded with [`Value::Null`].
    pub fn from_records(columns: Vec<String>, records: Vec<Vec<Value>>) -> Self {
        let mut table = Self::new(columns);
        for record in records {
            table.push_record(record);
        }
        table
    }

    /// Appends a positional record, assigning it the next row index.
    pub fn push_record(&mut self, record: Vec<Value>) {
        let mut values = record.into_iter();
        let fields = self
            .columns
            .iter()
            .map(|column| (column.clone(), values.next().unwrap_or(Value::Null)))
            .collect();
        self.rows.push(Row::new(self.rows.len(), fields));
    }

    /// Appends an already built row. The row keeps its own index.
    pub fn push_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Splits the table into its header and rows.
    pub fn into_parts(self) -> (Vec<String>, Vec<Row>) {
        (self.columns, self.rows)
    }

    /// Returns the requested column names that the header does not contain.
    pub fn missing_columns<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|name| !self.columns.iter().any(|column| column == name))
            .collect()
    }

    /// Iterates over one column, yielding [`Value::Null`] for rows lacking the field.
    pub(crate) fn column_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Value> {
        self.rows
            .iter()
            .map(move |row| row.get(name).unwrap_or(&Value::Null))
    }
}
