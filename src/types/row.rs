use std::collections::HashMap;

use crate::{
    error::{PgTableError, Result},
    Column,
};

/// Driver-agnostic raw result from a database query.
/// Values are converted to strings by the driver; SQL NULL is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawQueryResult {
    /// Column names in order
    pub columns: Vec<String>,
    /// Rows, where each row is a vector of values in column order
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawQueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { columns, rows }
    }

    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Values of one named column across all rows, in row order.
    pub fn column_values(&self, column: &str) -> Result<Vec<Option<String>>> {
        let index = self
            .columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| PgTableError::ColumnNotFound(column.to_string()))?;
        Ok(self
            .rows
            .iter()
            .filter_map(|row| row.get(index).cloned())
            .collect())
    }
}

/// A single row result from a query.
/// Values are stored as strings and accessed by column name.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: HashMap<String, Option<String>>,
}

impl Row {
    /// Creates a new Row from column names and values.
    pub(crate) fn new(columns: &[String], values: Vec<Option<String>>) -> Self {
        let values = columns
            .iter()
            .zip(values.into_iter())
            .map(|(col, val)| (col.clone(), val))
            .collect();
        Self { values }
    }

    /// Gets a value by column. `None` is SQL NULL.
    pub fn get<T: Column + ?Sized>(&self, column: &T) -> Result<Option<&str>> {
        self.values
            .get(column.column_name())
            .map(Option::as_deref)
            .ok_or_else(|| PgTableError::ColumnNotFound(column.qualified_name()))
    }

    /// Gets a value by column name. `None` is SQL NULL.
    pub fn value(&self, name: &str) -> Result<Option<&str>> {
        self.values
            .get(name)
            .map(Option::as_deref)
            .ok_or_else(|| PgTableError::ColumnNotFound(name.to_string()))
    }

    /// Whether the named column holds SQL NULL.
    pub fn is_null(&self, name: &str) -> Result<bool> {
        Ok(self.value(name)?.is_none())
    }

    /// Returns all column names in this row.
    pub fn columns(&self) -> Vec<&str> {
        self.values.keys().map(|s| s.as_str()).collect()
    }

    /// Returns the number of columns in this row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if this row has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Result of a query execution, containing zero or more rows.
#[derive(Debug)]
pub struct QueryResult {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl QueryResult {
    /// Creates a QueryResult from a RawQueryResult.
    pub fn from_raw(raw: RawQueryResult) -> Self {
        let rows = raw
            .rows
            .into_iter()
            .map(|values| Row::new(&raw.columns, values))
            .collect();
        Self {
            columns: raw.columns,
            rows,
        }
    }

    /// Extracts a single row from the result.
    /// Returns an error if the result contains zero or more than one row.
    pub fn single_row(self) -> Result<Row> {
        let actual = self.rows.len();
        let mut rows = self.rows.into_iter();
        match (rows.next(), rows.next()) {
            (Some(row), None) => Ok(row),
            _ => Err(PgTableError::UnexpectedRowCount {
                expected: 1,
                actual,
            }),
        }
    }

    /// Returns the first row, or `None` when the result is empty.
    pub fn first_row(self) -> Option<Row> {
        self.rows.into_iter().next()
    }

    /// Returns all rows from the result.
    pub fn rows(self) -> Vec<Row> {
        self.rows
    }

    /// Returns the column names from this result.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the number of rows in this result.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if this result contains no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
