use std::fmt;

use super::DatabaseDriver;

/// Trait representing a database column.
pub trait Column {
    /// Returns the column name as it appears in the database.
    fn column_name(&self) -> &'static str;

    /// Returns the table name this column belongs to.
    fn table_name(&self) -> &'static str;

    /// Returns the fully qualified column name (table.column).
    fn qualified_name(&self) -> String {
        format!("{}.{}", self.table_name(), self.column_name())
    }
}

/// A reference to a column, used internally by query builders.
/// Gateways build these from runtime table names, so both parts are owned.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

impl ColumnRef {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }

    pub fn from_column<C: Column + ?Sized>(col: &C) -> Self {
        Self::new(col.table_name(), col.column_name())
    }

    /// `table.column` with both parts quoted by `driver`.
    pub fn quoted(&self, driver: &dyn DatabaseDriver) -> String {
        format!(
            "{}.{}",
            driver.quote_identifier(&self.table),
            driver.quote_identifier(&self.column)
        )
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}
