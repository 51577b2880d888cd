use thiserror::Error;

/// Error type for pgtable operations
#[derive(Debug, Error)]
pub enum PgTableError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Expected {expected} row(s), got {actual}")]
    UnexpectedRowCount { expected: usize, actual: usize },

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Unexpected NULL in column {0}")]
    UnexpectedNull(String),

    #[error("Row not found in {table} for key {key}")]
    RowNotFound { table: String, key: String },

    #[error("Missing primary key {column} for {table}")]
    MissingPrimaryKey { table: String, column: String },

    #[error("Unknown columns for {table}: {}", .columns.join(", "))]
    UnknownColumns { table: String, columns: Vec<String> },

    #[error("Table not found or has no columns: {0}")]
    TableNotFound(String),

    #[error("Condition expects {expected} parameter(s), got {actual}")]
    ParameterMismatch { expected: usize, actual: usize },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type alias for pgtable operations
pub type Result<T> = std::result::Result<T, PgTableError>;
