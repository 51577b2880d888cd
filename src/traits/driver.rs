use async_trait::async_trait;

use crate::error::Result;
use crate::types::{RawQueryResult, SqlValue};

const DESCRIBE_SQL: &str = "SELECT column_name FROM information_schema.columns \
     WHERE table_schema = current_schema() AND table_name::text = $1 \
     ORDER BY ordinal_position";

const DESCRIBE_IN_SCHEMA_SQL: &str = "SELECT column_name FROM information_schema.columns \
     WHERE table_schema::text = $1 AND table_name::text = $2 \
     ORDER BY ordinal_position";

/// Trait for database driver implementations.
/// Drivers are responsible for:
/// - Connecting to the database
/// - Converting SqlValue parameters to native types
/// - Executing queries and converting results to RawQueryResult
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Execute a SQL query with the given parameters.
    /// Parameters use PostgreSQL-style placeholders ($1, $2, etc.)
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<RawQueryResult>;

    /// Execute a statement and return the number of affected rows.
    async fn execute_statement(&self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        let result = self.execute(sql, params).await?;
        Ok(result.rows.len() as u64)
    }

    /// Column names of a table in ordinal order. Empty if the table does not exist.
    async fn describe(&self, schema: Option<&str>, table: &str) -> Result<Vec<String>> {
        let result = match schema {
            Some(schema) => {
                self.execute(
                    DESCRIBE_IN_SCHEMA_SQL,
                    &[SqlValue::from(schema), SqlValue::from(table)],
                )
                .await?
            }
            None => self.execute(DESCRIBE_SQL, &[SqlValue::from(table)]).await?,
        };
        if result.rows.is_empty() {
            return Ok(Vec::new());
        }
        Ok(result
            .column_values("column_name")?
            .into_iter()
            .flatten()
            .collect())
    }

    /// Quote an identifier for use in SQL text. Dotted names are quoted per segment.
    fn quote_identifier(&self, ident: &str) -> String {
        ident
            .split('.')
            .map(|part| format!("\"{}\"", part.replace('"', "\"\"")))
            .collect::<Vec<_>>()
            .join(".")
    }
}
