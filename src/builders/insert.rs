use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::traits::DatabaseDriver;
use crate::types::{Row, SqlValue, Values};
use crate::QueryResult;

/// INSERT builder. Only scalar entries of the payload are written.
pub struct Insert {
    driver: Arc<dyn DatabaseDriver>,
    table: String,
    values: Values,
}

impl Insert {
    pub(crate) fn new(driver: Arc<dyn DatabaseDriver>, table: impl Into<String>) -> Self {
        Self {
            driver,
            table: table.into(),
            values: Values::new(),
        }
    }

    /// Set the row values.
    pub fn values(mut self, values: Values) -> Self {
        self.values = values;
        self
    }

    fn build_sql(&self) -> (String, Vec<SqlValue>) {
        let table = self.driver.quote_identifier(&self.table);
        let (columns, params): (Vec<String>, Vec<SqlValue>) = self
            .values
            .scalars()
            .map(|(column, value)| (self.driver.quote_identifier(column), value.clone()))
            .unzip();

        if columns.is_empty() {
            return (
                format!("INSERT INTO {} DEFAULT VALUES RETURNING *", table),
                params,
            );
        }

        let placeholders = (1..=params.len())
            .map(|i| format!("${}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING *",
            table,
            columns.join(", "),
            placeholders
        );
        (sql, params)
    }

    /// Execute the insert and return the created row.
    pub async fn execute(self) -> Result<Row> {
        let (sql, params) = self.build_sql();
        debug!(sql = %sql, params = params.len(), "insert");
        let raw = self.driver.execute(&sql, &params).await?;
        QueryResult::from_raw(raw).single_row()
    }
}
