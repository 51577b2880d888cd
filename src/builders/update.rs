use std::sync::Arc;

use tracing::debug;

use crate::clauses::WhereClause;
use crate::error::Result;
use crate::traits::DatabaseDriver;
use crate::types::{Row, SqlValue, Values};
use crate::QueryResult;

/// UPDATE builder. Returns the updated rows via `RETURNING *`.
pub struct Update {
    driver: Arc<dyn DatabaseDriver>,
    table: String,
    values: Values,
    where_clause: Option<WhereClause>,
}

impl Update {
    pub(crate) fn new(driver: Arc<dyn DatabaseDriver>, table: impl Into<String>) -> Self {
        Self {
            driver,
            table: table.into(),
            values: Values::new(),
            where_clause: None,
        }
    }

    /// Set the columns to change.
    pub fn set(mut self, values: Values) -> Self {
        self.values = values;
        self
    }

    /// Add a WHERE clause. Repeated calls are combined with AND.
    pub fn where_(mut self, clause: WhereClause) -> Self {
        self.where_clause = Some(match self.where_clause.take() {
            Some(existing) => existing.and(clause),
            None => clause,
        });
        self
    }

    fn build_sql(&self) -> Result<(String, Vec<SqlValue>)> {
        let mut params = Vec::new();
        let assignments = self
            .values
            .scalars()
            .map(|(column, value)| {
                params.push(value.clone());
                format!(
                    "{} = ${}",
                    self.driver.quote_identifier(column),
                    params.len()
                )
            })
            .collect::<Vec<_>>()
            .join(", ");

        let mut sql = format!(
            "UPDATE {} SET {}",
            self.driver.quote_identifier(&self.table),
            assignments
        );
        if let Some(ref where_clause) = self.where_clause {
            sql.push_str(" WHERE ");
            let where_sql = where_clause.build_sql(self.driver.as_ref(), 0, &mut params)?;
            sql.push_str(&where_sql);
        }
        sql.push_str(" RETURNING *");
        Ok((sql, params))
    }

    /// Execute the update and return every updated row.
    pub async fn execute(self) -> Result<Vec<Row>> {
        let (sql, params) = self.build_sql()?;
        debug!(sql = %sql, params = params.len(), "update");
        let raw = self.driver.execute(&sql, &params).await?;
        Ok(QueryResult::from_raw(raw).rows())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::InMemoryTestDriver;
    use crate::traits::ColumnRef;

    #[test]
    fn test_build_update() {
        let update = Update::new(Arc::new(InMemoryTestDriver::new()), "product")
            .set(Values::new().set("name", "Updated").set("price", 5.0))
            .where_(WhereClause::Eq(ColumnRef::new("product", "id"), 5.into()));

        let (sql, params) = update.build_sql().unwrap();
        assert_eq!(
            sql,
            r#"UPDATE "product" SET "name" = $1, "price" = $2 WHERE "product"."id" = $3 RETURNING *"#
        );
        assert_eq!(
            params,
            vec![
                SqlValue::from("Updated"),
                SqlValue::from(5.0),
                SqlValue::from(5)
            ]
        );
    }
}
