use std::sync::Arc;

use tracing::debug;

use crate::clauses::WhereClause;
use crate::error::{PgTableError, Result};
use crate::traits::{Column, ColumnRef, DatabaseDriver, Table};
use crate::types::{QueryResult, Row, SqlValue};

/// Entry point for building a SELECT query.
/// Must call `.columns()` or `.all()` to proceed.
pub struct Select {
    driver: Arc<dyn DatabaseDriver>,
}

impl Select {
    pub(crate) fn new(driver: Arc<dyn DatabaseDriver>) -> Self {
        Self { driver }
    }

    /// Specify the columns to select.
    /// Accepts a slice of column references.
    pub fn columns(self, cols: &[&dyn Column]) -> SelectWithColumns {
        let columns = cols.iter().map(|c| ColumnRef::from_column(*c)).collect();
        SelectWithColumns {
            driver: self.driver,
            columns,
        }
    }

    /// Select every column (`SELECT *`).
    pub fn all(self) -> SelectWithColumns {
        SelectWithColumns {
            driver: self.driver,
            columns: Vec::new(),
        }
    }
}

/// SELECT builder after columns have been specified.
/// Must call `.from()` or `.from_table()` to proceed.
pub struct SelectWithColumns {
    driver: Arc<dyn DatabaseDriver>,
    columns: Vec<ColumnRef>,
}

impl SelectWithColumns {
    /// Specify the table to select from.
    pub fn from<T: Table>(self, _table: T) -> Selection {
        self.from_table(T::qualified_name())
    }

    /// Specify the table by name. A dotted name is read as `schema.table`.
    pub fn from_table(self, table: impl Into<String>) -> Selection {
        Selection {
            driver: self.driver,
            columns: self.columns,
            table: table.into(),
            where_clause: None,
            order: Vec::new(),
            limit: None,
        }
    }
}

/// Chainable, lazily executed query over a single table.
/// Nothing runs until one of the fetch methods, `execute` or `delete` is awaited.
pub struct Selection {
    driver: Arc<dyn DatabaseDriver>,
    columns: Vec<ColumnRef>,
    table: String,
    where_clause: Option<WhereClause>,
    order: Vec<String>,
    limit: Option<u64>,
}

impl Selection {
    /// Add a WHERE clause to the query. Repeated calls are combined with AND.
    pub fn where_(mut self, clause: WhereClause) -> Self {
        self.where_clause = Some(match self.where_clause.take() {
            Some(existing) => existing.and(clause),
            None => clause,
        });
        self
    }

    /// Add a raw condition, e.g. `filter("price > ?", &[10.into()])` or `filter("email", &[email])`.
    pub fn filter(self, condition: &str, params: &[SqlValue]) -> Self {
        self.where_(WhereClause::raw(condition, params.iter().cloned()))
    }

    /// Add an ORDER BY expression such as `"name"` or `"created_at DESC"`.
    pub fn order(mut self, expr: impl Into<String>) -> Self {
        self.order.push(expr.into());
        self
    }

    /// Add a LIMIT to the query.
    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// The table this selection reads from.
    pub fn table(&self) -> &str {
        &self.table
    }

    fn push_where(&self, sql: &mut String, params: &mut Vec<SqlValue>) -> Result<()> {
        if let Some(ref where_clause) = self.where_clause {
            sql.push_str(" WHERE ");
            let where_sql = where_clause.build_sql(self.driver.as_ref(), 0, params)?;
            sql.push_str(&where_sql);
        }
        Ok(())
    }

    /// Build the SQL query string and parameters.
    fn build_sql(&self) -> Result<(String, Vec<SqlValue>)> {
        let mut sql = String::with_capacity(256);
        let mut params = Vec::new();

        // SELECT clause
        sql.push_str("SELECT ");
        if self.columns.is_empty() {
            sql.push('*');
        }
        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push_str(&col.quoted(self.driver.as_ref()));
        }

        // FROM clause
        sql.push_str(" FROM ");
        sql.push_str(&self.driver.quote_identifier(&self.table));

        self.push_where(&mut sql, &mut params)?;

        if !self.order.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order.join(", "));
        }

        // LIMIT clause
        if let Some(limit) = self.limit {
            sql.push_str(" LIMIT ");
            sql.push_str(&limit.to_string());
        }

        Ok((sql, params))
    }

    fn build_delete_sql(&self) -> Result<(String, Vec<SqlValue>)> {
        let mut sql = format!("DELETE FROM {}", self.driver.quote_identifier(&self.table));
        let mut params = Vec::new();
        self.push_where(&mut sql, &mut params)?;
        Ok((sql, params))
    }

    /// Execute the query and return the result.
    pub async fn execute(self) -> Result<QueryResult> {
        let (sql, params) = self.build_sql()?;
        debug!(sql = %sql, params = params.len(), "select");
        let raw_result = self.driver.execute(&sql, &params).await?;
        Ok(QueryResult::from_raw(raw_result))
    }

    /// Fetch the first row, or `None` when nothing matches.
    pub async fn fetch(self) -> Result<Option<Row>> {
        Ok(self.limit(1).execute().await?.first_row())
    }

    /// Fetch every matching row.
    pub async fn fetch_all(self) -> Result<Vec<Row>> {
        Ok(self.execute().await?.rows())
    }

    /// Fetch `(key, value)` pairs in result order. A NULL value stays `None`;
    /// a NULL key is an error.
    pub async fn fetch_pairs(
        self,
        key: &str,
        value: &str,
    ) -> Result<Vec<(String, Option<String>)>> {
        self.execute()
            .await?
            .rows()
            .into_iter()
            .map(|row| {
                let k = row
                    .value(key)?
                    .ok_or_else(|| PgTableError::UnexpectedNull(key.to_string()))?;
                Ok((k.to_string(), row.value(value)?.map(str::to_string)))
            })
            .collect()
    }

    /// Delete every matching row and return the number of rows removed.
    pub async fn delete(self) -> Result<u64> {
        let (sql, params) = self.build_delete_sql()?;
        debug!(sql = %sql, params = params.len(), "delete");
        self.driver.execute_statement(&sql, &params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawQueryResult;
    use async_trait::async_trait;

    // Mock driver for testing
    struct MockDriver;

    #[async_trait]
    impl DatabaseDriver for MockDriver {
        async fn execute(&self, _sql: &str, _params: &[SqlValue]) -> Result<RawQueryResult> {
            Ok(RawQueryResult::empty())
        }
    }

    // Test table and columns
    struct Users;
    struct UsersColumns {
        pub id: UsersId,
        pub name: UsersName,
    }
    struct UsersId;
    struct UsersName;

    impl Table for Users {
        type Columns = UsersColumns;
        fn type_name() -> &'static str {
            "Users"
        }
        fn columns() -> Self::Columns {
            UsersColumns {
                id: UsersId,
                name: UsersName,
            }
        }
    }

    impl Column for UsersId {
        fn column_name(&self) -> &'static str {
            "id"
        }
        fn table_name(&self) -> &'static str {
            "users"
        }
    }

    impl Column for UsersName {
        fn column_name(&self) -> &'static str {
            "name"
        }
        fn table_name(&self) -> &'static str {
            "users"
        }
    }

    fn select() -> Select {
        Select::new(Arc::new(MockDriver))
    }

    #[test]
    fn test_build_simple_select() {
        let builder = select()
            .columns(&[&Users::columns().id, &Users::columns().name])
            .from(Users);

        let (sql, params) = builder.build_sql().unwrap();
        assert_eq!(sql, r#"SELECT "users"."id", "users"."name" FROM "users""#);
        assert!(params.is_empty());
    }

    #[test]
    fn test_build_select_all_from_table() {
        let (sql, _) = select().all().from_table("product").build_sql().unwrap();
        assert_eq!(sql, r#"SELECT * FROM "product""#);
    }

    #[test]
    fn test_build_select_with_where() {
        let builder = select()
            .columns(&[&Users::columns().id])
            .from(Users)
            .where_(WhereClause::eq(&Users::columns().name, "John"));

        let (sql, params) = builder.build_sql().unwrap();
        assert_eq!(
            sql,
            r#"SELECT "users"."id" FROM "users" WHERE "users"."name" = $1"#
        );
        assert_eq!(params.len(), 1);
        assert_eq!(params[0], SqlValue::Text("John".to_string()));
    }

    #[test]
    fn test_repeated_where_is_anded() {
        let builder = select()
            .all()
            .from(Users)
            .filter("name", &["John".into()])
            .filter("id != ?", &[7.into()]);

        let (sql, params) = builder.build_sql().unwrap();
        assert_eq!(sql, r#"SELECT * FROM "users" WHERE (name = $1) AND (id != $2)"#);
        assert_eq!(params, vec![SqlValue::from("John"), SqlValue::from(7)]);
    }

    #[test]
    fn test_build_select_with_order_and_limit() {
        let builder = select()
            .all()
            .from(Users)
            .where_(WhereClause::eq(&Users::columns().name, "John"))
            .order("name")
            .limit(10);

        let (sql, params) = builder.build_sql().unwrap();
        assert_eq!(
            sql,
            r#"SELECT * FROM "users" WHERE "users"."name" = $1 ORDER BY name LIMIT 10"#
        );
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_build_delete() {
        let builder = select()
            .all()
            .from(Users)
            .where_(WhereClause::eq(&Users::columns().id, 3))
            .limit(1);

        let (sql, params) = builder.build_delete_sql().unwrap();
        assert_eq!(sql, r#"DELETE FROM "users" WHERE "users"."id" = $1"#);
        assert_eq!(params, vec![SqlValue::Int32(3)]);
    }
}
