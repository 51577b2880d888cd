//! Table gateway: conventional CRUD over one table.
//!
//! A [`TableGateway<T>`] derives its table name from `T`, loads the table's
//! columns through the shared [`SchemaCache`], and filters write payloads
//! down to those columns before they reach the driver.

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use crate::builders::Selection;
use crate::clauses::WhereClause;
use crate::error::{PgTableError, Result};
use crate::querier::Querier;
use crate::schema::{ColumnPolicy, ColumnSet, SchemaCache};
use crate::traits::{ColumnRef, DatabaseDriver, Table};
use crate::types::{Field, RawQueryResult, Row, SqlValue, Values};

/// Gateway for the table declared by `T`.
///
/// Holds no per-row state; cloning is cheap.
pub struct TableGateway<T: Table> {
    driver: Arc<dyn DatabaseDriver>,
    columns: Arc<ColumnSet>,
    policy: ColumnPolicy,
    table_name: String,
    qualified_name: String,
    _table: PhantomData<fn() -> T>,
}

impl<T: Table> Clone for TableGateway<T> {
    fn clone(&self) -> Self {
        Self {
            driver: Arc::clone(&self.driver),
            columns: Arc::clone(&self.columns),
            policy: self.policy,
            table_name: self.table_name.clone(),
            qualified_name: self.qualified_name.clone(),
            _table: PhantomData,
        }
    }
}

impl<T: Table> TableGateway<T> {
    /// Build the gateway. Columns are introspected only if `cache` has no entry for `T`.
    pub async fn new(
        driver: Arc<dyn DatabaseDriver>,
        cache: &SchemaCache,
        policy: ColumnPolicy,
    ) -> Result<Self> {
        let columns = cache.columns::<T>(driver.as_ref()).await?;
        Ok(Self {
            driver,
            columns,
            policy,
            table_name: T::table_name(),
            qualified_name: T::qualified_name(),
            _table: PhantomData,
        })
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Table name quoted for use in SQL text.
    pub fn delimited_table_name(&self) -> String {
        self.driver.quote_identifier(&self.qualified_name)
    }

    /// The primary key column.
    pub fn primary(&self) -> &'static str {
        T::primary_key()
    }

    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    fn querier(&self) -> Querier {
        Querier::new(Arc::clone(&self.driver))
    }

    fn primary_column(&self) -> ColumnRef {
        ColumnRef::new(self.table_name.as_str(), T::primary_key())
    }

    fn row_not_found(&self, key: &SqlValue) -> PgTableError {
        PgTableError::RowNotFound {
            table: self.table_name.clone(),
            key: key.to_string(),
        }
    }

    /// Every row of the table.
    pub fn find_all(&self) -> Selection {
        self.querier()
            .select()
            .all()
            .from_table(self.qualified_name.as_str())
    }

    /// Rows matching a raw condition, e.g. `("email", &[email])` or `("price > ?", &[10.into()])`.
    pub fn find_all_by(&self, condition: &str, params: &[SqlValue]) -> Selection {
        self.find_all().filter(condition, params)
    }

    /// Selection of the row with primary key `id`.
    pub fn find(&self, id: impl Into<SqlValue>) -> Selection {
        self.find_all()
            .where_(WhereClause::Eq(self.primary_column(), id.into()))
    }

    /// First row matching a raw condition.
    pub async fn find_by(&self, condition: &str, params: &[SqlValue]) -> Result<Option<Row>> {
        self.find_all_by(condition, params).fetch().await
    }

    /// Row with primary key `id`.
    pub async fn get(&self, id: impl Into<SqlValue>) -> Result<Option<Row>> {
        self.find(id).fetch().await
    }

    /// First row whose `column` equals `value`.
    pub async fn get_by(&self, column: &str, value: impl Into<SqlValue>) -> Result<Option<Row>> {
        self.find_all_by(column, &[value.into()]).fetch().await
    }

    /// Reduce a payload to scalar values for columns this table has.
    pub fn filter_columns(&self, values: Values) -> Result<Values> {
        self.columns.filter(&self.table_name, values, self.policy)
    }

    /// Insert a row and return it as stored.
    ///
    /// An empty primary key is left out so the database assigns one.
    pub async fn insert(&self, data: impl Into<Values>) -> Result<Row> {
        let mut data = self.filter_columns(data.into())?;
        if data.is_empty_at(T::primary_key()) {
            data.remove(T::primary_key());
        }

        debug!(table = %self.table_name, columns = data.len(), "insert");
        self.querier()
            .insert_into(self.qualified_name.as_str())
            .values(data)
            .execute()
            .await
    }

    /// Update the row identified by the payload's primary key and return it.
    pub async fn update(&self, data: impl Into<Values>) -> Result<Row> {
        let mut data = self.filter_columns(data.into())?;
        let key = match data.remove(T::primary_key()) {
            Some(Field::Scalar(key)) if !key.is_empty() => key,
            _ => {
                return Err(PgTableError::MissingPrimaryKey {
                    table: self.table_name.clone(),
                    column: T::primary_key().to_string(),
                })
            }
        };

        if data.is_empty() {
            return self
                .get(key.clone())
                .await?
                .ok_or_else(|| self.row_not_found(&key));
        }

        debug!(table = %self.table_name, key = %key, columns = data.len(), "update");
        self.querier()
            .update(self.qualified_name.as_str())
            .set(data)
            .where_(WhereClause::Eq(self.primary_column(), key.clone()))
            .execute()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| self.row_not_found(&key))
    }

    /// Insert when the primary key is absent or empty, update otherwise.
    pub async fn save(&self, values: impl Into<Values>) -> Result<Row> {
        let values = values.into();
        if values.is_empty_at(T::primary_key()) {
            self.insert(values).await
        } else {
            self.update(values).await
        }
    }

    /// Delete the row with primary key `id`; returns the number of rows removed.
    pub async fn delete(&self, id: impl Into<SqlValue>) -> Result<u64> {
        self.find(id).delete().await
    }

    /// Whether another row has `column = value`.
    ///
    /// The row with primary key `exclude_id` is ignored; `None` or an empty
    /// id behaves like `0`.
    pub async fn row_exists(
        &self,
        column: &str,
        value: impl Into<SqlValue>,
        exclude_id: Option<SqlValue>,
    ) -> Result<bool> {
        let exclude = exclude_id
            .filter(|id| !id.is_empty())
            .unwrap_or(SqlValue::Int32(0));

        let row = self
            .find_all_by(column, &[value.into()])
            .where_(WhereClause::Ne(self.primary_column(), exclude))
            .fetch()
            .await?;
        Ok(row.is_some())
    }

    /// Whether a row has `column = value` while `column` differs from `except`.
    pub async fn row_exists_except(
        &self,
        column: &str,
        value: impl Into<SqlValue>,
        except: impl Into<SqlValue>,
    ) -> Result<bool> {
        let row = self
            .find_all_by(column, &[value.into()])
            .filter(&format!("{} != ?", column), &[except.into()])
            .fetch()
            .await?;
        Ok(row.is_some())
    }

    /// `(primary key, label)` pairs of every row, ordered by label.
    /// A NULL label is `None`.
    pub async fn pairs(&self) -> Result<Vec<(String, Option<String>)>> {
        self.find_all()
            .order(self.driver.quote_identifier(T::label_column()))
            .fetch_pairs(T::primary_key(), T::label_column())
            .await
    }

    /// Remove every row of the table.
    pub async fn truncate(&self) -> Result<()> {
        let sql = format!("TRUNCATE {}", self.delimited_table_name());
        debug!(sql = %sql, "truncate");
        self.driver.execute_statement(&sql, &[]).await?;
        Ok(())
    }

    /// Run raw SQL with `$n` placeholders.
    pub async fn query<I, V>(&self, sql: &str, params: I) -> Result<RawQueryResult>
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        let params: Vec<SqlValue> = params.into_iter().map(Into::into).collect();
        self.query_args(sql, &params).await
    }

    /// Run raw SQL with an already collected parameter list.
    pub async fn query_args(&self, sql: &str, params: &[SqlValue]) -> Result<RawQueryResult> {
        self.driver.execute(sql, params).await
    }
}
