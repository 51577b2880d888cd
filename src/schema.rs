//! Column metadata for gateways.
//!
//! Column names are introspected once per gateway type and kept in a
//! [`SchemaCache`] keyed by the type itself. Entries are never refreshed
//! automatically; call [`SchemaCache::invalidate`] after a schema change.

use std::any::TypeId;
use std::collections::BTreeSet;
use std::sync::Arc;

use moka::sync::Cache;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{PgTableError, Result};
use crate::traits::{DatabaseDriver, Table};
use crate::types::{Field, Values};

/// Default number of gateway types the schema cache holds.
pub const DEFAULT_SCHEMA_CACHE_CAPACITY: u64 = 1024;

/// How writes treat columns the table does not have.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnPolicy {
    /// Drop unknown columns silently.
    #[default]
    Lenient,
    /// Reject the write with [`PgTableError::UnknownColumns`].
    Strict,
}

impl std::str::FromStr for ColumnPolicy {
    type Err = PgTableError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "lenient" => Ok(ColumnPolicy::Lenient),
            "strict" => Ok(ColumnPolicy::Strict),
            other => Err(PgTableError::Config(format!(
                "unknown column policy '{}'",
                other
            ))),
        }
    }
}

/// The column names of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSet {
    names: BTreeSet<String>,
}

impl ColumnSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, column: &str) -> bool {
        self.names.contains(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Keep only scalar entries whose key is a column of this table.
    ///
    /// Nested entries are always dropped. Unknown scalar keys are dropped
    /// under [`ColumnPolicy::Lenient`] and rejected under [`ColumnPolicy::Strict`].
    pub fn filter(&self, table: &str, values: Values, policy: ColumnPolicy) -> Result<Values> {
        let mut kept = Values::new();
        let mut unknown = Vec::new();

        for (column, field) in values.iter() {
            match field {
                Field::Nested(_) => debug!(table, column, "dropping nested value"),
                Field::Scalar(_) if !self.contains(column) => unknown.push(column.to_string()),
                Field::Scalar(_) => kept.insert_field(column, field.clone()),
            }
        }

        if !unknown.is_empty() {
            if policy == ColumnPolicy::Strict {
                return Err(PgTableError::UnknownColumns {
                    table: table.to_string(),
                    columns: unknown,
                });
            }
            warn!(table, columns = ?unknown, "dropping unknown columns");
        }

        Ok(kept)
    }
}

/// Load-or-compute registry of column sets, one entry per gateway type.
#[derive(Clone)]
pub struct SchemaCache {
    entries: Cache<TypeId, Arc<ColumnSet>>,
}

impl SchemaCache {
    pub fn new(capacity: u64) -> Self {
        Self {
            entries: Cache::builder().max_capacity(capacity).build(),
        }
    }

    /// Columns of `T`, introspected through `driver` on first use.
    ///
    /// Concurrent first loads may both introspect; the last insert wins.
    pub async fn columns<T: Table>(&self, driver: &dyn DatabaseDriver) -> Result<Arc<ColumnSet>> {
        let key = TypeId::of::<T>();
        if let Some(columns) = self.entries.get(&key) {
            debug!(gateway = T::type_name(), "schema cache hit");
            return Ok(columns);
        }

        let table = T::table_name();
        debug!(gateway = T::type_name(), table = %table, "schema cache miss, introspecting");
        let names = driver.describe(T::schema(), &table).await?;
        if names.is_empty() {
            return Err(PgTableError::TableNotFound(T::qualified_name()));
        }

        let columns = Arc::new(ColumnSet::new(names));
        self.entries.insert(key, Arc::clone(&columns));
        Ok(columns)
    }

    /// Whether columns for `T` are cached.
    pub fn contains<T: Table>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// Register columns for `T` without introspection.
    pub fn register<T: Table>(&self, columns: ColumnSet) {
        self.entries.insert(TypeId::of::<T>(), Arc::new(columns));
    }

    /// Drop the cached columns for `T`; the next gateway construction introspects again.
    pub fn invalidate<T: Table>(&self) {
        self.entries.invalidate(&TypeId::of::<T>());
    }

    pub fn invalidate_all(&self) {
        self.entries.invalidate_all();
    }
}

impl Default for SchemaCache {
    fn default() -> Self {
        Self::new(DEFAULT_SCHEMA_CACHE_CAPACITY)
    }
}
