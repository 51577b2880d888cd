use std::sync::Arc;

use crate::builders::{Insert, Select, Update};
use crate::traits::DatabaseDriver;

/// Query builder factory.
/// Created from a PgTableClient and used to build and execute queries.
#[derive(Clone)]
pub struct Querier {
    driver: Arc<dyn DatabaseDriver>,
}

impl Querier {
    pub(crate) fn new(driver: Arc<dyn DatabaseDriver>) -> Self {
        Self { driver }
    }

    /// Start building a SELECT query.
    pub fn select(&self) -> Select {
        Select::new(Arc::clone(&self.driver))
    }

    /// Start building an INSERT into `table`.
    pub fn insert_into(&self, table: impl Into<String>) -> Insert {
        Insert::new(Arc::clone(&self.driver), table)
    }

    /// Start building an UPDATE of `table`.
    pub fn update(&self, table: impl Into<String>) -> Update {
        Update::new(Arc::clone(&self.driver), table)
    }
}
