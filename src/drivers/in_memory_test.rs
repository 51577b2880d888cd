use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{PgTableError, Result};
use crate::traits::DatabaseDriver;
use crate::types::{RawQueryResult, SqlValue};

/// A recorded query execution for verification.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedQuery {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// An in-memory database driver for testing.
///
/// Replays scripted responses in FIFO order and records every query.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use pgtable::drivers::{InMemoryTestDriver, InMemoryTestResponseBuilder};
///
/// let driver = Arc::new(
///     InMemoryTestDriver::new()
///         .with_response(InMemoryTestResponseBuilder::describe(&["id", "name"]))
///         .with_response(
///             InMemoryTestResponseBuilder::new()
///                 .columns(&["id", "name"])
///                 .row(&["1", "Widget"])
///                 .build(),
///         ),
/// );
/// ```
pub struct InMemoryTestDriver {
    responses: Mutex<VecDeque<std::result::Result<RawQueryResult, String>>>,
    recorded_queries: Mutex<Vec<RecordedQuery>>,
    default_response: RawQueryResult,
}

impl InMemoryTestDriver {
    /// Create a new in-memory test driver with no pre-configured responses.
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            recorded_queries: Mutex::new(Vec::new()),
            default_response: RawQueryResult::empty(),
        }
    }

    /// Add a response to be returned by the next query.
    /// Responses are returned in FIFO order.
    pub fn with_response(self, response: RawQueryResult) -> Self {
        self.responses.lock().unwrap().push_back(Ok(response));
        self
    }

    /// Add multiple responses to be returned by subsequent queries.
    pub fn with_responses(self, responses: impl IntoIterator<Item = RawQueryResult>) -> Self {
        let mut queue = self.responses.lock().unwrap();
        for response in responses {
            queue.push_back(Ok(response));
        }
        drop(queue);
        self
    }

    /// Make the next query fail with `QueryFailed(message)`.
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.responses.lock().unwrap().push_back(Err(message.into()));
        self
    }

    /// Set a default response to use when no queued responses remain.
    pub fn with_default_response(mut self, response: RawQueryResult) -> Self {
        self.default_response = response;
        self
    }

    /// Get all recorded queries that have been executed.
    pub fn recorded_queries(&self) -> Vec<RecordedQuery> {
        self.recorded_queries.lock().unwrap().clone()
    }

    /// Get the last recorded query, if any.
    pub fn last_query(&self) -> Option<RecordedQuery> {
        self.recorded_queries.lock().unwrap().last().cloned()
    }

    /// Number of recorded queries whose SQL starts with `prefix`.
    pub fn count_queries_starting_with(&self, prefix: &str) -> usize {
        self.recorded_queries
            .lock()
            .unwrap()
            .iter()
            .filter(|q| q.sql.starts_with(prefix))
            .count()
    }

    /// Clear all recorded queries.
    pub fn clear_recorded_queries(&self) {
        self.recorded_queries.lock().unwrap().clear();
    }

    /// Assert that the last query matches the expected SQL and parameters.
    pub fn assert_last_query(&self, expected_sql: &str, expected_params: &[SqlValue]) {
        let last = self.last_query().expect("No queries were recorded");
        assert_eq!(
            last.sql, expected_sql,
            "SQL mismatch.\nExpected: {}\nActual: {}",
            expected_sql, last.sql
        );
        assert_eq!(
            last.params, expected_params,
            "Parameters mismatch.\nExpected: {:?}\nActual: {:?}",
            expected_params, last.params
        );
    }

    /// Assert that exactly n queries were executed.
    pub fn assert_query_count(&self, expected: usize) {
        let actual = self.recorded_queries.lock().unwrap().len();
        assert_eq!(
            actual, expected,
            "Query count mismatch. Expected: {}, Actual: {}",
            expected, actual
        );
    }
}

impl Default for InMemoryTestDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseDriver for InMemoryTestDriver {
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<RawQueryResult> {
        self.recorded_queries.lock().unwrap().push(RecordedQuery {
            sql: sql.to_string(),
            params: params.to_vec(),
        });

        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(self.default_response.clone()));

        response.map_err(PgTableError::QueryFailed)
    }
}

/// Builder for creating test responses easily.
pub struct InMemoryTestResponseBuilder {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl InMemoryTestResponseBuilder {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// A schema introspection response listing the given column names.
    pub fn describe(columns: &[&str]) -> RawQueryResult {
        columns
            .iter()
            .fold(Self::new().columns(&["column_name"]), |b, c| b.row(&[*c]))
            .build()
    }

    /// Set the column names for the response.
    pub fn columns(mut self, cols: &[&str]) -> Self {
        self.columns = cols.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Add a row of string values.
    pub fn row(mut self, values: &[&str]) -> Self {
        self.rows.push(values.iter().map(|s| Some(s.to_string())).collect());
        self
    }

    /// Add a row where `None` stands for SQL NULL.
    pub fn row_with_nulls(mut self, values: &[Option<&str>]) -> Self {
        self.rows.push(values.iter().map(|v| v.map(str::to_string)).collect());
        self
    }

    /// Build the RawQueryResult.
    pub fn build(self) -> RawQueryResult {
        RawQueryResult::new(self.columns, self.rows)
    }
}

impl Default for InMemoryTestResponseBuilder {
    fn default() -> Self {
        Self::new()
    }
}
