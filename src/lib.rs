//! pgtable - Table gateways over a driver-agnostic PostgreSQL query builder
//!
//! # Example
//! ```ignore
//! use pgtable::{PgTableClient, Values};
//!
//! pgtable::table!(pub struct UserLoginLog);
//!
//! let client = PgTableClient::connect("postgres://localhost/mydb").await?;
//!
//! // Columns of `user_login_log` are introspected once and cached
//! let logs = client.gateway::<UserLoginLog>().await?;
//!
//! let row = logs
//!     .insert(Values::new().set("user_id", 7).set("ip", "10.0.0.1"))
//!     .await?;
//! let recent = logs
//!     .find_all_by("user_id", &[7.into()])
//!     .order("created_at DESC")
//!     .limit(10)
//!     .fetch_all()
//!     .await?;
//! ```

pub mod builders;
pub mod clauses;
pub mod config;
pub mod drivers;
pub mod error;
pub mod gateway;
pub mod naming;
pub mod querier;
pub mod schema;
pub mod traits;
pub mod types;

mod client;

// Re-export main types for convenient access
pub use builders::Selection;
pub use clauses::WhereClause;
pub use client::PgTableClient;
pub use config::ClientConfig;
pub use error::{PgTableError, Result};
pub use gateway::TableGateway;
pub use querier::Querier;
pub use schema::{ColumnPolicy, ColumnSet, SchemaCache};
pub use traits::{Column, ColumnRef, DatabaseDriver, Table};
pub use types::{Field, QueryResult, RawQueryResult, Row, SqlValue, Values};
