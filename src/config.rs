//! Client configuration loaded from TOML with `PGTABLE_*` environment overrides.

use std::env;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{PgTableError, Result};
use crate::schema::{ColumnPolicy, DEFAULT_SCHEMA_CACHE_CAPACITY};

/// Client configuration, usually read from a TOML file.
///
/// ```toml
/// database_url = "postgres://app@localhost/shop"
/// column_policy = "strict"
/// schema_cache_capacity = 256
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default)]
    pub column_policy: ColumnPolicy,
    #[serde(default = "default_schema_cache_capacity")]
    pub schema_cache_capacity: u64,
}

fn default_database_url() -> String {
    "postgres://localhost/postgres".to_string()
}

fn default_schema_cache_capacity() -> u64 {
    DEFAULT_SCHEMA_CACHE_CAPACITY
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            column_policy: ColumnPolicy::default(),
            schema_cache_capacity: default_schema_cache_capacity(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file, then apply environment overrides.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| PgTableError::Config(format!("Failed to read config file: {}", e)))?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text. No environment overrides are applied.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| PgTableError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides:
    /// - PGTABLE_DATABASE_URL: Override database_url
    /// - PGTABLE_COLUMN_POLICY: Override column_policy (`lenient` or `strict`)
    /// - PGTABLE_SCHEMA_CACHE_CAPACITY: Override schema_cache_capacity
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(url) = env::var("PGTABLE_DATABASE_URL") {
            self.database_url = url;
        }

        if let Ok(policy) = env::var("PGTABLE_COLUMN_POLICY") {
            self.column_policy = policy.parse()?;
        }

        if let Ok(capacity) = env::var("PGTABLE_SCHEMA_CACHE_CAPACITY") {
            self.schema_cache_capacity = capacity.parse().map_err(|_| {
                PgTableError::Config(format!(
                    "PGTABLE_SCHEMA_CACHE_CAPACITY is not a number: {}",
                    capacity
                ))
            })?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.database_url.trim().is_empty() {
            return Err(PgTableError::Config("database_url is empty".to_string()));
        }
        if self.schema_cache_capacity == 0 {
            return Err(PgTableError::Config(
                "schema_cache_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = ClientConfig::from_toml_str(
            r#"
            database_url = "postgres://app@localhost/shop"
            column_policy = "strict"
            schema_cache_capacity = 16
            "#,
        )
        .unwrap();

        assert_eq!(config.database_url, "postgres://app@localhost/shop");
        assert_eq!(config.column_policy, ColumnPolicy::Strict);
        assert_eq!(config.schema_cache_capacity, 16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = ClientConfig::from_toml_str("").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.column_policy, ColumnPolicy::Lenient);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            ClientConfig::from_toml_str(r#"column_policy = "loose""#),
            Err(PgTableError::Config(_))
        ));

        let config = ClientConfig {
            schema_cache_capacity: 0,
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ClientConfig {
            database_url: "  ".to_string(),
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
