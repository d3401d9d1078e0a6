//! Configuration for the PostgreSQL key repository
//!
//! [`RepositoryConfig`] can be built in code or deserialized. Nothing is checked
//! until [`RepositoryConfig::validate`] runs.

use crate::error::{Error, Result};
use crate::identifier::{IdentifierKind, SqlIdentifier};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Schema used when none is configured
pub const DEFAULT_SCHEMA: &str = "DataProtection";
/// Table used when none is configured
pub const DEFAULT_TABLE: &str = "Keys";
/// Default upper bound on pooled connections
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
/// Default wait for a pooled connection before giving up
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for a PostgreSQL key repository
#[derive(Clone, Deserialize)]
pub struct RepositoryConfig {
    /// PostgreSQL connection string; may carry credentials and is never logged
    pub connection_string: String,

    /// Schema holding the key table
    #[serde(default = "default_schema")]
    pub schema: String,

    /// Table holding the key records
    #[serde(default = "default_table")]
    pub table: String,

    /// Upper bound on pooled connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long an operation waits for a pooled connection
    #[serde(
        rename = "acquire_timeout_ms",
        default = "default_acquire_timeout",
        deserialize_with = "deserialize_millis"
    )]
    pub acquire_timeout: Duration,
}

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

fn default_max_connections() -> u32 {
    DEFAULT_MAX_CONNECTIONS
}

fn default_acquire_timeout() -> Duration {
    DEFAULT_ACQUIRE_TIMEOUT
}

fn deserialize_millis<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_millis)
}

impl RepositoryConfig {
    /// Creates a configuration using the default schema and table names
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
            schema: default_schema(),
            table: default_table(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
        }
    }

    /// Sets the schema name
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    /// Sets the table name
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Sets the connection pool size
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Sets the pool acquire timeout
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Checks every value and returns the validated schema and table names.
    ///
    /// Nothing here touches the network.
    pub fn validate(&self) -> Result<(SqlIdentifier, SqlIdentifier)> {
        if self.connection_string.trim().is_empty() {
            return Err(Error::Config("connection string must not be blank".into()));
        }
        if self.schema.trim().is_empty() {
            return Err(Error::Config("schema name must not be blank".into()));
        }
        if self.table.trim().is_empty() {
            return Err(Error::Config("table name must not be blank".into()));
        }
        if self.max_connections == 0 {
            return Err(Error::Config("max_connections must be greater than zero".into()));
        }

        let schema = SqlIdentifier::new(IdentifierKind::Schema, &self.schema)?;
        let table = SqlIdentifier::new(IdentifierKind::Table, &self.table)?;

        Ok((schema, table))
    }
}

impl fmt::Debug for RepositoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryConfig")
            .field("connection_string", &"<redacted>")
            .field("schema", &self.schema)
            .field("table", &self.table)
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout", &self.acquire_timeout)
            .finish()
    }
}
