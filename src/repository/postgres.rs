//! PostgreSQL key repository
//!
//! Stores each key record as one row of a two-column table:
//!
//! ```sql
//! CREATE TABLE "<schema>"."<table>" (
//!     "FriendlyName" VARCHAR(449) NOT NULL,
//!     "XmlData" TEXT NOT NULL,
//!     PRIMARY KEY ("FriendlyName")
//! )
//! ```
//!
//! The schema and table are created on construction if they are missing.
//! Provisioning and upserts run in SERIALIZABLE transactions; an upsert is a
//! single `INSERT .. ON CONFLICT DO UPDATE`, so writers of different names do
//! not conflict. Listing is a single statement. Every operation takes its own
//! pooled connection, which goes back to the pool (rolling back any open
//! transaction) on every exit path.

use super::sql::{
    Statements, FRIENDLY_NAME_MAX_CHARS, SCHEMA_EXISTS_QUERY, SET_SERIALIZABLE,
    TABLE_EXISTS_QUERY,
};
use super::{validate_friendly_name, StoredRecord};
use crate::config::RepositoryConfig;
use crate::error::{Error, Result};
use crate::identifier::{IdentifierKind, SqlIdentifier};
use crate::xml::XmlDocument;
use crate::XmlRepository;

use async_trait::async_trait;
use log::{debug, info, warn};
use metrics::{counter, histogram};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

/// PostgreSQL-backed [`XmlRepository`]
#[derive(Clone)]
pub struct PostgresXmlRepository {
    /// Connection pool; connections are opened on demand
    pool: PgPool,

    schema: SqlIdentifier,
    table: SqlIdentifier,

    /// Statement text for `schema`.`table`
    statements: Statements,
}

impl PostgresXmlRepository {
    /// Validates `config`, connects and provisions the schema and table.
    ///
    /// Configuration errors are reported before any connection is opened.
    pub async fn connect(config: &RepositoryConfig) -> Result<Self> {
        let (schema, table) = config.validate()?;

        let options = PgConnectOptions::from_str(&config.connection_string)
            .map_err(|e| Error::Config(format!("Invalid connection string: {}", e)))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_lazy_with(options);

        Self::provisioned(pool, schema, table).await
    }

    /// Creates a repository over an existing pool and provisions the schema and table
    pub async fn with_pool(pool: PgPool, schema: &str, table: &str) -> Result<Self> {
        let schema = SqlIdentifier::new(IdentifierKind::Schema, schema)?;
        let table = SqlIdentifier::new(IdentifierKind::Table, table)?;

        Self::provisioned(pool, schema, table).await
    }

    async fn provisioned(pool: PgPool, schema: SqlIdentifier, table: SqlIdentifier) -> Result<Self> {
        let repository = Self {
            statements: Statements::new(&schema, &table),
            pool,
            schema,
            table,
        };

        repository.ensure_storage_ready().await?;

        Ok(repository)
    }

    /// Creates the schema and table if they do not exist.
    ///
    /// Runs in a single SERIALIZABLE transaction. Safe to call repeatedly; a
    /// concurrent provisioning race may surface as [`Error::Provisioning`].
    pub async fn ensure_storage_ready(&self) -> Result<()> {
        let start = Instant::now();

        let result = self
            .provision()
            .await
            .map_err(|source| Error::Provisioning {
                schema: self.schema.to_string(),
                table: self.table.to_string(),
                source,
            });

        histogram!("keystore.sql.provision", start.elapsed());

        result
    }

    async fn provision(&self) -> std::result::Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(SET_SERIALIZABLE).execute(&mut *tx).await?;

        let schema_exists = sqlx::query_scalar::<_, bool>(SCHEMA_EXISTS_QUERY)
            .bind(self.schema.as_str())
            .fetch_one(&mut *tx)
            .await?;

        if schema_exists {
            debug!("Schema {} already exists", self.schema);
        } else {
            sqlx::query(&self.statements.create_schema)
                .execute(&mut *tx)
                .await?;
            info!("Created schema {}", self.schema);
        }

        let table_exists = sqlx::query_scalar::<_, bool>(TABLE_EXISTS_QUERY)
            .bind(self.schema.as_str())
            .bind(self.table.as_str())
            .fetch_one(&mut *tx)
            .await?;

        if table_exists {
            debug!("Table {} already exists", self.statements.qualified_table);
        } else {
            sqlx::query(&self.statements.create_table)
                .execute(&mut *tx)
                .await?;
            info!("Created table {}", self.statements.qualified_table);
        }

        tx.commit().await
    }

    /// Returns every stored record together with its friendly name.
    ///
    /// Fails with [`Error::DataIntegrity`] on the first payload that is not
    /// well-formed XML; nothing is skipped.
    pub async fn list_stored_records(&self) -> Result<Vec<StoredRecord>> {
        let start = Instant::now();

        let rows = sqlx::query_as::<_, (String, String)>(&self.statements.select_all)
            .fetch_all(&self.pool)
            .await
            .map_err(|source| Error::Storage {
                operation: format!("listing of {}", self.statements.qualified_table),
                source,
            });

        histogram!("keystore.sql.list", start.elapsed());

        let records = rows?
            .into_iter()
            .map(|(name, xml)| StoredRecord::from_row(name, xml))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "Loaded {} records from {}",
            records.len(),
            self.statements.qualified_table
        );

        Ok(records)
    }

    async fn upsert(&self, name: &str, payload: &XmlDocument) -> std::result::Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(SET_SERIALIZABLE).execute(&mut *tx).await?;

        let inserted = sqlx::query_scalar::<_, bool>(&self.statements.upsert_record)
            .bind(name)
            .bind(payload.as_str())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(!inserted)
    }

    /// Configured schema name
    pub fn schema(&self) -> &str {
        self.schema.as_str()
    }

    /// Configured table name
    pub fn table(&self) -> &str {
        self.table.as_str()
    }

    /// Quoted `"schema"."table"` as used in statements
    pub fn qualified_table(&self) -> &str {
        &self.statements.qualified_table
    }

    /// Closes the pool, waiting for checked-out connections to be returned
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl XmlRepository for PostgresXmlRepository {
    async fn list_records(&self) -> Result<Vec<XmlDocument>> {
        let records = self.list_stored_records().await?;
        Ok(records.into_iter().map(|record| record.payload).collect())
    }

    async fn upsert_record(&self, name: &str, payload: &XmlDocument) -> Result<()> {
        validate_friendly_name(name)?;

        let start = Instant::now();
        let result = self.upsert(name, payload).await;
        histogram!("keystore.sql.upsert", start.elapsed());

        match result {
            Ok(true) => {
                counter!("keystore.sql.upsert.updated", 1);
                debug!("Replaced record '{}' in {}", name, self.statements.qualified_table);
                Ok(())
            }
            Ok(false) => {
                counter!("keystore.sql.upsert.inserted", 1);
                debug!("Inserted record '{}' into {}", name, self.statements.qualified_table);
                Ok(())
            }
            Err(source) => {
                let err = Error::from_write(format!("upsert of '{}'", name), source);
                if err.is_transient() {
                    counter!("keystore.sql.upsert.contention", 1);
                    warn!("Concurrent write conflict storing record '{}': {}", name, err);
                }
                Err(err)
            }
        }
    }
}

impl fmt::Debug for PostgresXmlRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresXmlRepository")
            .field("table", &self.statements.qualified_table)
            .field("max_name_chars", &FRIENDLY_NAME_MAX_CHARS)
            .field("pool_size", &self.pool.size())
            .finish()
    }
}
