//! # Key Store SQL
//!
//! PostgreSQL persistence for XML-encoded key records.
//!
//! `keystore-sql` stores named, opaque XML documents on behalf of a
//! key-management engine that generates, encrypts and rotates keys elsewhere.
//! The repository only ensures its schema and table exist, hands back every
//! stored document, and atomically inserts or replaces a single named
//! document. It never interprets the XML beyond checking that it is
//! well-formed.
//!
//! Schema and table names are interpolated into SQL text and are therefore
//! validated before anything else happens; record names and payloads are
//! always bound as parameters.
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use keystore_sql::{PostgresXmlRepository, RepositoryConfig, XmlDocument, XmlRepository};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RepositoryConfig::new("postgres://app@localhost/app")
//!     .with_schema("DataProtection")
//!     .with_table("Keys");
//!
//! // Validates the names and creates the schema and table if needed
//! let repository = PostgresXmlRepository::connect(&config).await?;
//!
//! let key = XmlDocument::parse(r#"<key id="0f8b7c1e" version="1"><creationDate>2024-01-01T00:00:00Z</creationDate></key>"#)?;
//! repository.upsert_record("key-0f8b7c1e", &key).await?;
//!
//! for document in repository.list_records().await? {
//!     println!("{}", document);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Retrying contention
//!
//! Upserts for the same name from concurrent writers can lose a
//! serialization race. Those failures come back as [`Error::Transient`] and
//! are safe to retry; the repository itself never retries.
//!
//! ```rust,no_run
//! use keystore_sql::{Error, XmlDocument, XmlRepository};
//!
//! # async fn store(repository: &dyn XmlRepository, key: &XmlDocument) -> keystore_sql::Result<()> {
//! loop {
//!     match repository.upsert_record("key-0f8b7c1e", key).await {
//!         Err(err) if err.is_transient() => continue,
//!         other => return other,
//!     }
//! }
//! # }
//! ```

pub mod config;
pub mod error;
pub mod identifier;
pub mod repository;
pub mod xml;

// Re-export key types
pub use crate::config::RepositoryConfig;
pub use crate::error::{Error, Result};
pub use crate::identifier::{validate_identifier, IdentifierKind, SqlIdentifier};
pub use crate::repository::{InMemoryXmlRepository, PostgresXmlRepository, StoredRecord};
pub use crate::xml::XmlDocument;

use async_trait::async_trait;
use std::fmt;

/// Storage interface for XML key records
///
/// Implementations hold no state beyond their configuration and may be
/// called concurrently from any number of tasks.
#[async_trait]
pub trait XmlRepository: Send + Sync + fmt::Debug {
    /// Returns every stored document, in no particular order.
    ///
    /// Fails as a whole if any stored document is not well-formed XML.
    async fn list_records(&self) -> Result<Vec<XmlDocument>>;

    /// Inserts `payload` under `name`, replacing any document already stored
    /// under that name.
    async fn upsert_record(&self, name: &str, payload: &XmlDocument) -> Result<()>;
}
