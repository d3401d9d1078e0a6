//! Repository implementations for XML key records
//!
//! - PostgreSQL repository for production use
//! - In-memory repository for tests and development
//! - Other backends can be added by implementing the `XmlRepository` trait

pub mod memory;
pub mod postgres;
mod sql;

pub use memory::InMemoryXmlRepository;
pub use postgres::PostgresXmlRepository;
pub use sql::FRIENDLY_NAME_MAX_CHARS;

use crate::error::{Error, Result};
use crate::xml::XmlDocument;

/// A key record together with the friendly name it is stored under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    /// Unique friendly name
    pub name: String,

    /// The record's XML document
    pub payload: XmlDocument,
}

impl StoredRecord {
    /// Re-validates a payload read back from storage
    pub(crate) fn from_row(name: String, xml: String) -> Result<Self> {
        match XmlDocument::parse(xml) {
            Ok(payload) => Ok(Self { name, payload }),
            Err(Error::InvalidXml(reason)) => Err(Error::DataIntegrity { name, reason }),
            Err(other) => Err(other),
        }
    }
}

/// Checks a friendly name before it is bound into a write
pub(crate) fn validate_friendly_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidArgument("friendly name must not be empty".into()));
    }

    // PostgreSQL text cannot hold NUL
    if name.contains('\0') {
        return Err(Error::InvalidArgument(
            "friendly name must not contain NUL characters".into(),
        ));
    }

    let length = name.chars().count();
    if length > FRIENDLY_NAME_MAX_CHARS {
        return Err(Error::InvalidArgument(format!(
            "friendly name is {} characters long, the limit is {}",
            length, FRIENDLY_NAME_MAX_CHARS
        )));
    }

    Ok(())
}
