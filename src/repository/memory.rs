use super::{validate_friendly_name, StoredRecord};
use crate::error::Result;
use crate::xml::XmlDocument;
use crate::XmlRepository;

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

/// An in-memory implementation of the XmlRepository trait
///
/// Useful for testing code that consumes key records. Records are lost when
/// the process terminates.
#[derive(Debug, Clone, Default)]
pub struct InMemoryXmlRepository {
    /// Friendly name -> payload
    records: Arc<RwLock<BTreeMap<String, XmlDocument>>>,
}

impl InMemoryXmlRepository {
    /// Creates an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every record with its friendly name, ordered by name
    pub fn list_stored_records(&self) -> Vec<StoredRecord> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records
            .iter()
            .map(|(name, payload)| StoredRecord {
                name: name.clone(),
                payload: payload.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl XmlRepository for InMemoryXmlRepository {
    async fn list_records(&self) -> Result<Vec<XmlDocument>> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        Ok(records.values().cloned().collect())
    }

    async fn upsert_record(&self, name: &str, payload: &XmlDocument) -> Result<()> {
        validate_friendly_name(name)?;

        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records.insert(name.to_string(), payload.clone());

        Ok(())
    }
}
