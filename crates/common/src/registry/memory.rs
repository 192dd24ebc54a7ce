use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::entry::{PointerRecord, SignedEntry};
use super::provider::{RegistryError, RegistryProvider};
use crate::locator::EntryId;

/// In-memory registry provider using HashMaps
#[derive(Debug, Clone)]
pub struct MemoryRegistryProvider {
    inner: Arc<RwLock<MemoryRegistryProviderInner>>,
}

#[derive(Debug, Default)]
struct MemoryRegistryProviderInner {
    /// Current entry per id
    entries: HashMap<EntryId, SignedEntry>,
    /// Every accepted write per id, in acceptance order
    history: HashMap<EntryId, Vec<PointerRecord>>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryRegistryProviderError {
    #[error("memory provider error: {0}")]
    Internal(String),
}

impl MemoryRegistryProvider {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryRegistryProviderInner::default())),
        }
    }

    /// All records accepted for an entry id, oldest first
    pub fn history(
        &self,
        entry_id: &EntryId,
    ) -> Result<Vec<PointerRecord>, MemoryRegistryProviderError> {
        let inner = self.inner.read().map_err(|e| {
            MemoryRegistryProviderError::Internal(format!("failed to acquire read lock: {}", e))
        })?;
        Ok(inner.history.get(entry_id).cloned().unwrap_or_default())
    }
}

impl Default for MemoryRegistryProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RegistryProvider for MemoryRegistryProvider {
    type Error = MemoryRegistryProviderError;

    async fn get(
        &self,
        entry_id: &EntryId,
    ) -> Result<Option<SignedEntry>, RegistryError<Self::Error>> {
        let inner = self.inner.read().map_err(|e| {
            RegistryError::Provider(MemoryRegistryProviderError::Internal(format!(
                "failed to acquire read lock: {}",
                e
            )))
        })?;

        Ok(inner.entries.get(entry_id).cloned())
    }

    async fn set(&self, entry: SignedEntry) -> Result<(), RegistryError<Self::Error>> {
        let entry_id = entry.entry_id();
        if entry.verify().is_err() {
            return Err(RegistryError::InvalidSignature(entry_id));
        }

        let mut inner = self.inner.write().map_err(|e| {
            RegistryError::Provider(MemoryRegistryProviderError::Internal(format!(
                "failed to acquire write lock: {}",
                e
            )))
        })?;

        // Check and replace under the same lock
        if let Some(stored) = inner.entries.get(&entry_id) {
            if entry.revision() <= stored.revision() {
                return Err(RegistryError::RevisionConflict(
                    entry_id,
                    stored.revision(),
                    entry.revision(),
                ));
            }
        }

        inner
            .history
            .entry(entry_id)
            .or_default()
            .push(entry.record().clone());
        inner.entries.insert(entry_id, entry);

        Ok(())
    }
}
