use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::error::{call, CallError, Phase, PersistError, Slot};
use super::retry::RetryPolicy;
use crate::crypto::{derive_registry_keys, Seed};
use crate::document;
use crate::locator::{DirectLocator, EntryId, Locator, ResolvableLocator};
use crate::portal::BlobStoreClient;
use crate::registry::{RegistryClient, RegistryError, RegistryProvider};

/// Default deadline for each individual network call
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// What the registry currently holds for a slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotState {
    pub revision: u64,
    pub locator: DirectLocator,
}

/// Saves and loads documents through a blob store and a registry
///
/// A save uploads the encoded document as an immutable blob, then points the
///  slot's registry entry at it with the next revision. A load never reads the
///  registry itself: it downloads the slot's resolvable locator and lets the
///  network resolve it to the latest blob.
///
/// All state is explicit; clones share the underlying clients.
#[derive(Debug, Clone)]
pub struct Persister<B, R> {
    seed: Seed,
    blobs: B,
    registry: RegistryClient<R>,
    retry: RetryPolicy,
    request_timeout: Duration,
}

impl<B, R> Persister<B, R>
where
    B: BlobStoreClient,
    R: RegistryProvider,
{
    pub fn new(seed: Seed, blobs: B, registry: R) -> Self {
        Self {
            seed,
            blobs,
            registry: RegistryClient::new(registry),
            retry: RetryPolicy::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Build a persister from raw root secret bytes
    ///
    /// # Errors
    ///
    /// Returns [`PersistError::InvalidSecret`] if the bytes are not a valid seed.
    pub fn from_seed_bytes(seed: &[u8], blobs: B, registry: R) -> Result<Self, PersistError> {
        Ok(Self::new(Seed::from_slice(seed)?, blobs, registry))
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn blobs(&self) -> &B {
        &self.blobs
    }

    pub fn registry(&self) -> &RegistryClient<R> {
        &self.registry
    }

    /// The locator a slot's document is always reachable at. Pure; no I/O.
    pub fn resolvable_locator(&self, key_pair_tag: &str, data_key_tag: &str) -> ResolvableLocator {
        let (key_pair, data_key) = derive_registry_keys(&self.seed, key_pair_tag, data_key_tag);
        ResolvableLocator::new(EntryId::derive(key_pair.public_key(), &data_key))
    }

    /// Persist `document` under the slot named by the two tags
    ///
    /// Revision conflicts from concurrent writers are retried per the
    ///  persister's [`RetryPolicy`], re-reading the registry each time.
    ///  Any other failure is returned immediately. A blob uploaded by a
    ///  failed save is left unreferenced.
    #[instrument(skip(self, document))]
    pub async fn save<D: Serialize>(
        &self,
        document: &D,
        key_pair_tag: &str,
        data_key_tag: &str,
    ) -> Result<ResolvableLocator, PersistError> {
        let slot = Slot::new(key_pair_tag, data_key_tag);

        let payload = document::encode(document).map_err(|source| {
            PersistError::Serialization {
                slot: slot.clone(),
                source,
            }
        })?;

        let name = Uuid::new_v4().to_string();
        let direct = call(self.request_timeout, self.blobs.upload(payload, &name))
            .await
            .map_err(|e| PersistError::upload(&slot, e))?;
        debug!(%direct, "document uploaded");

        let (key_pair, data_key) = derive_registry_keys(&self.seed, key_pair_tag, data_key_tag);
        let entry_data = direct.to_bytes().to_vec();
        let max_attempts = self.retry.max_attempts();

        let mut attempt = 0;
        loop {
            attempt += 1;

            let current = call(
                self.request_timeout,
                self.registry.read(key_pair.public_key(), &data_key),
            )
            .await
            .map_err(|e| PersistError::registry(&slot, Phase::ReadRevision, e))?;

            let revision = match current {
                Some(record) => record
                    .revision
                    .checked_add(1)
                    .ok_or_else(|| PersistError::RevisionExhausted { slot: slot.clone() })?,
                None => 0,
            };

            let written = call(
                self.request_timeout,
                self.registry
                    .write(&key_pair, &data_key, entry_data.clone(), revision),
            )
            .await;

            match written {
                Ok(entry_id) => {
                    let locator = ResolvableLocator::new(entry_id);
                    info!(revision, attempt, %locator, "document saved");
                    return Ok(locator);
                }
                Err(CallError::Failed(RegistryError::RevisionConflict(_, stored, attempted))) => {
                    if attempt >= max_attempts {
                        warn!(attempt, stored, attempted, "giving up on revision conflicts");
                        return Err(PersistError::ConcurrentModification {
                            slot,
                            attempts: attempt,
                        });
                    }
                    let delay = self.retry.backoff_for(attempt);
                    warn!(
                        attempt,
                        stored,
                        attempted,
                        ?delay,
                        "revision conflict, re-reading registry"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(PersistError::registry(&slot, Phase::WriteEntry, e)),
            }
        }
    }

    /// Fetch the latest document saved under the slot named by the two tags
    ///
    /// Returns [`PersistError::NotFound`] if nothing was ever saved there,
    ///  and [`PersistError::Deserialization`] if the stored bytes do not
    ///  decode as `D`.
    #[instrument(skip(self))]
    pub async fn load<D: DeserializeOwned>(
        &self,
        key_pair_tag: &str,
        data_key_tag: &str,
    ) -> Result<D, PersistError> {
        let slot = Slot::new(key_pair_tag, data_key_tag);
        let locator = Locator::from(self.resolvable_locator(key_pair_tag, data_key_tag));
        debug!(%locator, "downloading through resolvable locator");

        let bytes = call(self.request_timeout, self.blobs.download(&locator))
            .await
            .map_err(|e| PersistError::download(&slot, e))?;

        let document = document::decode(&bytes)
            .map_err(|source| PersistError::Deserialization { slot, source })?;
        info!(size = bytes.len(), "document loaded");
        Ok(document)
    }

    /// Read the registry entry for a slot directly
    ///
    /// Diagnostic only; `load` never depends on it.
    pub async fn inspect(
        &self,
        key_pair_tag: &str,
        data_key_tag: &str,
    ) -> Result<Option<SlotState>, PersistError> {
        let slot = Slot::new(key_pair_tag, data_key_tag);
        let (key_pair, data_key) = derive_registry_keys(&self.seed, key_pair_tag, data_key_tag);

        let record = call(
            self.request_timeout,
            self.registry.read(key_pair.public_key(), &data_key),
        )
        .await
        .map_err(|e| PersistError::registry(&slot, Phase::ReadRevision, e))?;

        let Some(record) = record else {
            return Ok(None);
        };
        let locator = DirectLocator::from_bytes(&record.entry_data)
            .map_err(|source| PersistError::MalformedLocator { slot, source })?;

        Ok(Some(SlotState {
            revision: record.revision,
            locator,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::TaskList;
    use crate::portal::{BlobsStore, Portal};
    use crate::registry::MemoryRegistryProvider;

    type TestPersister = Persister<Portal<MemoryRegistryProvider>, MemoryRegistryProvider>;

    async fn persister(seed: [u8; 16]) -> TestPersister {
        let registry = MemoryRegistryProvider::new();
        let portal = Portal::new(BlobsStore::memory().await.unwrap(), registry.clone());
        Persister::new(Seed::from(seed), portal, registry)
    }

    #[tokio::test]
    async fn test_resolvable_locator_is_derived() {
        let persister = persister([1u8; 16]).await;
        let (key_pair, data_key) = derive_registry_keys(&Seed::from([1u8; 16]), "a", "b");

        let locator = persister.resolvable_locator("a", "b");
        assert_eq!(
            *locator.entry_id(),
            EntryId::derive(key_pair.public_key(), &data_key)
        );
        assert_eq!(locator, persister.resolvable_locator("a", "b"));
        assert_ne!(locator, persister.resolvable_locator("b", "a"));
    }

    #[tokio::test]
    async fn test_save_returns_slot_locator() {
        let persister = persister([2u8; 16]).await;

        let saved = persister.save(&TaskList::default(), "a", "b").await.unwrap();
        assert_eq!(saved, persister.resolvable_locator("a", "b"));

        let state = persister.inspect("a", "b").await.unwrap().unwrap();
        assert_eq!(state.revision, 0);
        assert_eq!(
            persister.registry().provider().history(saved.entry_id()).unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_clones_share_backends() {
        let persister = persister([3u8; 16]).await;
        let clone = persister.clone().with_retry_policy(RetryPolicy::immediate(1));

        clone.save(&TaskList::default(), "a", "b").await.unwrap();
        let loaded: TaskList = persister.load("a", "b").await.unwrap();
        assert!(loaded.is_empty());
    }
}
