use tracing::debug;

use super::entry::{PointerRecord, SignedEntry};
use super::provider::{RegistryError, RegistryProvider};
use crate::crypto::{DataKey, KeyPair, PublicKey};
use crate::locator::EntryId;

/// Signing, verifying front end over a [`RegistryProvider`]
///
/// Providers are untrusted storage; every record read through the client is
///  checked against the slot it was requested for.
#[derive(Debug, Clone)]
pub struct RegistryClient<P> {
    provider: P,
}

impl<P: RegistryProvider> RegistryClient<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Read the current record for a slot
    ///
    /// # Returns
    /// * `Ok(Some(record))` - The verified current record
    /// * `Ok(None)` - No record exists yet
    /// * `Err(RegistryError::InvalidSignature)` - The stored record does not
    ///   verify, or belongs to a different slot
    pub async fn read(
        &self,
        public_key: &PublicKey,
        data_key: &DataKey,
    ) -> Result<Option<PointerRecord>, RegistryError<P::Error>> {
        let entry_id = EntryId::derive(public_key, data_key);
        let Some(entry) = self.provider.get(&entry_id).await? else {
            debug!(%entry_id, "registry entry absent");
            return Ok(None);
        };

        let record = entry.record();
        if record.public_key != *public_key || record.data_key != *data_key {
            return Err(RegistryError::InvalidSignature(entry_id));
        }
        if entry.verify().is_err() {
            return Err(RegistryError::InvalidSignature(entry_id));
        }

        debug!(%entry_id, revision = record.revision, "registry entry read");
        Ok(Some(entry.into_record()))
    }

    /// Sign and submit a new record for a slot
    ///
    /// # Returns
    /// * `Ok(entry_id)` - The id of the replaced entry
    /// * `Err(RegistryError::RevisionConflict)` - `revision` is not greater
    ///   than the stored revision; re-read and retry
    pub async fn write(
        &self,
        key_pair: &KeyPair,
        data_key: &DataKey,
        entry_data: Vec<u8>,
        revision: u64,
    ) -> Result<EntryId, RegistryError<P::Error>> {
        let size = entry_data.len();
        let entry = SignedEntry::sign(key_pair, *data_key, entry_data, revision)
            .ok_or(RegistryError::EntryDataTooLarge(size))?;
        let entry_id = entry.entry_id();

        self.provider.set(entry).await?;

        debug!(%entry_id, revision, "registry entry written");
        Ok(entry_id)
    }
}
