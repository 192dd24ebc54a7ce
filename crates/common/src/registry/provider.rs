use std::fmt::{Debug, Display};

use async_trait::async_trait;

use super::entry::SignedEntry;
use crate::locator::EntryId;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError<T> {
    /// Transport or storage failure inside the provider
    #[error("unhandled registry provider error: {0}")]
    Provider(#[from] T),
    /// A write did not carry a revision strictly greater than
    ///  the stored one -- entry, stored, attempted
    #[error("revision conflict on entry {0}: stored {1}, attempted {2}")]
    RevisionConflict(EntryId, u64, u64),
    /// A record failed verification against its public key,
    ///  or does not belong to the slot it was read for
    #[error("invalid signature on entry {0}")]
    InvalidSignature(EntryId),
    /// The entry data exceeds the registry payload limit
    #[error("entry data too large: {0} bytes")]
    EntryDataTooLarge(usize),
}

/// Storage side of the registry: keeps one signed entry per [`EntryId`]
#[async_trait]
pub trait RegistryProvider: Send + Sync + Debug + Clone + 'static {
    type Error: Display + Debug + Send + Sync + 'static;

    /// Get the current entry stored under an entry id
    ///
    /// # Returns
    /// * `Ok(Some(entry))` - The stored entry, exactly as written
    /// * `Ok(None)` - Nothing has ever been written for this id
    /// * `Err(RegistryError::Provider)` - The provider could not be reached
    async fn get(
        &self,
        entry_id: &EntryId,
    ) -> Result<Option<SignedEntry>, RegistryError<Self::Error>>;

    /// Replace the entry for `entry.entry_id()`
    ///
    /// Should fail with the following errors to be considered
    ///  correct, leaving the stored entry untouched:
    /// * `Err(RegistryError::InvalidSignature)` - The entry does not verify
    /// * `Err(RegistryError::RevisionConflict)` - The revision is not strictly
    ///   greater than the stored one
    ///
    /// The revision check and the replacement must be atomic.
    async fn set(&self, entry: SignedEntry) -> Result<(), RegistryError<Self::Error>>;
}
