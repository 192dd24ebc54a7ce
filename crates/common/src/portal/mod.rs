//! Blob side of the storage network
//!
//! [`BlobStoreClient`] is the narrow capability the persistence layer needs:
//!  upload an immutable payload, download by locator. [`Portal`] implements it
//!  over a local [`BlobsStore`] plus a registry provider, resolving
//!  resolvable locators to their current target at download time.

mod blobs_store;

use std::fmt::Debug;

use async_trait::async_trait;
use bytes::Bytes;
use iroh_blobs::Hash;
use tracing::debug;

pub use blobs_store::{BlobsStore, BlobsStoreError};

use crate::locator::{DirectLocator, EntryId, Locator, LocatorError, ResolvableLocator};
use crate::registry::RegistryProvider;

#[derive(Debug, thiserror::Error)]
pub enum BlobStoreError {
    /// The content behind a locator does not exist (yet)
    #[error("not found: {0}")]
    NotFound(String),
    #[error("upload failed: {0}")]
    Upload(String),
    #[error("download failed: {0}")]
    Download(String),
    /// A resolved registry entry did not verify against its public key
    #[error("invalid registry proof for entry {0}")]
    InvalidProof(EntryId),
    /// A resolved registry entry does not hold a direct locator
    #[error("resolved entry holds a malformed locator: {0}")]
    Locator(#[from] LocatorError),
}

/// Upload/download capability of the storage network
#[async_trait]
pub trait BlobStoreClient: Send + Sync + Debug + Clone + 'static {
    /// Store an immutable payload, returning its direct locator.
    ///  `name` carries no meaning beyond avoiding accidental collisions.
    async fn upload(&self, payload: Vec<u8>, name: &str) -> Result<DirectLocator, BlobStoreError>;

    /// Fetch the payload behind a locator. Resolvable locators are
    ///  resolved to the target current at the time of the call.
    async fn download(&self, locator: &Locator) -> Result<Bytes, BlobStoreError>;
}

/// A blob store joined with the registry that resolvable locators point into
#[derive(Clone, Debug)]
pub struct Portal<R> {
    blobs: BlobsStore,
    registry: R,
}

impl<R: RegistryProvider> Portal<R> {
    pub fn new(blobs: BlobsStore, registry: R) -> Self {
        Self { blobs, registry }
    }

    pub fn blobs(&self) -> &BlobsStore {
        &self.blobs
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Follow a resolvable locator to the direct locator its entry currently holds
    pub async fn resolve(
        &self,
        locator: &ResolvableLocator,
    ) -> Result<DirectLocator, BlobStoreError> {
        let entry_id = locator.entry_id();
        let entry = self
            .registry
            .get(entry_id)
            .await
            .map_err(|e| BlobStoreError::Download(format!("registry lookup failed: {}", e)))?
            .ok_or_else(|| BlobStoreError::NotFound(format!("registry entry {}", entry_id)))?;

        if entry.entry_id() != *entry_id || entry.verify().is_err() {
            return Err(BlobStoreError::InvalidProof(*entry_id));
        }

        let direct = DirectLocator::from_bytes(&entry.record().entry_data)?;
        debug!(%entry_id, revision = entry.revision(), %direct, "resolved locator");
        Ok(direct)
    }

    async fn fetch(&self, locator: &DirectLocator) -> Result<Bytes, BlobStoreError> {
        let hash: Hash = (*locator.content_id()).into();
        let present = self
            .blobs
            .stat(&hash)
            .await
            .map_err(|e| BlobStoreError::Download(e.to_string()))?;
        if !present {
            return Err(BlobStoreError::NotFound(format!("blob {}", locator)));
        }
        self.blobs
            .get(&hash)
            .await
            .map_err(|e| BlobStoreError::Download(e.to_string()))
    }
}

#[async_trait]
impl<R: RegistryProvider> BlobStoreClient for Portal<R> {
    async fn upload(
        &self,
        payload: Vec<u8>,
        name: &str,
    ) -> Result<DirectLocator, BlobStoreError> {
        let size = payload.len();
        let hash = self
            .blobs
            .put(payload)
            .await
            .map_err(|e| BlobStoreError::Upload(e.to_string()))?;
        let locator = DirectLocator::new(hash.into());
        debug!(name, size, %locator, "uploaded blob");
        Ok(locator)
    }

    async fn download(&self, locator: &Locator) -> Result<Bytes, BlobStoreError> {
        match locator {
            Locator::Direct(direct) => self.fetch(direct).await,
            Locator::Resolvable(resolvable) => {
                let direct = self.resolve(resolvable).await?;
                self.fetch(&direct).await
            }
        }
    }
}
