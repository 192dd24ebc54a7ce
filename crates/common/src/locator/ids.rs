use std::fmt;

use iroh_blobs::Hash;
use serde::{Deserialize, Serialize};

use super::LocatorError;
use crate::crypto::{DataKey, PublicKey};

/// Size of content and entry identifiers in bytes
pub const ID_SIZE: usize = 32;

const ENTRY_ID_CONTEXT: &str = "tasklist-store registry entry id v1";

/// BLAKE3 hash naming one immutable blob
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentId([u8; ID_SIZE]);

impl From<[u8; ID_SIZE]> for ContentId {
    fn from(bytes: [u8; ID_SIZE]) -> Self {
        ContentId(bytes)
    }
}

impl From<Hash> for ContentId {
    fn from(hash: Hash) -> Self {
        ContentId(*hash.as_bytes())
    }
}

impl From<ContentId> for Hash {
    fn from(id: ContentId) -> Self {
        Hash::from_bytes(id.0)
    }
}

impl ContentId {
    pub fn as_bytes(&self) -> &[u8; ID_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentId({})", self.to_hex())
    }
}

/// Identifier of a registry entry, a pure function of (public key, data key)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId([u8; ID_SIZE]);

impl From<[u8; ID_SIZE]> for EntryId {
    fn from(bytes: [u8; ID_SIZE]) -> Self {
        EntryId(bytes)
    }
}

impl TryFrom<&[u8]> for EntryId {
    type Error = LocatorError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; ID_SIZE] = bytes.try_into().map_err(|_| LocatorError::InvalidLength {
            expected: ID_SIZE,
            actual: bytes.len(),
        })?;
        Ok(EntryId(bytes))
    }
}

impl EntryId {
    /// Compute the entry id for a registry slot. No network access needed.
    pub fn derive(public_key: &PublicKey, data_key: &DataKey) -> Self {
        let mut hasher = blake3::Hasher::new_derive_key(ENTRY_ID_CONTEXT);
        hasher.update(&public_key.to_bytes());
        hasher.update(data_key.as_bytes());
        EntryId(*hasher.finalize().as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; ID_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(hex: &str) -> Result<Self, LocatorError> {
        let bytes = hex::decode(hex).map_err(|e| LocatorError::InvalidEncoding(e.to_string()))?;
        Self::try_from(bytes.as_slice())
    }
}

impl fmt::Debug for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntryId({})", self.to_hex())
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
