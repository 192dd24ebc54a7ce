use serde::{Deserialize, Serialize};

use crate::crypto::{DataKey, KeyPair, PublicKey, Signature};
use crate::locator::EntryId;

/// Largest payload a registry entry may carry, in bytes
pub const MAX_ENTRY_DATA_SIZE: usize = 70;

/// Current value of one registry slot
///
/// Identified by (`public_key`, `data_key`); `revision` strictly increases
/// across accepted writes. `entry_data` is opaque to the registry (here it
/// is always the binary form of a `DirectLocator`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerRecord {
    pub public_key: PublicKey,
    pub data_key: DataKey,
    pub revision: u64,
    pub entry_data: Vec<u8>,
}

impl PointerRecord {
    pub fn entry_id(&self) -> EntryId {
        EntryId::derive(&self.public_key, &self.data_key)
    }

    /// Bytes covered by the entry signature:
    ///  `blake3(data_key || len(entry_data) || entry_data || revision)`
    pub fn signing_message(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.data_key.as_bytes());
        hasher.update(&(self.entry_data.len() as u64).to_le_bytes());
        hasher.update(&self.entry_data);
        hasher.update(&self.revision.to_le_bytes());
        *hasher.finalize().as_bytes()
    }
}

/// A [`PointerRecord`] together with its owner's signature, as stored by
///  registry providers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedEntry {
    record: PointerRecord,
    signature: Signature,
}

impl SignedEntry {
    /// Sign a new record for `data_key` under `key_pair`
    ///
    /// Returns `None` if `entry_data` exceeds [`MAX_ENTRY_DATA_SIZE`].
    pub fn sign(
        key_pair: &KeyPair,
        data_key: DataKey,
        entry_data: Vec<u8>,
        revision: u64,
    ) -> Option<Self> {
        if entry_data.len() > MAX_ENTRY_DATA_SIZE {
            return None;
        }
        let record = PointerRecord {
            public_key: *key_pair.public_key(),
            data_key,
            revision,
            entry_data,
        };
        let signature = key_pair.secret_key().sign(&record.signing_message());
        Some(Self { record, signature })
    }

    /// Reassemble an entry from stored parts. The result is not verified.
    pub fn from_parts(record: PointerRecord, signature: Signature) -> Self {
        Self { record, signature }
    }

    pub fn record(&self) -> &PointerRecord {
        &self.record
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn entry_id(&self) -> EntryId {
        self.record.entry_id()
    }

    pub fn revision(&self) -> u64 {
        self.record.revision
    }

    /// Check the signature against the record's own public key
    pub fn verify(&self) -> Result<(), ed25519_dalek::SignatureError> {
        self.record
            .public_key
            .verify(&self.record.signing_message(), &self.signature)
    }

    pub fn into_record(self) -> PointerRecord {
        self.record
    }
}
