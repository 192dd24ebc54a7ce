//! Deterministic registry identities
//!
//! A (seed, key pair tag, data key tag) triple always yields the same key
//! pair and data key, so a document slot can be found again after a restart
//! without storing anything locally. Both outputs depend on both tags.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::keys::{KeyPair, SecretKey};
use super::seed::Seed;

/// Size of a registry data key in bytes
pub const DATA_KEY_SIZE: usize = 32;

const KEY_PAIR_CONTEXT: &str = "tasklist-store registry key pair v1";
const DATA_KEY_CONTEXT: &str = "tasklist-store registry data key v1";

/// Secondary registry index distinguishing documents under one public key
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataKey([u8; DATA_KEY_SIZE]);

impl fmt::Debug for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataKey({})", self.to_hex())
    }
}

impl From<[u8; DATA_KEY_SIZE]> for DataKey {
    fn from(bytes: [u8; DATA_KEY_SIZE]) -> Self {
        DataKey(bytes)
    }
}

impl TryFrom<&[u8]> for DataKey {
    type Error = anyhow::Error;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; DATA_KEY_SIZE] = bytes.try_into().map_err(|_| {
            anyhow::anyhow!(
                "invalid data key size, expected {}, got {}",
                DATA_KEY_SIZE,
                bytes.len()
            )
        })?;
        Ok(DataKey(bytes))
    }
}

impl DataKey {
    pub fn as_bytes(&self) -> &[u8; DATA_KEY_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

/// Derive the registry key pair and data key for a tag pair.
///
/// The derivation material is `seed || len(tag1) || tag1 || len(tag2) || tag2`
/// (lengths as little-endian u64) run through two BLAKE3 key derivations
/// with distinct contexts.
pub fn derive_registry_keys(
    seed: &Seed,
    key_pair_tag: &str,
    data_key_tag: &str,
) -> (KeyPair, DataKey) {
    let mut material =
        Vec::with_capacity(seed.bytes().len() + 16 + key_pair_tag.len() + data_key_tag.len());
    material.extend_from_slice(seed.bytes());
    for tag in [key_pair_tag, data_key_tag] {
        material.extend_from_slice(&(tag.len() as u64).to_le_bytes());
        material.extend_from_slice(tag.as_bytes());
    }

    let key_pair_seed = blake3::derive_key(KEY_PAIR_CONTEXT, &material);
    let data_key = blake3::derive_key(DATA_KEY_CONTEXT, &material);

    (
        KeyPair::from(SecretKey::from(key_pair_seed)),
        DataKey(data_key),
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::crypto::SEED_SIZE;

    fn seed() -> Seed {
        Seed::from([42u8; SEED_SIZE])
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let (kp1, dk1) = derive_registry_keys(&seed(), "todoListModule", "todoList");
        let (kp2, dk2) = derive_registry_keys(&seed(), "todoListModule", "todoList");
        assert_eq!(kp1.public_key(), kp2.public_key());
        assert_eq!(kp1.secret_key().to_bytes(), kp2.secret_key().to_bytes());
        assert_eq!(dk1, dk2);
    }

    #[test]
    fn test_either_tag_changes_both_outputs() {
        let (kp, dk) = derive_registry_keys(&seed(), "moduleA", "list1");
        let (kp_a, dk_a) = derive_registry_keys(&seed(), "moduleB", "list1");
        let (kp_b, dk_b) = derive_registry_keys(&seed(), "moduleA", "list2");

        assert_ne!(kp.public_key(), kp_a.public_key());
        assert_ne!(kp.public_key(), kp_b.public_key());
        assert_ne!(dk, dk_a);
        assert_ne!(dk, dk_b);
    }

    #[test]
    fn test_tag_boundaries_are_unambiguous() {
        let (kp1, dk1) = derive_registry_keys(&seed(), "ab", "c");
        let (kp2, dk2) = derive_registry_keys(&seed(), "a", "bc");
        assert_ne!(kp1.public_key(), kp2.public_key());
        assert_ne!(dk1, dk2);
    }

    #[test]
    fn test_seed_changes_outputs() {
        let other = Seed::from([43u8; SEED_SIZE]);
        let (kp1, dk1) = derive_registry_keys(&seed(), "moduleA", "list1");
        let (kp2, dk2) = derive_registry_keys(&other, "moduleA", "list1");
        assert_ne!(kp1.public_key(), kp2.public_key());
        assert_ne!(dk1, dk2);
    }

    #[test]
    fn test_no_collisions_across_sample() {
        let mut public_keys = HashSet::new();
        let mut data_keys = HashSet::new();
        for module in 0..16 {
            for list in 0..16 {
                let (kp, dk) = derive_registry_keys(
                    &seed(),
                    &format!("module{}", module),
                    &format!("list{}", list),
                );
                assert!(public_keys.insert(kp.public_key().to_bytes()));
                assert!(data_keys.insert(dk));
            }
        }
        assert_eq!(public_keys.len(), 256);
    }

    #[test]
    fn test_key_pair_and_data_key_differ() {
        let (kp, dk) = derive_registry_keys(&seed(), "moduleA", "list1");
        assert_ne!(&kp.secret_key().to_bytes(), dk.as_bytes());
    }
}
