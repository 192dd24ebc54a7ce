//! Cryptographic primitives for registry-backed persistence
//!
//! - **Root secret**: a host-supplied [`Seed`], the only input to derivation
//! - **Identity**: Ed25519 key pairs (`SecretKey`/`PublicKey`) that own registry records
//! - **Derivation**: [`derive_registry_keys`] maps a seed and two tags to a
//!   [`KeyPair`] and a [`DataKey`], deterministically and without local state

mod derive;
mod keys;
mod seed;

pub use derive::{derive_registry_keys, DataKey, DATA_KEY_SIZE};
pub use ed25519_dalek::Signature;
pub use keys::{KeyError, KeyPair, PublicKey, SecretKey, PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE};
pub use seed::{Seed, SeedError, SEED_SIZE};
