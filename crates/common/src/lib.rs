/**
 * Cryptographic types and operations.
 *  - Root secret (seed) handling
 *  - Ed25519 key pairs for signing registry entries
 *  - Deterministic derivation of per-slot registry keys
 */
pub mod crypto;
/**
 * Serialized document model and the DAG-CBOR
 *  codec used to turn documents into blobs.
 */
pub mod document;
/**
 * Self-describing references into the storage
 *  network: direct (content-addressed) and
 *  resolvable (registry-backed) locators.
 */
pub mod locator;
/**
 * The persistence coordinator.
 * Ties the key deriver, blob store and registry
 *  together behind `save` and `load`.
 */
pub mod persist;
/**
 * Blob storage and locator resolution.
 *  A light wrapper around Iroh-Blobs, joined with
 *  a registry to follow resolvable locators.
 */
pub mod portal;
/**
 * Signed, revisioned pointer records keyed by
 *  (public key, data key), and the provider
 *  trait backends implement.
 */
pub mod registry;
/**
 * In-process harness for exercising the full
 *  save/load path without external infrastructure.
 */
pub mod testkit;

pub mod prelude {
    pub use crate::crypto::{KeyPair, PublicKey, Seed};
    pub use crate::document::{ListItem, TaskList};
    pub use crate::locator::{DirectLocator, Locator, ResolvableLocator};
    pub use crate::persist::{PersistError, Persister, RetryPolicy};
    pub use crate::portal::{BlobStoreClient, BlobsStore, Portal};
    pub use crate::registry::{MemoryRegistryProvider, RegistryProvider};
}
