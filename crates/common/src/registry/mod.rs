//! Versioned, signed pointer records
//!
//! A registry keeps one [`SignedEntry`] per (public key, data key) pair.
//!  Providers store entries and enforce revision monotonicity; the
//!  [`RegistryClient`] signs writes and verifies reads.

mod client;
mod entry;
mod memory;
mod provider;

pub use client::RegistryClient;
pub use entry::{PointerRecord, SignedEntry, MAX_ENTRY_DATA_SIZE};
pub use memory::{MemoryRegistryProvider, MemoryRegistryProviderError};
pub use provider::{RegistryError, RegistryProvider};
