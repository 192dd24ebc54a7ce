//! Shared test utilities for persistence integration tests
#![allow(dead_code)]

use std::path::Path;

use common::crypto::Seed;
use common::persist::{Persister, RetryPolicy};
use common::portal::{BlobsStore, Portal};
use common::registry::MemoryRegistryProvider;

pub type MemoryPersister = Persister<Portal<MemoryRegistryProvider>, MemoryRegistryProvider>;

/// Fresh in-memory blob store joined with a fresh in-memory registry
pub async fn memory_portal() -> Portal<MemoryRegistryProvider> {
    let blobs = BlobsStore::memory().await.unwrap();
    Portal::new(blobs, MemoryRegistryProvider::new())
}

/// Set up a persister over an empty in-memory network with a random seed
pub async fn setup_persister() -> (MemoryPersister, Portal<MemoryRegistryProvider>) {
    let portal = memory_portal().await;
    let persister = persister_on(&portal, Seed::generate().unwrap());
    (persister, portal)
}

/// Build a persister for `seed` on an existing network
pub fn persister_on(portal: &Portal<MemoryRegistryProvider>, seed: Seed) -> MemoryPersister {
    Persister::new(seed, portal.clone(), portal.registry().clone())
        .with_retry_policy(RetryPolicy::immediate(3))
}

/// Set up a persister whose blobs live on disk under `dir`
pub async fn setup_fs_persister(dir: &Path, seed: Seed) -> MemoryPersister {
    let blobs = BlobsStore::fs(&dir.join("blobs")).await.unwrap();
    let portal = Portal::new(blobs, MemoryRegistryProvider::new());
    persister_on(&portal, seed)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("common=debug")
        .with_test_writer()
        .try_init();
}
