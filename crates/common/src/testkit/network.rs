use anyhow::Result;

use super::gated::GatedRegistry;
use super::process::TestProcess;
use crate::crypto::Seed;
use crate::locator::ResolvableLocator;
use crate::portal::{BlobsStore, Portal};
use crate::registry::{MemoryRegistryProvider, PointerRecord};

/// A single in-memory storage network shared by every test process
///
/// Processes spawned from the same network see each other's blobs and
///  registry entries, the way separate hosts would on the real network.
#[derive(Debug, Clone)]
pub struct TestNetwork {
    portal: Portal<MemoryRegistryProvider>,
    registry: GatedRegistry<MemoryRegistryProvider>,
}

impl TestNetwork {
    /// Create a new network with nothing stored
    pub async fn new() -> Result<Self> {
        let registry = MemoryRegistryProvider::new();
        let blobs = BlobsStore::memory().await?;
        Ok(Self {
            portal: Portal::new(blobs, registry.clone()),
            registry: GatedRegistry::open(registry),
        })
    }

    /// Create a network whose first `parties` registry reads from processes
    ///  block until all of them have arrived
    ///
    /// Downloads resolve through the ungated registry, so only the
    ///  read-revision step of a save is held back.
    pub async fn gated(parties: usize) -> Result<Self> {
        let mut net = Self::new().await?;
        net.registry = GatedRegistry::gated(net.registry.inner().clone(), parties);
        Ok(net)
    }

    pub fn portal(&self) -> &Portal<MemoryRegistryProvider> {
        &self.portal
    }

    pub fn registry(&self) -> &MemoryRegistryProvider {
        self.portal.registry()
    }

    /// Start a process with a freshly generated seed
    pub fn spawn_process(&self, name: impl Into<String>) -> Result<TestProcess> {
        Ok(self.spawn_with_seed(name, Seed::generate()?))
    }

    /// Start a process with a known seed
    pub fn spawn_with_seed(&self, name: impl Into<String>, seed: Seed) -> TestProcess {
        TestProcess::new(name, seed, self.portal.clone(), self.registry.clone())
    }

    /// Simulate a restart: a new process that shares nothing with the old
    ///  one except its seed
    pub fn restart(&self, process: &TestProcess) -> TestProcess {
        tracing::debug!("restarting process {}", process.name);
        self.spawn_with_seed(process.name.clone(), process.seed().clone())
    }

    /// Every registry record accepted behind a resolvable locator, oldest first
    pub fn history(&self, locator: &ResolvableLocator) -> Result<Vec<PointerRecord>> {
        Ok(self.registry().history(locator.entry_id())?)
    }

    /// The revision currently stored behind a resolvable locator
    pub fn current_revision(&self, locator: &ResolvableLocator) -> Result<Option<u64>> {
        Ok(self.history(locator)?.last().map(|record| record.revision))
    }
}
