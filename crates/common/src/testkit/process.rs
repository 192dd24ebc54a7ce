use crate::crypto::Seed;
use crate::document::TaskList;
use crate::locator::ResolvableLocator;
use crate::persist::{PersistError, Persister, RetryPolicy};
use crate::portal::Portal;
use crate::registry::MemoryRegistryProvider;

use super::gated::GatedRegistry;

pub type TestPersister =
    Persister<Portal<MemoryRegistryProvider>, GatedRegistry<MemoryRegistryProvider>>;

/// One simulated host process: a seed and the persister built from it
pub struct TestProcess {
    /// The name of this process (for debugging)
    pub name: String,
    seed: Seed,
    persister: TestPersister,
}

impl TestProcess {
    pub(super) fn new(
        name: impl Into<String>,
        seed: Seed,
        portal: Portal<MemoryRegistryProvider>,
        registry: GatedRegistry<MemoryRegistryProvider>,
    ) -> Self {
        // Tests race on purpose; don't sleep between conflict retries
        let persister = Persister::new(seed.clone(), portal, registry)
            .with_retry_policy(RetryPolicy::immediate(3));
        Self {
            name: name.into(),
            seed,
            persister,
        }
    }

    pub fn seed(&self) -> &Seed {
        &self.seed
    }

    pub fn persister(&self) -> &TestPersister {
        &self.persister
    }

    pub async fn save(
        &self,
        list: &TaskList,
        key_pair_tag: &str,
        data_key_tag: &str,
    ) -> Result<ResolvableLocator, PersistError> {
        self.persister.save(list, key_pair_tag, data_key_tag).await
    }

    pub async fn load(
        &self,
        key_pair_tag: &str,
        data_key_tag: &str,
    ) -> Result<TaskList, PersistError> {
        self.persister.load(key_pair_tag, data_key_tag).await
    }
}
