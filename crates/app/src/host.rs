use common::document::TaskList;
use common::locator::ResolvableLocator;
use common::persist::{PersistError, Persister, SlotState};
use common::portal::{BlobsStore, BlobsStoreError, Portal};

use crate::database::{Database, DatabaseSetupError};
use crate::state::{AppState, StateError};

pub type HostPersister = Persister<Portal<Database>, Database>;

/// The host's view of its one task list slot
///
/// Built once at startup from [`AppState`]: the seed is read from disk, the
///  registry lives in SQLite and blobs in an on-disk iroh store.
#[derive(Debug, Clone)]
pub struct Host {
    persister: HostPersister,
    key_pair_tag: String,
    data_key_tag: String,
}

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("failed to open registry database: {0}")]
    Database(#[from] DatabaseSetupError),
    #[error("failed to open blob store: {0}")]
    Blobs(#[from] BlobsStoreError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

impl Host {
    pub async fn open(state: &AppState) -> Result<Self, HostError> {
        let seed = state.load_seed()?;
        let database = Database::connect(&state.db_path).await?;
        let blobs = BlobsStore::fs(&state.blobs_path).await?;
        let portal = Portal::new(blobs, database.clone());

        let persister = Persister::new(seed, portal, database)
            .with_retry_policy(state.config.retry_policy())
            .with_request_timeout(state.config.request_timeout());

        tracing::debug!(
            state_dir = %state.state_dir.display(),
            key_pair_tag = %state.config.key_pair_tag,
            data_key_tag = %state.config.data_key_tag,
            "host opened"
        );

        Ok(Self {
            persister,
            key_pair_tag: state.config.key_pair_tag.clone(),
            data_key_tag: state.config.data_key_tag.clone(),
        })
    }

    /// Point the host at a different slot than the configured one
    pub fn with_slot(mut self, key_pair_tag: Option<String>, data_key_tag: Option<String>) -> Self {
        if let Some(tag) = key_pair_tag {
            self.key_pair_tag = tag;
        }
        if let Some(tag) = data_key_tag {
            self.data_key_tag = tag;
        }
        self
    }

    pub fn persister(&self) -> &HostPersister {
        &self.persister
    }

    pub fn locator(&self) -> ResolvableLocator {
        self.persister
            .resolvable_locator(&self.key_pair_tag, &self.data_key_tag)
    }

    pub async fn save(&self, list: &TaskList) -> Result<ResolvableLocator, HostError> {
        Ok(self
            .persister
            .save(list, &self.key_pair_tag, &self.data_key_tag)
            .await?)
    }

    pub async fn load(&self) -> Result<TaskList, HostError> {
        Ok(self
            .persister
            .load(&self.key_pair_tag, &self.data_key_tag)
            .await?)
    }

    /// Load the task list on startup; a slot that was never saved is an
    ///  empty list rather than an error
    pub async fn hydrate(&self) -> Result<TaskList, HostError> {
        match self.load().await {
            Ok(list) => Ok(list),
            Err(HostError::Persist(e)) if e.is_not_found() => {
                tracing::info!("no saved task list, starting empty");
                Ok(TaskList::default())
            }
            Err(e) => Err(e),
        }
    }

    pub async fn inspect(&self) -> Result<Option<SlotState>, HostError> {
        Ok(self
            .persister
            .inspect(&self.key_pair_tag, &self.data_key_tag)
            .await?)
    }
}
