use std::fmt;
use std::time::Duration;

use crate::crypto::SeedError;
use crate::document::CodecError;
use crate::locator::LocatorError;
use crate::portal::BlobStoreError;
use crate::registry::RegistryError;

/// The tag pair naming one persisted document
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Slot {
    pub key_pair_tag: String,
    pub data_key_tag: String,
}

impl Slot {
    pub fn new(key_pair_tag: impl Into<String>, data_key_tag: impl Into<String>) -> Self {
        Self {
            key_pair_tag: key_pair_tag.into(),
            data_key_tag: data_key_tag.into(),
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.key_pair_tag, self.data_key_tag)
    }
}

/// Step of a save or load at which a failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Upload,
    ReadRevision,
    WriteEntry,
    Download,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self {
            Phase::Upload => "upload",
            Phase::ReadRevision => "read revision",
            Phase::WriteEntry => "write entry",
            Phase::Download => "download",
        };
        f.write_str(phase)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("invalid root secret: {0}")]
    InvalidSecret(#[from] SeedError),
    #[error("malformed locator for {slot}: {source}")]
    MalformedLocator {
        slot: Slot,
        #[source]
        source: LocatorError,
    },
    #[error("failed to serialize document for {slot}: {source}")]
    Serialization {
        slot: Slot,
        #[source]
        source: CodecError,
    },
    #[error("stored document for {slot} does not match the expected schema: {source}")]
    Deserialization {
        slot: Slot,
        #[source]
        source: CodecError,
    },
    #[error("upload for {slot} failed: {reason}")]
    Upload { slot: Slot, reason: String },
    #[error("download for {slot} failed: {reason}")]
    Download { slot: Slot, reason: String },
    /// Nothing has ever been saved for the slot
    #[error("no document saved for {slot}")]
    NotFound { slot: Slot },
    #[error("registry unavailable for {slot} during {phase}: {reason}")]
    RegistryUnavailable {
        slot: Slot,
        phase: Phase,
        reason: String,
    },
    #[error("registry rejected {phase} for {slot}: {reason}")]
    RegistryRejected {
        slot: Slot,
        phase: Phase,
        reason: String,
    },
    #[error("invalid registry signature for {slot} during {phase}")]
    InvalidSignature { slot: Slot, phase: Phase },
    #[error("concurrent modification of {slot}: gave up after {attempts} attempts")]
    ConcurrentModification { slot: Slot, attempts: u32 },
    #[error("registry entry for {slot} is at the final revision")]
    RevisionExhausted { slot: Slot },
}

impl PersistError {
    /// Transport-class failures; the caller may retry the whole save or load
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PersistError::Upload { .. }
                | PersistError::Download { .. }
                | PersistError::RegistryUnavailable { .. }
        )
    }

    /// "No document yet", as opposed to a fault
    pub fn is_not_found(&self) -> bool {
        matches!(self, PersistError::NotFound { .. })
    }

    pub(crate) fn upload(slot: &Slot, err: CallError<BlobStoreError>) -> Self {
        PersistError::Upload {
            slot: slot.clone(),
            reason: err.to_string(),
        }
    }

    pub(crate) fn download(slot: &Slot, err: CallError<BlobStoreError>) -> Self {
        let slot = slot.clone();
        match err {
            CallError::Failed(BlobStoreError::NotFound(_)) => PersistError::NotFound { slot },
            CallError::Failed(BlobStoreError::InvalidProof(_)) => PersistError::InvalidSignature {
                slot,
                phase: Phase::Download,
            },
            CallError::Failed(BlobStoreError::Locator(source)) => {
                PersistError::MalformedLocator { slot, source }
            }
            other => PersistError::Download {
                slot,
                reason: other.to_string(),
            },
        }
    }

    pub(crate) fn registry<T: fmt::Display>(
        slot: &Slot,
        phase: Phase,
        err: CallError<RegistryError<T>>,
    ) -> Self {
        let slot = slot.clone();
        match err {
            CallError::Failed(RegistryError::InvalidSignature(_)) => {
                PersistError::InvalidSignature { slot, phase }
            }
            CallError::Failed(err @ RegistryError::RevisionConflict(..))
            | CallError::Failed(err @ RegistryError::EntryDataTooLarge(_)) => {
                PersistError::RegistryRejected {
                    slot,
                    phase,
                    reason: err.to_string(),
                }
            }
            other => PersistError::RegistryUnavailable {
                slot,
                phase,
                reason: other.to_string(),
            },
        }
    }
}

/// Outcome of a network call made under a deadline
#[derive(Debug)]
pub(crate) enum CallError<E> {
    TimedOut(Duration),
    Failed(E),
}

impl<E: fmt::Display> fmt::Display for CallError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallError::TimedOut(limit) => write!(f, "timed out after {:?}", limit),
            CallError::Failed(err) => write!(f, "{}", err),
        }
    }
}

pub(crate) async fn call<T, E>(
    limit: Duration,
    fut: impl std::future::Future<Output = Result<T, E>>,
) -> Result<T, CallError<E>> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(CallError::Failed),
        Err(_) => Err(CallError::TimedOut(limit)),
    }
}
