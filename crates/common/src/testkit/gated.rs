use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Barrier;

use crate::locator::EntryId;
use crate::registry::{RegistryError, RegistryProvider, SignedEntry};

/// Registry wrapper that holds back the first `parties` reads until all of
///  them have arrived
///
/// Savers sharing a gate are forced to read the same revision before any of
///  them writes, which makes the optimistic-concurrency race deterministic.
///  Reads after the first `parties` pass straight through.
#[derive(Clone)]
pub struct GatedRegistry<P> {
    inner: P,
    gate: Option<Arc<Gate>>,
}

struct Gate {
    barrier: Barrier,
    remaining: AtomicUsize,
}

impl<P> GatedRegistry<P> {
    /// Pass-through wrapper; never blocks
    pub fn open(inner: P) -> Self {
        Self { inner, gate: None }
    }

    pub fn gated(inner: P, parties: usize) -> Self {
        Self {
            inner,
            gate: Some(Arc::new(Gate {
                barrier: Barrier::new(parties),
                remaining: AtomicUsize::new(parties),
            })),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    async fn wait(&self) {
        let Some(gate) = &self.gate else {
            return;
        };
        let admitted = gate
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if admitted {
            gate.barrier.wait().await;
        }
    }
}

impl<P: fmt::Debug> fmt::Debug for GatedRegistry<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatedRegistry")
            .field("inner", &self.inner)
            .field("gated", &self.gate.is_some())
            .finish()
    }
}

#[async_trait]
impl<P: RegistryProvider> RegistryProvider for GatedRegistry<P> {
    type Error = P::Error;

    async fn get(
        &self,
        entry_id: &EntryId,
    ) -> Result<Option<SignedEntry>, RegistryError<Self::Error>> {
        self.wait().await;
        self.inner.get(entry_id).await
    }

    async fn set(&self, entry: SignedEntry) -> Result<(), RegistryError<Self::Error>> {
        self.inner.set(entry).await
    }
}
