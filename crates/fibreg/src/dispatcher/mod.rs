//! Submission and lookup of asynchronous computations.
//!
//! [`Dispatcher`] is the entry point of the registry. It stitches together
//! the [`SequenceStore`], the [`ShutdownCoordinator`] and the algorithms:
//!
//! - [`Dispatcher::submit`] registers in-flight work, creates a pending
//!   record, spawns the computation and returns the id without waiting.
//! - [`Dispatcher::lookup`] returns the current snapshot of a record.
//! - [`Dispatcher::shutdown`] refuses new work and drains what is running.

mod config;
mod executor;

pub use config::*;

use crate::{
    Algorithm, DrainReport, Phase, Result, SequenceId, SequenceRecord, SequenceStore,
    ShutdownCoordinator, TaskGuard,
};
use core::time::Duration;
use executor::Executor;
use std::{sync::Arc, time::Instant};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// Launches computations off the calling path and tracks their records.
///
/// Cloning is cheap; clones share the same store, coordinator and
/// concurrency bound.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    store: Arc<SequenceStore>,
    coordinator: Arc<ShutdownCoordinator>,
    permits: Option<Arc<Semaphore>>,
    executor: Executor,
}

impl Dispatcher {
    pub fn new(config: DispatcherConfig) -> Self {
        Self {
            store: Arc::new(SequenceStore::new()),
            coordinator: Arc::new(ShutdownCoordinator::new()),
            permits: config
                .max_concurrent
                .map(|limit| Arc::new(Semaphore::new(limit.get()))),
            executor: Executor::new(config.precision, config.compute_stack_size),
        }
    }

    /// Accepts a computation and returns its id immediately.
    ///
    /// The inputs are trusted; range checks belong to the caller. The
    /// computation runs in the background: it waits for a concurrency slot if
    /// the dispatcher is bounded, evaluates `algorithm` on a dedicated thread,
    /// stores the result with the elapsed time since submission and finally
    /// deregisters from the shutdown coordinator. If the thread cannot be
    /// started or dies, the record is marked
    /// [`SequenceStatus::Failed`](crate::SequenceStatus::Failed) with the
    /// reason instead.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    /// [`Error::ServiceShutdown`](crate::Error::ServiceShutdown) once
    /// [`Self::shutdown`] has started. No record is created in that case.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip(self)))]
    pub fn submit(&self, algorithm: Algorithm, input: u64) -> Result<SequenceId> {
        let guard = self.coordinator.begin_task()?;
        let id = self.store.create_pending(algorithm, input).id();
        self.launch(guard, id, algorithm, input);
        Ok(id)
    }

    fn launch(&self, guard: TaskGuard, id: SequenceId, algorithm: Algorithm, input: u64) {
        let store = Arc::clone(&self.store);
        let permits = self.permits.clone();
        let cancelled = self.coordinator.cancellation_token();
        let executor = self.executor;
        let launched = Instant::now();

        let fut = async move {
            // Dropped last, after the result is stored.
            let _guard = guard;

            let _permit = match permits {
                Some(permits) => match acquire(permits, &cancelled).await {
                    Some(permit) => Some(permit),
                    None => {
                        #[cfg(feature = "tracing")]
                        tracing::debug!("Sequence {id} abandoned before it started");
                        return;
                    }
                },
                None => None,
            };

            let stored = match executor.run(id, algorithm, input).await {
                Ok(result) => {
                    let elapsed = launched.elapsed();
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        "Sequence {id} ({algorithm}, n = {input}) complete in {elapsed:?}"
                    );
                    store.update_result(id, result, elapsed)
                }
                Err(e) => {
                    #[cfg(feature = "tracing")]
                    tracing::error!("Computation of sequence {id} failed: {e}");
                    store.record_failure(id, e.to_string(), launched.elapsed())
                }
            };
            if let Err(_e) = stored {
                #[cfg(feature = "tracing")]
                tracing::error!("Failed to store outcome of sequence {id}: {_e}");
            }
        };
        #[cfg(feature = "tracing")]
        let fut = {
            use tracing::Instrument;
            fut.instrument(tracing::info_span!("computation", %id, %algorithm, input))
        };

        tokio::spawn(fut);
    }

    /// Returns the current snapshot of the record at `id`, pending or not.
    ///
    /// # Errors
    /// [`Error::NotFound`](crate::Error::NotFound) for an id that was never
    /// issued.
    pub fn lookup(&self, id: SequenceId) -> Result<SequenceRecord> {
        self.store.find(id)
    }

    /// Refuses new submissions and waits up to `drain_timeout` for running
    /// computations to finish. See [`ShutdownCoordinator::initiate_shutdown`].
    pub async fn shutdown(&self, drain_timeout: Duration) -> DrainReport {
        self.coordinator.initiate_shutdown(drain_timeout).await
    }

    /// Number of submitted computations that have not finished.
    pub fn inflight(&self) -> usize {
        self.coordinator.inflight()
    }

    pub fn phase(&self) -> Phase {
        self.coordinator.phase()
    }

    pub fn store(&self) -> &Arc<SequenceStore> {
        &self.store
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DispatcherConfig::default())
    }
}

/// Waits for a concurrency slot unless the drain gives up first.
async fn acquire(
    permits: Arc<Semaphore>,
    cancelled: &CancellationToken,
) -> Option<tokio::sync::OwnedSemaphorePermit> {
    tokio::select! {
        permit = permits.acquire_owned() => permit.ok(),
        () = cancelled.cancelled() => None,
    }
}
