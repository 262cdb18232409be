use crate::{Algorithm, Error, Precision, Result, SequenceId};
use num_bigint::BigUint;
use std::thread;
use tokio::sync::oneshot;

/// Runs one computation on its own OS thread and awaits the result.
///
/// The algorithms are CPU-bound and the recursive one needs a deep stack, so
/// they never run on a runtime worker. The thread is detached; its only
/// channel back is the oneshot.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Executor {
    precision: Precision,
    stack_size: usize,
}

impl Executor {
    pub(crate) const fn new(precision: Precision, stack_size: usize) -> Self {
        Self {
            precision,
            stack_size,
        }
    }

    /// # Errors
    /// - [`Error::Launch`] if the thread could not be spawned.
    /// - [`Error::ComputationPanicked`] if the thread died before sending.
    pub(crate) async fn run(
        self,
        id: SequenceId,
        algorithm: Algorithm,
        input: u64,
    ) -> Result<BigUint> {
        let (tx, rx) = oneshot::channel();
        let precision = self.precision;

        thread::Builder::new()
            .name(format!("fibreg-{id}"))
            .stack_size(self.stack_size)
            .spawn(move || {
                // The receiver is gone only if the owning task was dropped.
                let _ = tx.send(algorithm.compute(input, precision));
            })
            .map_err(|e| Error::Launch {
                context: format!("sequence {id}: {e}"),
            })?;

        rx.await.map_err(|_| Error::ComputationPanicked { id })
    }
}
