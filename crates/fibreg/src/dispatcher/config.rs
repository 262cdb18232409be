use crate::Precision;
use core::num::NonZeroUsize;

/// Default stack size for compute threads (256 MiB).
///
/// [`memoized_recursive`](crate::memoized_recursive) recurses once per term,
/// so the stack has to hold one frame per unit of input. The memory is
/// reserved lazily by the OS; only the touched part is committed.
pub const DEFAULT_COMPUTE_STACK_SIZE: usize = 256 * 1024 * 1024;

/// Stack reserved per recursion level when sizing compute threads.
///
/// Covers one frame of [`memoized_recursive`](crate::memoized_recursive) in
/// unoptimized builds with room to spare.
pub const STACK_BYTES_PER_RECURSION_LEVEL: usize = 2 * 1024;

/// Smallest compute stack that lets
/// [`memoized_recursive`](crate::memoized_recursive) reach term `max_input`.
///
/// A thread that runs out of stack aborts the whole process, so callers that
/// accept inputs up to `max_input` should not configure less than this.
pub const fn min_compute_stack_size(max_input: u64) -> usize {
    let levels = if max_input > usize::MAX as u64 {
        usize::MAX
    } else {
        max_input as usize
    };
    levels.saturating_mul(STACK_BYTES_PER_RECURSION_LEVEL)
}

/// Runtime configuration for a [`Dispatcher`](crate::Dispatcher).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Upper bound on computations running at once. Submissions beyond the
    /// bound queue until a slot frees up. `None` runs every submission
    /// immediately.
    pub max_concurrent: Option<NonZeroUsize>,
    /// Working precision for the closed-form algorithm.
    pub precision: Precision,
    /// Stack size of each compute thread, in bytes.
    pub compute_stack_size: usize,
}

impl Default for DispatcherConfig {
    /// Bounds concurrency to the number of logical CPUs.
    fn default() -> Self {
        Self {
            max_concurrent: NonZeroUsize::new(num_cpus::get()),
            precision: Precision::default(),
            compute_stack_size: DEFAULT_COMPUTE_STACK_SIZE,
        }
    }
}

impl DispatcherConfig {
    #[must_use]
    pub const fn with_max_concurrent(mut self, max_concurrent: NonZeroUsize) -> Self {
        self.max_concurrent = Some(max_concurrent);
        self
    }

    /// Removes the concurrency bound.
    #[must_use]
    pub const fn unbounded(mut self) -> Self {
        self.max_concurrent = None;
        self
    }

    #[must_use]
    pub const fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    #[must_use]
    pub const fn with_compute_stack_size(mut self, bytes: usize) -> Self {
        self.compute_stack_size = bytes;
        self
    }
}
