//! Graceful-drain bookkeeping for in-flight computations.
//!
//! [`ShutdownCoordinator`] is a three-phase state machine:
//!
//! ```text
//! Running --initiate_shutdown--> Draining --inflight == 0 or timeout--> Stopped
//! ```
//!
//! The phase and the in-flight counter live together in one
//! [`tokio::sync::watch`] cell, so "check the phase, then count the task" is a
//! single atomic step and the drain can await the counter reaching zero
//! without polling.

use crate::{Error, Result};
use core::time::Duration;
use std::{sync::Arc, time::Instant};
use tokio::{sync::watch, time::timeout};
use tokio_util::sync::CancellationToken;

/// Lifecycle phase of the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// New work is accepted.
    Running,
    /// New work is refused; waiting for in-flight work to finish.
    Draining,
    /// Drain finished or gave up. Process teardown may proceed.
    Stopped,
}

/// How a drain ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Every in-flight computation finished.
    Drained,
    /// The timeout elapsed first; `abandoned` computations were still running.
    TimedOut { abandoned: usize },
}

/// Summary returned by [`ShutdownCoordinator::initiate_shutdown`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrainReport {
    pub outcome: DrainOutcome,
    pub waited: Duration,
}

impl DrainReport {
    pub const fn is_drained(&self) -> bool {
        matches!(self.outcome, DrainOutcome::Drained)
    }
}

#[derive(Clone, Copy, Debug)]
struct Gauge {
    phase: Phase,
    inflight: usize,
    /// Set together with [`Phase::Stopped`].
    outcome: Option<DrainOutcome>,
}

/// Tracks in-flight computations and coordinates the drain on shutdown.
///
/// Tasks register with [`Self::begin_task`] and deregister by dropping the
/// returned [`TaskGuard`]. Once [`Self::initiate_shutdown`] runs, no new task
/// can register.
///
/// If the drain times out, the coordinator's [`CancellationToken`] is
/// cancelled. Work that has not started yet observes it and bails out; work
/// that is already computing is abandoned and may still write its result into
/// the store afterwards. The store is reference-counted, so such late writes
/// are harmless but unsynchronized with teardown.
#[derive(Debug)]
pub struct ShutdownCoordinator {
    gauge: watch::Sender<Gauge>,
    token: CancellationToken,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        let (gauge, _) = watch::channel(Gauge {
            phase: Phase::Running,
            inflight: 0,
            outcome: None,
        });
        Self {
            gauge,
            token: CancellationToken::new(),
        }
    }

    /// Registers one unit of in-flight work.
    ///
    /// # Errors
    /// [`Error::ServiceShutdown`] once the coordinator has left
    /// [`Phase::Running`].
    pub fn begin_task(self: &Arc<Self>) -> Result<TaskGuard> {
        let accepted = self.gauge.send_if_modified(|gauge| {
            if gauge.phase == Phase::Running {
                gauge.inflight += 1;
                true
            } else {
                false
            }
        });
        if !accepted {
            return Err(Error::ServiceShutdown);
        }
        Ok(TaskGuard {
            coordinator: Arc::clone(self),
        })
    }

    fn end_task(&self) {
        self.gauge.send_modify(|gauge| {
            gauge.inflight = gauge.inflight.saturating_sub(1);
        });
    }

    /// Stops accepting work and waits up to `drain_timeout` for in-flight work
    /// to finish.
    ///
    /// Only the call that moves the coordinator out of [`Phase::Running`] owns
    /// the drain: it alone applies its timeout, cancels the token on expiry and
    /// sets [`Phase::Stopped`]. Concurrent or later calls wait, up to their own
    /// `drain_timeout`, for that drain to end and report its outcome. If their
    /// wait runs out first they report the tasks still active and leave the
    /// coordinator untouched.
    pub async fn initiate_shutdown(&self, drain_timeout: Duration) -> DrainReport {
        let started = Instant::now();

        let began = self.gauge.send_if_modified(|gauge| {
            if gauge.phase == Phase::Running {
                gauge.phase = Phase::Draining;
                true
            } else {
                false
            }
        });

        let outcome = if began {
            self.drain(drain_timeout).await
        } else {
            self.await_drain(drain_timeout).await
        };

        DrainReport {
            outcome,
            waited: started.elapsed(),
        }
    }

    async fn drain(&self, drain_timeout: Duration) -> DrainOutcome {
        #[cfg(feature = "tracing")]
        tracing::info!(
            "Draining in-flight computations ({} active)",
            self.inflight()
        );

        let mut rx = self.gauge.subscribe();
        let _settled = timeout(drain_timeout, rx.wait_for(|gauge| gauge.inflight == 0))
            .await
            .is_ok();

        let abandoned = self.inflight();
        let outcome = if abandoned == 0 {
            #[cfg(feature = "tracing")]
            tracing::debug!("All in-flight computations drained");
            DrainOutcome::Drained
        } else {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                "Graceful drain timed out ({} computations still active)",
                abandoned
            );
            self.token.cancel();
            DrainOutcome::TimedOut { abandoned }
        };

        self.gauge.send_modify(|gauge| {
            gauge.phase = Phase::Stopped;
            gauge.outcome = Some(outcome);
        });
        outcome
    }

    async fn await_drain(&self, drain_timeout: Duration) -> DrainOutcome {
        let mut rx = self.gauge.subscribe();
        let recorded = timeout(drain_timeout, rx.wait_for(|gauge| gauge.phase == Phase::Stopped))
            .await
            .ok()
            .and_then(|stopped| stopped.ok().and_then(|gauge| gauge.outcome));

        recorded.unwrap_or_else(|| DrainOutcome::TimedOut {
            abandoned: self.inflight(),
        })
    }

    pub fn phase(&self) -> Phase {
        self.gauge.borrow().phase
    }

    /// Number of registered, not yet finished tasks.
    pub fn inflight(&self) -> usize {
        self.gauge.borrow().inflight
    }

    pub fn is_accepting(&self) -> bool {
        self.phase() == Phase::Running
    }

    /// Token cancelled when a drain gives up on in-flight work.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Registration of one in-flight task. Dropping it deregisters the task.
#[derive(Debug)]
#[must_use = "dropping the guard immediately ends the task"]
pub struct TaskGuard {
    coordinator: Arc<ShutdownCoordinator>,
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.coordinator.end_task();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[test]
    fn guards_count_inflight_work() {
        let coordinator = Arc::new(ShutdownCoordinator::new());
        assert_eq!(coordinator.phase(), Phase::Running);

        let first = coordinator.begin_task().unwrap();
        let second = coordinator.begin_task().unwrap();
        assert_eq!(coordinator.inflight(), 2);

        drop(first);
        assert_eq!(coordinator.inflight(), 1);
        drop(second);
        assert_eq!(coordinator.inflight(), 0);
    }

    #[tokio::test]
    async fn idle_shutdown_drains_immediately() {
        let coordinator = Arc::new(ShutdownCoordinator::new());
        let report = coordinator.initiate_shutdown(Duration::from_secs(5)).await;

        assert!(report.is_drained());
        assert_eq!(coordinator.phase(), Phase::Stopped);
        assert!(!coordinator.cancellation_token().is_cancelled());
        assert_eq!(coordinator.begin_task().unwrap_err(), Error::ServiceShutdown);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn shutdown_waits_for_inflight_work() {
        let coordinator = Arc::new(ShutdownCoordinator::new());
        let guards: Vec<_> = (0..3).map(|_| coordinator.begin_task().unwrap()).collect();

        let workers: Vec<_> = guards
            .into_iter()
            .enumerate()
            .map(|(i, guard)| {
                tokio::spawn(async move {
                    sleep(Duration::from_millis(50 * (i as u64 + 1))).await;
                    drop(guard);
                })
            })
            .collect();

        let drain = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.initiate_shutdown(Duration::from_secs(10)).await })
        };

        sleep(Duration::from_millis(10)).await;
        assert_eq!(coordinator.phase(), Phase::Draining);
        assert!(coordinator.begin_task().is_err());

        let report = drain.await.unwrap();
        assert!(report.is_drained());
        assert!(report.waited >= Duration::from_millis(100));
        assert_eq!(coordinator.inflight(), 0);
        assert_eq!(coordinator.phase(), Phase::Stopped);

        futures::future::join_all(workers).await;
    }

    #[tokio::test]
    async fn drain_timeout_abandons_and_cancels() {
        let coordinator = Arc::new(ShutdownCoordinator::new());
        let _stuck = coordinator.begin_task().unwrap();
        let token = coordinator.cancellation_token();

        let report = coordinator
            .initiate_shutdown(Duration::from_millis(50))
            .await;

        assert_eq!(report.outcome, DrainOutcome::TimedOut { abandoned: 1 });
        assert!(token.is_cancelled());
        assert_eq!(coordinator.phase(), Phase::Stopped);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn only_the_first_caller_owns_the_drain() {
        let coordinator = Arc::new(ShutdownCoordinator::new());
        let guard = coordinator.begin_task().unwrap();
        let token = coordinator.cancellation_token();

        let owner = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.initiate_shutdown(Duration::from_secs(10)).await })
        };
        while coordinator.phase() == Phase::Running {
            sleep(Duration::from_millis(1)).await;
        }

        // A shorter wait gives up on its own without ending the drain.
        let impatient = coordinator
            .initiate_shutdown(Duration::from_millis(20))
            .await;
        assert_eq!(impatient.outcome, DrainOutcome::TimedOut { abandoned: 1 });
        assert!(!token.is_cancelled());
        assert_eq!(coordinator.phase(), Phase::Draining);

        drop(guard);
        let report = owner.await.unwrap();
        assert!(report.is_drained());
        assert!(!token.is_cancelled());
        assert_eq!(coordinator.phase(), Phase::Stopped);

        let late = coordinator.initiate_shutdown(Duration::from_secs(1)).await;
        assert!(late.is_drained());
    }

    #[tokio::test]
    async fn later_callers_see_the_recorded_timeout() {
        let coordinator = Arc::new(ShutdownCoordinator::new());
        let _stuck = coordinator.begin_task().unwrap();

        let first = coordinator
            .initiate_shutdown(Duration::from_millis(20))
            .await;
        let second = coordinator.initiate_shutdown(Duration::from_secs(1)).await;
        assert_eq!(first.outcome, DrainOutcome::TimedOut { abandoned: 1 });
        assert_eq!(second.outcome, first.outcome);
        assert!(second.waited < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn repeated_shutdown_is_idempotent() {
        let coordinator = Arc::new(ShutdownCoordinator::new());
        let first = coordinator.initiate_shutdown(Duration::from_secs(1)).await;
        let second = coordinator.initiate_shutdown(Duration::from_secs(1)).await;
        assert!(first.is_drained());
        assert!(second.is_drained());
        assert_eq!(coordinator.phase(), Phase::Stopped);
    }
}
