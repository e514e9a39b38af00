// ABOUTME: Sequential batch runner for fleet-wide compliance checks
// ABOUTME: Isolates per-target failures and reports monotonic progress

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, warn};

use crate::error::FleetError;
use crate::remote::models::{CheckResult, Target};

use super::guard::SingleFlightGuard;
use super::progress::ProgressTracker;

/// Aggregate result of one batch run, handed back to the caller for
/// summary display. `failures` maps target id to the failure reason.
/// A target skipped because it was already busy counts toward
/// `ran_count` but is recorded as neither success nor failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    pub ran_count: u64,
    pub failures: BTreeMap<String, String>,
}

/// Runs one check at a time over an ordered snapshot of targets. Nothing
/// in a batch ever executes concurrently with another item of the same
/// batch.
#[derive(Debug)]
pub struct BatchRunner {
    guard: SingleFlightGuard,
    running: AtomicBool,
    progress: Mutex<Option<Arc<ProgressTracker>>>,
}

impl BatchRunner {
    pub fn new(guard: SingleFlightGuard) -> Self {
        Self {
            guard,
            running: AtomicBool::new(false),
            progress: Mutex::new(None),
        }
    }

    /// The in-flight run's `(current, total)`, or `None` outside a run.
    pub fn progress(&self) -> Option<(u64, u64)> {
        self.progress
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|tracker| tracker.snapshot())
    }

    /// Runs `perform_one` over every capability-bearing target in order.
    ///
    /// Targets without an assigned capability are dropped here, before the
    /// total is fixed; callers pass the raw summary order. An empty
    /// eligible set returns a zero outcome without allocating any progress
    /// state. A call while another run is executing on this runner returns
    /// `None` and attempts nothing.
    ///
    /// Each eligible target is attempted under the single-flight guard. A
    /// target already busy elsewhere is skipped rather than failed, and a
    /// failed check lands in `failures` without stopping the loop. The
    /// progress counter advances exactly once per target before
    /// `on_progress` fires.
    pub async fn run_batch<F, Fut>(
        &self,
        targets: &[Target],
        mut perform_one: F,
        mut on_progress: impl FnMut(u64, u64),
    ) -> Option<BatchOutcome>
    where
        F: FnMut(&Target) -> Fut,
        Fut: Future<Output = Result<CheckResult, FleetError>>,
    {
        if self.running.swap(true, Ordering::SeqCst) {
            debug!("batch already running, rejecting re-entrant run");
            return None;
        }

        let eligible: Vec<&Target> = targets
            .iter()
            .filter(|target| target.capability.is_some())
            .collect();

        if eligible.is_empty() {
            self.running.store(false, Ordering::SeqCst);
            return Some(BatchOutcome {
                ran_count: 0,
                failures: BTreeMap::new(),
            });
        }

        let total = eligible.len() as u64;
        info!(total, "starting compliance batch");

        let tracker = Arc::new(ProgressTracker::new(total));
        *self
            .progress
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(tracker.clone());

        let mut failures = BTreeMap::new();
        for target in eligible {
            if self.guard.try_acquire(&target.id) {
                match perform_one(target).await {
                    Ok(_) => {}
                    Err(err) => {
                        warn!(target_id = %target.id, reason = err.reason(), "check failed");
                        failures.insert(target.id.clone(), err.reason().to_string());
                    }
                }
                self.guard.release(&target.id);
            } else {
                debug!(target_id = %target.id, "check already in flight, skipping");
            }

            let (current, total) = tracker.advance();
            on_progress(current, total);
        }

        *self
            .progress
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
        self.running.store(false, Ordering::SeqCst);

        info!(total, failed = failures.len(), "compliance batch finished");
        Some(BatchOutcome {
            ran_count: total,
            failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::models::ComplianceStatus;

    fn target(id: &str, capability: Option<&str>) -> Target {
        Target {
            id: id.to_string(),
            label: format!("host-{}", id),
            capability: capability.map(str::to_string),
            last_status: ComplianceStatus::NeverChecked,
            last_checked_at: None,
            mismatch_count: 0,
        }
    }

    fn checked(id: &str) -> CheckResult {
        CheckResult {
            target_id: id.to_string(),
            status: ComplianceStatus::Compliant,
            mismatch_count: 0,
            checked_at: None,
        }
    }

    #[tokio::test]
    async fn failing_target_is_recorded_and_the_batch_continues() {
        let runner = BatchRunner::new(SingleFlightGuard::new());
        let targets = vec![
            target("m1", Some("baseline")),
            target("m2", Some("baseline")),
            target("m3", Some("baseline")),
        ];

        let mut progress = Vec::new();
        let outcome = runner
            .run_batch(
                &targets,
                |t| {
                    let id = t.id.clone();
                    async move {
                        if id == "m2" {
                            Err(FleetError::Remote("agent not responding".to_string()))
                        } else {
                            Ok(checked(&id))
                        }
                    }
                },
                |current, total| progress.push((current, total)),
            )
            .await
            .expect("run was not re-entrant");

        assert_eq!(outcome.ran_count, 3);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(
            outcome.failures.get("m2").map(String::as_str),
            Some("agent not responding")
        );
        assert_eq!(progress, vec![(1, 3), (2, 3), (3, 3)]);
        assert_eq!(runner.progress(), None);
    }

    #[tokio::test]
    async fn targets_without_a_capability_are_excluded() {
        let runner = BatchRunner::new(SingleFlightGuard::new());
        let targets = vec![target("m1", None)];

        let mut advanced = false;
        let outcome = runner
            .run_batch(
                &targets,
                |t| {
                    let id = t.id.clone();
                    async move { Ok(checked(&id)) }
                },
                |_, _| advanced = true,
            )
            .await
            .expect("empty set is still an accepted run");

        assert_eq!(outcome.ran_count, 0);
        assert!(outcome.failures.is_empty());
        assert!(!advanced);
        assert_eq!(runner.progress(), None);
    }

    #[tokio::test]
    async fn busy_target_is_skipped_but_still_counted() {
        let guard = SingleFlightGuard::new();
        let runner = BatchRunner::new(guard.clone());
        let targets = vec![
            target("m1", Some("baseline")),
            target("m2", Some("baseline")),
            target("m3", Some("baseline")),
        ];

        // A manual check holds m2 for the whole run.
        assert!(guard.try_acquire("m2"));

        let mut attempted = Vec::new();
        let mut progress = Vec::new();
        let outcome = runner
            .run_batch(
                &targets,
                |t| {
                    attempted.push(t.id.clone());
                    let id = t.id.clone();
                    async move { Ok(checked(&id)) }
                },
                |current, total| progress.push((current, total)),
            )
            .await
            .expect("run was not re-entrant");

        assert_eq!(attempted, vec!["m1", "m3"]);
        assert_eq!(outcome.ran_count, 3);
        assert!(outcome.failures.is_empty());
        assert_eq!(progress, vec![(1, 3), (2, 3), (3, 3)]);

        guard.release("m2");
    }

    #[tokio::test]
    async fn guard_is_released_after_a_failed_check() {
        let guard = SingleFlightGuard::new();
        let runner = BatchRunner::new(guard.clone());
        let targets = vec![target("m1", Some("baseline"))];

        runner
            .run_batch(
                &targets,
                |_| async { Err(FleetError::Transport("timed out".to_string())) },
                |_, _| {},
            )
            .await
            .expect("run was not re-entrant");

        assert!(guard.try_acquire("m1"));
    }

    #[tokio::test]
    async fn a_second_run_is_rejected_while_one_is_executing() {
        let runner = Arc::new(BatchRunner::new(SingleFlightGuard::new()));
        let targets = vec![target("m1", Some("baseline"))];

        let (started_tx, started_rx) = tokio::sync::oneshot::channel();
        let (gate_tx, gate_rx) = tokio::sync::oneshot::channel::<()>();

        let background = {
            let runner = runner.clone();
            let mut started_tx = Some(started_tx);
            let mut gate_rx = Some(gate_rx);
            tokio::spawn(async move {
                runner
                    .run_batch(
                        &targets,
                        move |t| {
                            let started = started_tx.take();
                            let gate = gate_rx.take();
                            let id = t.id.clone();
                            async move {
                                if let Some(tx) = started {
                                    let _ = tx.send(());
                                }
                                if let Some(rx) = gate {
                                    let _ = rx.await;
                                }
                                Ok(checked(&id))
                            }
                        },
                        |_, _| {},
                    )
                    .await
            })
        };

        started_rx.await.expect("first run never started");
        assert_eq!(runner.progress(), Some((0, 1)));

        let rejected = runner
            .run_batch(
                &[target("m9", Some("baseline"))],
                |t| {
                    let id = t.id.clone();
                    async move { Ok(checked(&id)) }
                },
                |_, _| {},
            )
            .await;
        assert_eq!(rejected, None);

        let _ = gate_tx.send(());
        let outcome = background.await.expect("first run panicked");
        assert_eq!(outcome.map(|o| o.ran_count), Some(1));
        assert_eq!(runner.progress(), None);
    }
}
