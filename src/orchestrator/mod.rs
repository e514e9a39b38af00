// ABOUTME: Orchestrator facade tying the client, guard, runner, and session state together
// ABOUTME: Drives batch compliance runs, single checks, scan submissions, and discovery

pub mod batch;
pub mod guard;
pub mod progress;
pub mod submitter;

pub use batch::{BatchOutcome, BatchRunner};
pub use guard::SingleFlightGuard;
pub use progress::ProgressTracker;
pub use submitter::{OperationSubmitter, SubmitOutcome, SubmitState};

use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use tracing::info;

use crate::error::FleetError;
use crate::remote::models::{
    CheckResult, DiscoverySpec, DiscoveryStatus, FleetSummary, Target,
};
use crate::remote::FleetClient;
use crate::session::SessionStateStore;

/// One orchestrator instance per process. Owns the single-flight guard
/// both operation paths go through, the batch runner, the scan submitter,
/// and the persisted discovery slot, which is loaded once here and then
/// only written through `start_discovery`/`clear_discovery`.
pub struct FleetOrchestrator {
    client: FleetClient,
    guard: SingleFlightGuard,
    runner: BatchRunner,
    submitter: OperationSubmitter,
    store: Box<dyn SessionStateStore>,
    active_discovery: Mutex<Option<i64>>,
}

impl FleetOrchestrator {
    pub fn new(client: FleetClient, store: Box<dyn SessionStateStore>) -> Result<Self> {
        let active = store
            .load()
            .context("Failed to load persisted session state")?;
        let guard = SingleFlightGuard::new();
        Ok(Self {
            client,
            runner: BatchRunner::new(guard.clone()),
            guard,
            submitter: OperationSubmitter::new(),
            store,
            active_discovery: Mutex::new(active),
        })
    }

    pub async fn summary(&self) -> Result<FleetSummary, FleetError> {
        self.client.fetch_summary().await
    }

    /// Runs a compliance check over every eligible target in `targets`,
    /// in order. Returns `None` if a batch is already executing. The
    /// caller re-fetches the summary after an accepted run completes.
    pub async fn check_all(
        &self,
        targets: &[Target],
        on_progress: impl FnMut(u64, u64),
    ) -> Option<BatchOutcome> {
        let client = &self.client;
        self.runner
            .run_batch(
                targets,
                |target| {
                    let id = target.id.clone();
                    let capability = target.capability.clone().unwrap_or_default();
                    async move { client.perform_check(&id, &capability).await }
                },
                on_progress,
            )
            .await
    }

    /// The in-flight batch's `(current, total)`, or `None` outside a run.
    pub fn batch_progress(&self) -> Option<(u64, u64)> {
        self.runner.progress()
    }

    /// Checks one target through the same guard the batch runner uses, so
    /// a manual check can never race a batch item for the same machine.
    pub async fn check_one(&self, target: &Target) -> Result<CheckResult, FleetError> {
        let capability = target.capability.clone().ok_or_else(|| {
            FleetError::Validation(format!(
                "'{}' has no compliance pack assigned and cannot be checked",
                target.label
            ))
        })?;

        if !self.guard.try_acquire(&target.id) {
            return Err(FleetError::Validation(format!(
                "A check of '{}' is already in flight",
                target.label
            )));
        }

        let result = self.client.perform_check(&target.id, &capability).await;
        self.guard.release(&target.id);
        result
    }

    /// Submits a scan of `target` through the single-operation state
    /// machine. Duplicate triggers while one is in flight are no-ops.
    pub async fn submit_scan(&self, target: &str) -> SubmitOutcome {
        let client = &self.client;
        self.submitter
            .submit(target, |trimmed| {
                let id = trimmed.to_string();
                async move { client.submit_operation("scan", &id).await }
            })
            .await
    }

    pub fn scan_state(&self) -> SubmitState {
        self.submitter.state()
    }

    pub fn reset_scan(&self) -> bool {
        self.submitter.reset()
    }

    /// Starts a discovery job and persists its id before returning, so a
    /// restart can pick the job back up.
    pub async fn start_discovery(&self, spec: &DiscoverySpec) -> Result<i64> {
        let response = self.client.start_discovery(spec).await?;
        self.record_discovery(response.job_id)?;
        Ok(response.job_id)
    }

    fn record_discovery(&self, job_id: i64) -> Result<()> {
        self.store
            .save(job_id)
            .context("Failed to persist active discovery id")?;
        *self
            .active_discovery
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(job_id);
        info!(job_id, "discovery job recorded");
        Ok(())
    }

    pub fn active_discovery(&self) -> Option<i64> {
        *self
            .active_discovery
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub async fn discovery_status(&self, job_id: i64) -> Result<DiscoveryStatus, FleetError> {
        self.client.discovery_status(job_id).await
    }

    /// Forgets the active discovery job. Never called automatically; job
    /// completion is not observable through the store.
    pub fn clear_discovery(&self) -> Result<()> {
        self.store.clear().context("Failed to clear session state")?;
        *self
            .active_discovery
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
