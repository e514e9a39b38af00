// ABOUTME: Single-operation state machine for one-off scan submissions
// ABOUTME: Suppresses duplicate submits and normalizes operator input

use std::future::Future;
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use crate::error::FleetError;
use crate::remote::models::OperationResponse;

const GENERIC_FAILURE: &str = "operation failed";

/// Observable state of the submitter. `Succeeded` and `Failed` are
/// terminal until the caller resets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SubmitState {
    #[default]
    Idle,
    Submitting,
    Succeeded(OperationResponse),
    Failed(String),
}

/// What one `submit` call did. Only `Accepted` and `Failed` mean the
/// remote collaborator was actually invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted(OperationResponse),
    /// Another submit is in flight or awaiting reset; nothing was sent.
    Rejected,
    /// The input failed validation; nothing was sent.
    Invalid(String),
    Failed(String),
}

#[derive(Debug, Default)]
pub struct OperationSubmitter {
    state: Mutex<SubmitState>,
}

impl OperationSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SubmitState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Submits `input` through `send` after trimming it.
    ///
    /// Only the `Idle` state accepts a submit: an in-flight or
    /// unacknowledged terminal state rejects without invoking `send`, so
    /// rapid repeated triggers produce exactly one remote call. An
    /// all-whitespace input is rejected as empty before any remote call
    /// and leaves the state untouched.
    pub async fn submit<F, Fut>(&self, input: &str, send: F) -> SubmitOutcome
    where
        F: FnOnce(&str) -> Fut,
        Fut: Future<Output = Result<OperationResponse, FleetError>>,
    {
        let trimmed = input.trim();
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if *state != SubmitState::Idle {
                debug!("submit rejected, submitter is not idle");
                return SubmitOutcome::Rejected;
            }
            if trimmed.is_empty() {
                return SubmitOutcome::Invalid("identifier must not be empty".to_string());
            }
            *state = SubmitState::Submitting;
        }

        // The lock is never held across this await.
        let result = send(trimmed).await;

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match result {
            Ok(response) => {
                *state = SubmitState::Succeeded(response.clone());
                SubmitOutcome::Accepted(response)
            }
            Err(err) => {
                let reason = if err.reason().is_empty() {
                    GENERIC_FAILURE.to_string()
                } else {
                    err.reason().to_string()
                };
                *state = SubmitState::Failed(reason.clone());
                SubmitOutcome::Failed(reason)
            }
        }
    }

    /// Returns to `Idle` from a terminal state. Returns false (and does
    /// nothing) while a submit is still in flight.
    pub fn reset(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match *state {
            SubmitState::Submitting => false,
            _ => {
                *state = SubmitState::Idle;
                true
            }
        }
    }
}
