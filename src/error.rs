// ABOUTME: Custom error types for the orchestrator
// ABOUTME: Provides the validation/transport/remote taxonomy surfaced to callers

use std::fmt;

#[derive(Debug, Clone)]
pub enum FleetError {
    Validation(String),
    Transport(String),
    Remote(String),
}

impl FleetError {
    /// The bare reason text, without the taxonomy prefix. This is what ends
    /// up in batch failure maps and submitter failure state.
    pub fn reason(&self) -> &str {
        match self {
            FleetError::Validation(msg) => msg,
            FleetError::Transport(msg) => msg,
            FleetError::Remote(msg) => msg,
        }
    }
}

impl fmt::Display for FleetError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FleetError::Validation(msg) => write!(f, "Validation error: {}", msg),
            FleetError::Transport(msg) => write!(f, "Transport error: {}", msg),
            FleetError::Remote(msg) => write!(f, "Remote error: {}", msg),
        }
    }
}

impl std::error::Error for FleetError {}
