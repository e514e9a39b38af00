// ABOUTME: Data structures for the fleet compliance and discovery API
// ABOUTME: These are serialized to JSON for API communication

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub id: String,
    pub label: String,
    /// Assigned compliance pack. A target without one cannot be checked.
    pub capability: Option<String>,
    #[serde(default)]
    pub last_status: ComplianceStatus,
    pub last_checked_at: Option<String>,
    #[serde(default)]
    pub mismatch_count: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    Compliant,
    NonCompliant,
    #[default]
    NeverChecked,
}

impl fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComplianceStatus::Compliant => write!(f, "compliant"),
            ComplianceStatus::NonCompliant => write!(f, "non-compliant"),
            ComplianceStatus::NeverChecked => write!(f, "never checked"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusCounts {
    pub compliant: u32,
    pub non_compliant: u32,
    pub never_checked: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FleetSummary {
    pub counts: StatusCounts,
    pub targets: Vec<Target>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckRequest {
    pub capability: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckResult {
    pub target_id: String,
    pub status: ComplianceStatus,
    #[serde(default)]
    pub mismatch_count: u32,
    pub checked_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OperationRequest {
    pub kind: String,
    pub target_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OperationResponse {
    pub job_id: i64,
    pub status: String, // "queued" or "running"
}

#[derive(Debug, Clone, Serialize)]
pub struct DiscoverySpec {
    pub network: String,
    pub options: HashMap<String, serde_json::Value>,
}

impl DiscoverySpec {
    pub fn for_network(network: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            options: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryResponse {
    pub job_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryStatus {
    pub job_id: i64,
    pub status: String, // "queued", "running", "completed", "failed"
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub progress: Option<DiscoveryProgress>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryProgress {
    pub hosts_scanned: usize,
    pub hosts_total: usize,
}
