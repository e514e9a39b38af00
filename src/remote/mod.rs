// ABOUTME: Remote fleet API module
// ABOUTME: Client and data models for the compliance and discovery endpoints

pub mod client;
pub mod models;

pub use client::FleetClient;
pub use models::{
    CheckResult, ComplianceStatus, DiscoveryResponse, DiscoverySpec, DiscoveryStatus,
    FleetSummary, OperationResponse, StatusCounts, Target,
};
