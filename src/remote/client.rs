// ABOUTME: HTTP client for communicating with the remote fleet API
// ABOUTME: Handles summary fetches, compliance checks, scan submission, and discovery jobs

use reqwest::{Client, StatusCode};
use std::time::Duration;

use crate::error::FleetError;

use super::models::{
    CheckRequest, CheckResult, DiscoveryResponse, DiscoverySpec, DiscoveryStatus, FleetSummary,
    OperationRequest, OperationResponse,
};

pub struct FleetClient {
    client: Client,
    api_base_url: String,
}

impl FleetClient {
    pub fn new(api_base_url: String, timeout: Duration) -> Result<Self, FleetError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FleetError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base_url,
        })
    }

    pub async fn fetch_summary(&self) -> Result<FleetSummary, FleetError> {
        let url = format!("{}/fleet/summary", self.api_base_url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            FleetError::Transport(format!(
                "Failed to fetch fleet summary: {}. The fleet API may be unreachable",
                e
            ))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FleetError::Remote(format!(
                "Fleet summary request failed with status {}: {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| FleetError::Transport(format!("Failed to parse fleet summary: {}", e)))
    }

    pub async fn perform_check(
        &self,
        target_id: &str,
        capability: &str,
    ) -> Result<CheckResult, FleetError> {
        let url = format!("{}/targets/{}/check", self.api_base_url, target_id);
        let request = CheckRequest {
            capability: capability.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                FleetError::Transport(format!("Failed to reach {} for check: {}", target_id, e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FleetError::Remote(format!(
                "Check of {} rejected with status {}: {}",
                target_id, status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| FleetError::Transport(format!("Failed to parse check result: {}", e)))
    }

    pub async fn submit_operation(
        &self,
        kind: &str,
        target_id: &str,
    ) -> Result<OperationResponse, FleetError> {
        let url = format!("{}/operations", self.api_base_url);
        let request = OperationRequest {
            kind: kind.to_string(),
            target_id: target_id.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                FleetError::Transport(format!(
                    "Failed to submit {} operation: {}. The fleet API may be unreachable",
                    kind, e
                ))
            })?;

        match response.status() {
            status if status.is_success() => response.json().await.map_err(|e| {
                FleetError::Transport(format!("Failed to parse operation response: {}", e))
            }),
            StatusCode::BAD_REQUEST => {
                let body = response.text().await.unwrap_or_default();
                Err(FleetError::Validation(format!(
                    "Operation rejected as invalid: {}",
                    body
                )))
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(FleetError::Remote(format!(
                    "Operation submission failed with status {}: {}",
                    status, body
                )))
            }
        }
    }

    pub async fn start_discovery(
        &self,
        spec: &DiscoverySpec,
    ) -> Result<DiscoveryResponse, FleetError> {
        let url = format!("{}/discovery", self.api_base_url);

        let response = self
            .client
            .post(&url)
            .json(spec)
            .send()
            .await
            .map_err(|e| {
                FleetError::Transport(format!(
                    "Failed to start discovery: {}. The fleet API may be unreachable",
                    e
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FleetError::Remote(format!(
                "Discovery start failed with status {}: {}",
                status, body
            )));
        }

        response.json().await.map_err(|e| {
            FleetError::Transport(format!("Failed to parse discovery response: {}", e))
        })
    }

    pub async fn discovery_status(&self, job_id: i64) -> Result<DiscoveryStatus, FleetError> {
        let url = format!("{}/discovery/{}", self.api_base_url, job_id);

        let response = self.client.get(&url).send().await.map_err(|e| {
            FleetError::Transport(format!(
                "Failed to get discovery status: {}. The fleet API may be unreachable",
                e
            ))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FleetError::Remote(format!(
                "Failed to get discovery status {}: {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| FleetError::Transport(format!("Failed to parse discovery status: {}", e)))
    }
}
