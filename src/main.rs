// ABOUTME: CLI entry point for the fleet compliance orchestrator
// ABOUTME: Wires config, the remote client, and session state into clap subcommands

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dialoguer::Confirm;
use indicatif::ProgressBar;
use tracing_subscriber::EnvFilter;

use fleet_compliance_orchestrator::config::AppConfig;
use fleet_compliance_orchestrator::orchestrator::{FleetOrchestrator, SubmitOutcome};
use fleet_compliance_orchestrator::remote::{DiscoverySpec, FleetClient, FleetSummary};
use fleet_compliance_orchestrator::session::SqliteSessionStore;

#[derive(Parser)]
#[command(name = "fleet-compliance-orchestrator")]
#[command(about = "Run compliance checks, scans, and discovery across a managed fleet")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the fleet compliance summary
    Status,
    /// Check every machine with an assigned compliance pack, one at a time
    CheckAll {
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Check a single machine by id
    Check { id: String },
    /// Submit a scan against a single host
    Scan { target: String },
    /// Start a network discovery job
    Discover { network: String },
    /// Show the status of the active discovery job
    DiscoveryStatus,
    /// Forget the active discovery job
    ClearDiscovery,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load_or_default(cli.config.as_deref())?;

    let client = FleetClient::new(
        config.api_base_url.clone(),
        Duration::from_secs(config.request_timeout_secs),
    )?;
    let store = SqliteSessionStore::open(&config.state_path)?;
    let orchestrator = FleetOrchestrator::new(client, Box::new(store))?;

    match cli.command {
        Commands::Status => {
            let summary = orchestrator.summary().await?;
            print_summary(&summary);
        }
        Commands::CheckAll { yes } => {
            check_all(&orchestrator, yes).await?;
        }
        Commands::Check { id } => {
            let summary = orchestrator.summary().await?;
            let target = summary
                .targets
                .iter()
                .find(|t| t.id == id)
                .with_context(|| format!("No machine with id '{}' in the fleet", id))?;
            let result = orchestrator.check_one(target).await?;
            match result.mismatch_count {
                0 => println!("{}: {}", target.label, result.status),
                n => println!("{}: {} ({} mismatches)", target.label, result.status, n),
            }
        }
        Commands::Scan { target } => match orchestrator.submit_scan(&target).await {
            SubmitOutcome::Accepted(response) => {
                println!("Scan accepted as job {} ({})", response.job_id, response.status);
            }
            SubmitOutcome::Rejected => {
                println!("A scan submission is already in flight");
            }
            SubmitOutcome::Invalid(reason) => anyhow::bail!("Invalid scan target: {}", reason),
            SubmitOutcome::Failed(reason) => anyhow::bail!("Scan submission failed: {}", reason),
        },
        Commands::Discover { network } => {
            let spec = DiscoverySpec::for_network(network);
            let job_id = orchestrator.start_discovery(&spec).await?;
            println!("Discovery started as job {}", job_id);
        }
        Commands::DiscoveryStatus => match orchestrator.active_discovery() {
            None => println!("No active discovery job"),
            Some(job_id) => {
                let status = orchestrator.discovery_status(job_id).await?;
                println!("Discovery job {}: {}", status.job_id, status.status);
                if let Some(progress) = status.progress {
                    println!(
                        "  scanned {} of {} hosts",
                        progress.hosts_scanned, progress.hosts_total
                    );
                }
                if let Some(error) = status.error {
                    println!("  error: {}", error);
                }
            }
        },
        Commands::ClearDiscovery => {
            orchestrator.clear_discovery()?;
            println!("Active discovery job cleared");
        }
    }

    Ok(())
}

async fn check_all(orchestrator: &FleetOrchestrator, yes: bool) -> Result<()> {
    let summary = orchestrator.summary().await?;
    let eligible = summary
        .targets
        .iter()
        .filter(|t| t.capability.is_some())
        .count();

    if eligible == 0 {
        println!("No machines have a compliance pack assigned; nothing to check");
        return Ok(());
    }

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Check {} machines now?", eligible))
            .default(true)
            .interact()
            .context("Failed to read confirmation")?;
        if !confirmed {
            println!("Aborted");
            return Ok(());
        }
    }

    let bar = ProgressBar::new(eligible as u64);
    let outcome = orchestrator
        .check_all(&summary.targets, |current, _| bar.set_position(current))
        .await;
    bar.finish_and_clear();

    match outcome {
        None => println!("A batch is already running; not starting another"),
        Some(outcome) => {
            println!(
                "Checked {} machines, {} failed",
                outcome.ran_count,
                outcome.failures.len()
            );
            for (id, reason) in &outcome.failures {
                println!("  {}: {}", id, reason);
            }
            let refreshed = orchestrator.summary().await?;
            print_summary(&refreshed);
        }
    }

    Ok(())
}

fn print_summary(summary: &FleetSummary) {
    println!(
        "Fleet: {} compliant, {} non-compliant, {} never checked",
        summary.counts.compliant, summary.counts.non_compliant, summary.counts.never_checked
    );
    for target in &summary.targets {
        let pack = target.capability.as_deref().unwrap_or("no pack");
        match target.last_checked_at.as_deref() {
            Some(at) => println!(
                "  {} [{}] {} (last checked {})",
                target.label, pack, target.last_status, at
            ),
            None => println!("  {} [{}] {}", target.label, pack, target.last_status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
