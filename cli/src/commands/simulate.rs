// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Admission simulation command
//!
//! Submits the members of one gang concurrently through an in-process gate
//! and reports each member's outcome together with the gang events.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use futures::future::join_all;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use gang_admission_core::application::{AdmissionOutcome, GangAdmission};
use gang_admission_core::domain::config::GangAdmissionConfig;
use gang_admission_core::domain::{AdmissionRequest, GangEvent, GroupKey};
use gang_admission_core::infrastructure::event_bus::{EventBusError, GroupEventReceiver};

#[derive(Args, Debug, Clone)]
pub struct SimulateCommand {
    /// Namespace of the gang
    #[arg(long, default_value = "default")]
    pub namespace: String,

    /// Gang name
    #[arg(long, default_value = "demo")]
    pub group: String,

    /// Quorum announced by every member
    #[arg(short, long, default_value_t = 3)]
    pub quorum: u32,

    /// Number of members to submit
    #[arg(short, long, default_value_t = 3)]
    pub members: usize,

    /// Delay between two member submissions
    #[arg(long, default_value = "100ms", value_parser = humantime_serde::re::humantime::parse_duration)]
    pub stagger: Duration,

    /// Override the configured wait timeout
    #[arg(long, value_parser = humantime_serde::re::humantime::parse_duration)]
    pub timeout: Option<Duration>,

    /// Print events as JSON lines
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(command: SimulateCommand, config_override: Option<PathBuf>) -> Result<()> {
    let mut config = GangAdmissionConfig::load_or_default(config_override)
        .context("Failed to load configuration")?;
    if let Some(timeout) = command.timeout {
        config.wait_timeout = timeout;
    }
    config
        .validate()
        .context("Configuration validation failed")?;

    let admission = GangAdmission::from_config(&config);
    let key = GroupKey::new(&command.namespace, &command.group);

    info!(
        group = %key,
        quorum = command.quorum,
        members = command.members,
        "Starting gang admission simulation"
    );

    let receiver = admission.event_bus.subscribe_group(key.clone());
    let printer = tokio::spawn(print_events(receiver, command.json));

    let requests = build_requests(&command, &config);
    let handles: Vec<_> = requests
        .iter()
        .cloned()
        .enumerate()
        .map(|(i, request)| {
            let gate = admission.gate.clone();
            let delay = command.stagger * i as u32;
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let name = request.name.clone();
                (name, gate.admit(request).await)
            })
        })
        .collect();

    let mut outcomes = Vec::with_capacity(handles.len());
    for joined in join_all(handles).await {
        outcomes.push(joined.context("Admission task failed")?);
    }

    // Admitted members finish; their departures drain the gang
    for request in &requests {
        admission.gate.complete(request);
    }

    let tracked = admission.coordinator.tracked_groups();

    // Closing the bus ends the printer once it has drained
    drop(admission);
    let printed = printer.await.context("Event printer failed")?;

    println!();
    println!("{}", "Outcomes:".bold());
    for (name, outcome) in &outcomes {
        println!("  {:<24} {}", name, describe(outcome));
    }
    println!();
    println!("Events: {}", printed);
    println!("Tracked groups after completion: {}", tracked);

    Ok(())
}

fn build_requests(command: &SimulateCommand, config: &GangAdmissionConfig) -> Vec<AdmissionRequest> {
    (0..command.members)
        .map(|i| {
            AdmissionRequest::new(&command.namespace, format!("{}-{}", command.group, i))
                .with_annotation(&config.group_annotation, &command.group)
                .with_annotation(&config.min_available_annotation, command.quorum.to_string())
        })
        .collect()
}

fn describe(outcome: &AdmissionOutcome) -> String {
    match outcome {
        AdmissionOutcome::Bypassed => "bypassed (no gang metadata)".yellow().to_string(),
        AdmissionOutcome::Admitted { immediate: true, .. } => "admitted (own request)".green().to_string(),
        AdmissionOutcome::Admitted { immediate: false, .. } => "admitted (released)".green().to_string(),
        AdmissionOutcome::TimedOut { .. } => "timed out".red().to_string(),
        AdmissionOutcome::Superseded { .. } => "superseded".dimmed().to_string(),
    }
}

/// Print events until the bus closes. Returns how many were printed.
async fn print_events(mut receiver: GroupEventReceiver, json: bool) -> usize {
    let mut printed = 0;
    loop {
        let event = match receiver.recv().await {
            Ok(event) => event,
            Err(EventBusError::Lagged(_)) => continue,
            Err(_) => break,
        };
        printed += 1;

        if json {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{}", line),
                Err(e) => tracing::warn!("Failed to serialize event: {}", e),
            }
            continue;
        }

        let line = match &event {
            GangEvent::GroupCreated { group, quorum, .. } => {
                format!("group {} created (quorum {})", group, quorum)
            }
            GangEvent::QuorumReconciled { group, previous, current, .. } => {
                format!("group {} quorum {} -> {}", group, previous, current)
            }
            GangEvent::MemberWaiting { member, waiting, quorum, .. } => {
                format!("member {} waiting ({}/{})", member, waiting, quorum)
            }
            GangEvent::GroupReleased { group, member_count, allowed, .. } => {
                format!("group {} released: {} waiting, {} resumed", group, member_count, allowed)
            }
            GangEvent::MemberDeparted { member, remaining, .. } => {
                format!("member {} departed ({} left)", member, remaining)
            }
            GangEvent::GroupDissolved { group, released, .. } => {
                format!("group {} dissolved (released: {})", group, released)
            }
        };
        println!("{} {}", "event".cyan(), line);
    }
    printed
}
