// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::Parser;
use log::{error, info, warn};
use network_state::client::{BeaconClient, ExecutionClient, HttpBeaconClient, HttpExecutionClient};
use network_state::health::{ClientKind, Endpoints, HealthConfig, HealthTracker};
use network_state::state::{AccountFetcher, NetworkStateManager, StateConfig, StateError};
use network_state::utils::{parse_addresses, validate_and_format_url};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// The CLI for the state daemon.
#[derive(Parser)]
struct Cli {
    /// The address of the primary execution client JSON-RPC endpoint.
    #[arg(short, long)]
    execution_address: String,

    /// The address of the fallback execution client JSON-RPC endpoint.
    #[arg(long)]
    fallback_execution_address: Option<String>,

    /// The address of the primary Beacon Node API.
    #[arg(short, long)]
    beacon_node_address: String,

    /// The address of the fallback Beacon Node API.
    #[arg(long)]
    fallback_beacon_node_address: Option<String>,

    /// Comma separated addresses of the accounts to track.
    #[arg(short, long, default_value = "")]
    accounts: String,

    /// Seconds between two updates of the network state.
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
    update_interval: u64,

    /// Seconds between two reports on the latest network state.
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    report_interval: u64,

    /// Seconds after which a request to a backing service is abandoned.
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    request_timeout: u64,

    /// Seconds to wait for the clients to sync before skipping an update. Zero waits indefinitely.
    #[arg(long, default_value_t = 16)]
    sync_timeout: u64,

    /// Maximum number of accounts read per round trip.
    #[arg(long, default_value_t = 100)]
    batch_size: usize,
}

type AccountStateManager = NetworkStateManager<AccountFetcher>;

#[tokio::main]
async fn main() -> Result<()> {
    let Cli {
        execution_address,
        fallback_execution_address,
        beacon_node_address,
        fallback_beacon_node_address,
        accounts,
        update_interval,
        report_interval,
        request_timeout,
        sync_timeout,
        batch_size,
    } = Cli::parse();

    // Initialize the logger.
    env_logger::init();

    let request_timeout = Duration::from_secs(request_timeout);
    let execution = Endpoints::new(
        execution_client(&execution_address, request_timeout)?,
        fallback_execution_address
            .as_deref()
            .map(|address| execution_client(address, request_timeout))
            .transpose()?,
    );
    let beacon = Endpoints::new(
        beacon_client(&beacon_node_address, request_timeout)?,
        fallback_beacon_node_address
            .as_deref()
            .map(|address| beacon_client(address, request_timeout))
            .transpose()?,
    );
    let accounts = parse_addresses(&accounts)?;
    let state_config = StateConfig::new(
        batch_size,
        StateConfig::default().max_concurrent_batches(),
        0,
    )?;

    let health_config = HealthConfig::default().with_sync_timeout(Duration::from_secs(sync_timeout));
    let tracker = Arc::new(HealthTracker::new(execution, beacon, health_config));
    let cancel = CancellationToken::new();

    info!("Waiting for a Beacon Node to sync");
    tracker.wait_beacon_synced(&cancel).await?;

    let manager = Arc::new(
        NetworkStateManager::connect(tracker, AccountFetcher::new(accounts), state_config).await?,
    );
    info!("State daemon initialized successfully");

    let mut tasks = JoinSet::new();
    tasks.spawn(run_updater(
        manager.clone(),
        Duration::from_secs(update_interval),
        cancel.clone(),
    ));
    tasks.spawn(run_reporter(
        manager,
        Duration::from_secs(report_interval),
        cancel.clone(),
    ));

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    cancel.cancel();

    while let Some(task) = tasks.join_next().await {
        task?;
    }

    Ok(())
}

fn execution_client(
    address: &str,
    request_timeout: Duration,
) -> Result<Arc<dyn ExecutionClient>> {
    let address = validate_and_format_url(address)?;
    Ok(Arc::new(HttpExecutionClient::new(&address, request_timeout)?))
}

fn beacon_client(address: &str, request_timeout: Duration) -> Result<Arc<dyn BeaconClient>> {
    let address = validate_and_format_url(address)?;
    Ok(Arc::new(HttpBeaconClient::new(&address, request_timeout)?))
}

/// Log a failed cycle. Transient errors only skip the cycle, others need an operator.
fn log_failure(task: &str, err: &StateError) {
    if err.is_transient() {
        warn!("Skipping {task} cycle: {err}");
    } else {
        error!("{task} cycle failed, this likely requires intervention: {err}");
    }
}

/// Periodically build and publish the network state at the head of the chain.
async fn run_updater(manager: Arc<AccountStateManager>, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = interval.tick() => {}
        }

        if let Err(err) = update(&manager, &cancel).await {
            if matches!(err, StateError::Cancelled) {
                return;
            }
            log_failure("update", &err);
        }
    }
}

async fn update(manager: &AccountStateManager, cancel: &CancellationToken) -> Result<(), StateError> {
    let tracker = manager.tracker();
    tracker.require_execution_synced(cancel).await?;
    tracker.require_beacon_synced(cancel).await?;

    manager.update_state_to_head(cancel).await?;
    Ok(())
}

/// Periodically log a summary of the latest network state, without building one.
async fn run_reporter(manager: Arc<AccountStateManager>, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = interval.tick() => {}
        }

        for kind in [ClientKind::Execution, ClientKind::Beacon] {
            let report = manager.tracker().status_report(kind);
            info!(
                "{kind} clients: primary {:?}, fallback {:?}",
                report.primary(),
                report.fallback()
            );
        }

        match manager.latest_state() {
            None => info!("No network state published yet"),
            Some(state) => {
                info!(
                    "Latest network state: slot {} (target {}), execution block {}, {} accounts",
                    state.resolved_slot(),
                    state.target_slot(),
                    state.execution_block_number(),
                    state.details().len()
                );
                for (address, details) in state.details() {
                    info!(
                        "  {address:?}: balance {} wei, nonce {}",
                        details.balance(),
                        details.nonce()
                    );
                }
            }
        }
    }
}
