// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # Manager module
//!
//! The [`NetworkStateManager`] builds snapshots of the network state and publishes the latest one
//! for concurrent readers.
//!
//! A build resolves a target slot, walks back to the nearest slot with a proposed block, and reads
//! the details of the requested entities at the execution block of that beacon block. Builds are
//! independent from one another and can run concurrently. Only fully assembled snapshots covering
//! every entity are published, and publishing only swaps a pointer under the lock.

use crate::client::{BeaconClient, ExecutionClient};
use crate::health::HealthTracker;
use crate::state::error::{client_error, StateError};
use crate::state::fetcher::{fetch_in_batches, DetailsFetcher};
use crate::state::{EntityFilter, NetworkState, StateConfig};
use ethers_core::types::Address;
use getset::Getters;
use log::{debug, info};
use network_state_core::time::{finalized_slot_for_epoch, slot_for_timestamp};
use network_state_core::types::block::BeaconBlock;
use network_state_core::types::config::BeaconConfig;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// The snapshot type built by a manager over the fetcher `F`.
pub type Snapshot<F> =
    NetworkState<<F as DetailsFetcher>::Details, <F as DetailsFetcher>::NetworkDetails>;

/// The slot a build is anchored to, before missed slots are accounted for.
#[derive(Debug, Clone, Copy)]
enum Target {
    /// The slot of the latest execution block.
    Head,
    /// The last slot of the finalized epoch.
    Finalized,
    Slot(u64),
}

/// The clients used for every read of a build.
struct BuildClients {
    execution: Arc<dyn ExecutionClient>,
    beacon: Arc<dyn BeaconClient>,
}

/// Run a future unless the token is cancelled first.
async fn cancellable<T>(
    cancel: &CancellationToken,
    future: impl Future<Output = Result<T, StateError>>,
) -> Result<T, StateError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(StateError::Cancelled),
        result = future => result,
    }
}

/// Builds and publishes snapshots of the network state.
#[derive(Getters)]
pub struct NetworkStateManager<F: DetailsFetcher> {
    #[getset(get = "pub")]
    tracker: Arc<HealthTracker>,
    #[getset(get = "pub")]
    fetcher: F,
    #[getset(get = "pub")]
    beacon_config: BeaconConfig,
    #[getset(get = "pub")]
    config: StateConfig,
    latest: Mutex<Option<Arc<Snapshot<F>>>>,
}

impl<F: DetailsFetcher> NetworkStateManager<F> {
    /// Create a new manager.
    ///
    /// # Arguments
    ///
    /// * `tracker` - The health tracker handing out the clients to query.
    /// * `fetcher` - Reads the details of the entities.
    /// * `beacon_config` - The timing configuration of the network.
    /// * `config` - Tuning of the builds.
    pub fn new(
        tracker: Arc<HealthTracker>,
        fetcher: F,
        beacon_config: BeaconConfig,
        config: StateConfig,
    ) -> Self {
        Self {
            tracker,
            fetcher,
            beacon_config,
            config,
            latest: Mutex::new(None),
        }
    }

    /// Create a new manager, reading the timing configuration of the network from a synced beacon
    /// client.
    ///
    /// # Errors
    ///
    /// Returns an error if no beacon client is synced or if the configuration could not be read.
    pub async fn connect(
        tracker: Arc<HealthTracker>,
        fetcher: F,
        config: StateConfig,
    ) -> Result<Self, StateError> {
        let beacon = tracker.ready_beacon_client().await?;
        let beacon_config = beacon
            .get_eth2_config()
            .await
            .map_err(client_error!("fetching the Beacon configuration"))?;

        info!(
            "Beacon configuration: genesis at {}, {} seconds per slot, {} slots per epoch",
            beacon_config.genesis_time(),
            beacon_config.seconds_per_slot(),
            beacon_config.slots_per_epoch()
        );

        Ok(Self::new(tracker, fetcher, beacon_config, config))
    }

    /// Get the slot of the latest execution block.
    ///
    /// # Errors
    ///
    /// Returns an error if no execution client is synced, if the block could not be read, or if
    /// its timestamp precedes the genesis.
    pub async fn head_slot(&self) -> Result<u64, StateError> {
        let execution = self.tracker.ready_execution_client().await?;
        self.head_slot_with(execution.as_ref()).await
    }

    /// Get the block proposed at a slot, or at the nearest earlier slot with a block.
    ///
    /// # Errors
    ///
    /// Returns a `StateError::MissingData` if every slot down to the configured floor was missed.
    pub async fn latest_proposed_block(
        &self,
        from_slot: u64,
        cancel: &CancellationToken,
    ) -> Result<BeaconBlock, StateError> {
        cancellable(cancel, async {
            let beacon = self.tracker.ready_beacon_client().await?;
            self.resolve_proposed_block(beacon.as_ref(), from_slot).await
        })
        .await
    }

    /// Get the latest proposed block at or before the slot of the latest execution block.
    pub async fn latest_beacon_block(
        &self,
        cancel: &CancellationToken,
    ) -> Result<BeaconBlock, StateError> {
        cancellable(cancel, async {
            let execution = self.tracker.ready_execution_client().await?;
            let beacon = self.tracker.ready_beacon_client().await?;
            let slot = self.head_slot_with(execution.as_ref()).await?;
            self.resolve_proposed_block(beacon.as_ref(), slot).await
        })
        .await
    }

    /// Get the latest proposed block at or before the last slot of the finalized epoch.
    pub async fn latest_finalized_beacon_block(
        &self,
        cancel: &CancellationToken,
    ) -> Result<BeaconBlock, StateError> {
        cancellable(cancel, async {
            let beacon = self.tracker.ready_beacon_client().await?;
            let slot = self.finalized_slot_with(beacon.as_ref()).await?;
            self.resolve_proposed_block(beacon.as_ref(), slot).await
        })
        .await
    }

    /// Build a snapshot at a slot. Snapshots covering every entity are published as the latest
    /// one, single entity snapshots are only returned.
    ///
    /// # Arguments
    ///
    /// * `target_slot` - The slot to build the snapshot at.
    /// * `filter` - The entities to cover.
    /// * `cancel` - Aborts the build, nothing is published then.
    ///
    /// # Errors
    ///
    /// Returns an error if a client is not ready, if a read failed, if no block was found, or if
    /// the build was cancelled.
    pub async fn build_snapshot(
        &self,
        target_slot: u64,
        filter: EntityFilter,
        cancel: &CancellationToken,
    ) -> Result<Arc<Snapshot<F>>, StateError> {
        self.build_and_publish(Target::Slot(target_slot), filter, cancel)
            .await
    }

    /// Build a snapshot of every entity at the slot of the latest execution block, without
    /// publishing it.
    pub async fn head_state(&self, cancel: &CancellationToken) -> Result<Snapshot<F>, StateError> {
        cancellable(cancel, self.build(Target::Head, EntityFilter::All)).await
    }

    /// Build a snapshot of every entity at the last slot of the finalized epoch, without
    /// publishing it.
    pub async fn finalized_state(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Snapshot<F>, StateError> {
        cancellable(cancel, self.build(Target::Finalized, EntityFilter::All)).await
    }

    /// Build a snapshot of every entity at a slot, without publishing it.
    pub async fn state_for_slot(
        &self,
        slot: u64,
        cancel: &CancellationToken,
    ) -> Result<Snapshot<F>, StateError> {
        cancellable(cancel, self.build(Target::Slot(slot), EntityFilter::All)).await
    }

    /// Build a snapshot of a single entity at the slot of the latest execution block. The
    /// snapshot also holds the network-wide details, and is not published.
    pub async fn head_state_for_entity(
        &self,
        address: Address,
        cancel: &CancellationToken,
    ) -> Result<Arc<Snapshot<F>>, StateError> {
        self.build_and_publish(Target::Head, EntityFilter::Single(address), cancel)
            .await
    }

    /// Build and publish a snapshot of every entity at the slot of the latest execution block.
    pub async fn update_state_to_head(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Arc<Snapshot<F>>, StateError> {
        self.build_and_publish(Target::Head, EntityFilter::All, cancel)
            .await
    }

    /// Build and publish a snapshot of every entity at the last slot of the finalized epoch.
    pub async fn update_state_to_finalized(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Arc<Snapshot<F>>, StateError> {
        self.build_and_publish(Target::Finalized, EntityFilter::All, cancel)
            .await
    }

    /// Build and publish a snapshot of every entity at a slot.
    pub async fn update_state_to_slot(
        &self,
        slot: u64,
        cancel: &CancellationToken,
    ) -> Result<Arc<Snapshot<F>>, StateError> {
        self.build_and_publish(Target::Slot(slot), EntityFilter::All, cancel)
            .await
    }

    /// The latest published snapshot, if any. Never triggers a build.
    pub fn latest_state(&self) -> Option<Arc<Snapshot<F>>> {
        self.latest.lock().clone()
    }

    /// Build a snapshot, and publish it if it covers every entity.
    async fn build_and_publish(
        &self,
        target: Target,
        filter: EntityFilter,
        cancel: &CancellationToken,
    ) -> Result<Arc<Snapshot<F>>, StateError> {
        let snapshot = Arc::new(cancellable(cancel, self.build(target, filter)).await?);

        if filter == EntityFilter::All {
            self.publish(snapshot.clone());
        }

        Ok(snapshot)
    }

    /// Build a snapshot without publishing it. The clients are selected once, and the same ones
    /// serve every read of the build, from the target slot to the entity details.
    async fn build(&self, target: Target, filter: EntityFilter) -> Result<Snapshot<F>, StateError> {
        let clients = BuildClients {
            execution: self.tracker.ready_execution_client().await?,
            beacon: self.tracker.ready_beacon_client().await?,
        };

        let target_slot = match target {
            Target::Head => self.head_slot_with(clients.execution.as_ref()).await?,
            Target::Finalized => self.finalized_slot_with(clients.beacon.as_ref()).await?,
            Target::Slot(slot) => slot,
        };

        self.assemble(&clients, target_slot, filter).await
    }

    fn publish(&self, snapshot: Arc<Snapshot<F>>) {
        info!(
            "Publishing network state at slot {} (target slot {}, execution block {}, {} entities)",
            snapshot.resolved_slot(),
            snapshot.target_slot(),
            snapshot.execution_block_number(),
            snapshot.details().len()
        );

        *self.latest.lock() = Some(snapshot);
    }

    async fn head_slot_with(&self, execution: &dyn ExecutionClient) -> Result<u64, StateError> {
        let header = execution
            .header_by_number(None)
            .await
            .map_err(client_error!("fetching the latest execution block"))?;

        Ok(slot_for_timestamp(header.timestamp(), &self.beacon_config)?)
    }

    async fn finalized_slot_with(&self, beacon: &dyn BeaconClient) -> Result<u64, StateError> {
        let head = beacon
            .get_beacon_head()
            .await
            .map_err(client_error!("fetching the Beacon chain head"))?;

        Ok(finalized_slot_for_epoch(
            head.finalized_epoch(),
            &self.beacon_config,
        )?)
    }

    /// Walk back from `from_slot` to the first slot with a proposed block, stopping at the
    /// configured floor.
    async fn resolve_proposed_block(
        &self,
        beacon: &dyn BeaconClient,
        from_slot: u64,
    ) -> Result<BeaconBlock, StateError> {
        let floor = self.config.slot_floor();

        for slot in (floor..=from_slot).rev() {
            let block = beacon
                .get_beacon_block(slot)
                .await
                .map_err(client_error!(format!("fetching the Beacon block at slot {slot}")))?;

            match block {
                Some(block) => return Ok(block),
                None => info!("Slot {slot} was missing, trying the previous one"),
            }
        }

        Err(StateError::MissingData { from_slot, floor })
    }

    async fn assemble(
        &self,
        clients: &BuildClients,
        target_slot: u64,
        filter: EntityFilter,
    ) -> Result<Snapshot<F>, StateError> {
        let BuildClients { execution, beacon } = clients;

        let block = self
            .resolve_proposed_block(beacon.as_ref(), target_slot)
            .await?;
        let execution_block_number =
            block
                .execution_block_number()
                .ok_or(StateError::MissingExecutionPayload {
                    slot: block.slot(),
                })?;

        debug!(
            "Building network state for slot {target_slot} at slot {} (execution block {execution_block_number})",
            block.slot()
        );

        let addresses = match filter {
            EntityFilter::All => self
                .fetcher
                .entity_addresses(execution.as_ref(), execution_block_number)
                .await
                .map_err(client_error!(format!(
                    "enumerating entities at block {execution_block_number}"
                )))?,
            EntityFilter::Single(address) => vec![address],
        };

        let network_details = async {
            self.fetcher
                .network_details(execution.as_ref(), execution_block_number)
                .await
                .map_err(client_error!(format!(
                    "fetching network details at block {execution_block_number}"
                )))
        };
        let details = fetch_in_batches(
            &self.fetcher,
            execution.as_ref(),
            execution_block_number,
            addresses,
            self.config.batch_size(),
            self.config.max_concurrent_batches(),
        );

        let (network_details, details) = tokio::try_join!(network_details, details)?;

        Ok(NetworkState::new(
            target_slot,
            block,
            self.beacon_config,
            execution_block_number,
            network_details,
            details,
        ))
    }
}
