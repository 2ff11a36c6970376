// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # State module
//!
//! This module builds snapshots of the network state. A snapshot is anchored to a single beacon
//! slot: the block proposed at that slot, or the nearest earlier one if the slot was missed, and
//! the details of every tracked entity read at the execution block of that beacon block.
//!
//! ## Sub-modules
//!
//! - `accounts`: A details fetcher reading the balance and nonce of a set of accounts.
//! - `error`: The error type of the module.
//! - `fetcher`: The interface used to read entity details in batches.
//! - `manager`: The snapshot builder, which also publishes the latest snapshot.

use ethers_core::types::Address;
use getset::{CopyGetters, Getters};
use indexmap::IndexMap;
use network_state_core::time::slot_start_time;
use network_state_core::types::block::BeaconBlock;
use network_state_core::types::config::BeaconConfig;
use network_state_core::types::error::ConfigurationError;

pub mod accounts;
pub mod error;
pub mod fetcher;
pub mod manager;

pub use accounts::{AccountDetails, AccountFetcher};
pub use error::StateError;
pub use fetcher::DetailsFetcher;
pub use manager::{NetworkStateManager, Snapshot};

/// Default number of entities read per round trip.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Default number of batches in flight at once.
pub const DEFAULT_MAX_CONCURRENT_BATCHES: usize = 6;

/// The entities a snapshot covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityFilter {
    /// Every entity known at the snapshot block.
    All,
    /// A single entity, along with the network-wide details.
    Single(Address),
}

/// Tuning of the snapshot builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct StateConfig {
    /// Maximum number of entities read per round trip.
    batch_size: usize,
    /// Maximum number of batches in flight at once.
    max_concurrent_batches: usize,
    /// Lowest slot the missing block walk goes down to.
    slot_floor: u64,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_concurrent_batches: DEFAULT_MAX_CONCURRENT_BATCHES,
            slot_floor: 0,
        }
    }
}

impl StateConfig {
    /// Create a new `StateConfig`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError::ZeroValue` if the batch size or the number of concurrent
    /// batches is zero.
    pub fn new(
        batch_size: usize,
        max_concurrent_batches: usize,
        slot_floor: u64,
    ) -> Result<Self, ConfigurationError> {
        if batch_size == 0 {
            return Err(ConfigurationError::ZeroValue {
                field: "batch_size".into(),
            });
        }
        if max_concurrent_batches == 0 {
            return Err(ConfigurationError::ZeroValue {
                field: "max_concurrent_batches".into(),
            });
        }

        Ok(Self {
            batch_size,
            max_concurrent_batches,
            slot_floor,
        })
    }
}

/// A snapshot of the network state, consistent with a single beacon block.
///
/// `D` is the type of the details of one entity, `A` the type of the network-wide details.
#[derive(Debug, Clone, Getters, CopyGetters)]
pub struct NetworkState<D, A> {
    /// The slot the snapshot was requested for.
    #[getset(get_copy = "pub")]
    target_slot: u64,
    /// The block proposed at the target slot, or at the nearest earlier slot with a block.
    #[getset(get = "pub")]
    block: BeaconBlock,
    #[getset(get_copy = "pub")]
    beacon_config: BeaconConfig,
    /// The execution block every detail was read at.
    #[getset(get_copy = "pub")]
    execution_block_number: u64,
    #[getset(get = "pub")]
    network_details: A,
    /// Entity details, in the order the entities were enumerated.
    #[getset(get = "pub")]
    details: IndexMap<Address, D>,
}

impl<D, A> NetworkState<D, A> {
    pub(crate) fn new(
        target_slot: u64,
        block: BeaconBlock,
        beacon_config: BeaconConfig,
        execution_block_number: u64,
        network_details: A,
        details: IndexMap<Address, D>,
    ) -> Self {
        Self {
            target_slot,
            block,
            beacon_config,
            execution_block_number,
            network_details,
            details,
        }
    }

    /// The slot of the block the snapshot is anchored to.
    pub fn resolved_slot(&self) -> u64 {
        self.block.slot()
    }

    /// Whether the target slot was missed and an earlier block was used instead.
    pub fn is_substituted(&self) -> bool {
        self.resolved_slot() != self.target_slot
    }

    pub fn entity(&self, address: &Address) -> Option<&D> {
        self.details.get(address)
    }

    /// The time the anchoring slot started at.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError::Overflow` if the timestamp does not fit in a `u64`.
    pub fn slot_time(&self) -> Result<u64, ConfigurationError> {
        slot_start_time(self.resolved_slot(), &self.beacon_config)
    }
}
