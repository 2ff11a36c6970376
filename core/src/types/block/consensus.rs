// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # Consensus block module
//!
//! This module contains the data structures read from the Beacon Node: proposed blocks, the chain
//! head checkpoints and the node's own sync status.

use ethers_core::types::Address;
use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};

/// `BeaconBlock` is the subset of a proposed beacon block that snapshots are anchored to.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, CopyGetters)]
pub struct BeaconBlock {
    #[getset(get_copy = "pub")]
    slot: u64,
    #[getset(get_copy = "pub")]
    proposer_index: u64,
    /// Execution block number from the execution payload, absent before the merge.
    #[getset(get_copy = "pub")]
    execution_block_number: Option<u64>,
    /// Fee recipient from the execution payload, absent before the merge.
    #[getset(get = "pub")]
    fee_recipient: Option<Address>,
}

impl BeaconBlock {
    pub const fn new(
        slot: u64,
        proposer_index: u64,
        execution_block_number: Option<u64>,
        fee_recipient: Option<Address>,
    ) -> Self {
        Self {
            slot,
            proposer_index,
            execution_block_number,
            fee_recipient,
        }
    }

    /// Whether the block carries an execution payload.
    pub const fn has_execution_payload(&self) -> bool {
        self.execution_block_number.is_some()
    }
}

/// `BeaconHead` holds the checkpoints of the chain head as seen by the Beacon Node.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct BeaconHead {
    finalized_epoch: u64,
    justified_epoch: u64,
    previous_justified_epoch: u64,
}

impl BeaconHead {
    pub const fn new(
        finalized_epoch: u64,
        justified_epoch: u64,
        previous_justified_epoch: u64,
    ) -> Self {
        Self {
            finalized_epoch,
            justified_epoch,
            previous_justified_epoch,
        }
    }
}

/// `BeaconSyncStatus` is the response of a Beacon Node to a sync status query.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct BeaconSyncStatus {
    syncing: bool,
    head_slot: u64,
    sync_distance: u64,
}

impl BeaconSyncStatus {
    pub const fn new(syncing: bool, head_slot: u64, sync_distance: u64) -> Self {
        Self {
            syncing,
            head_slot,
            sync_distance,
        }
    }

    /// Sync progress in `[0, 1]`, computed as the head slot over the slot the node is syncing to.
    pub fn progress(&self) -> f64 {
        let target = self.head_slot.saturating_add(self.sync_distance);
        if target == 0 {
            return 0.0;
        }
        self.head_slot as f64 / target as f64
    }
}
