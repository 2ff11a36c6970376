// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # Beacon module
//!
//! This module contains the JSON payloads returned by the Beacon Node REST API, and their
//! conversion into the core types. Integers are transmitted as quoted decimal strings.
//!
//! Reference: [the Beacon Node API](https://ethereum.github.io/beacon-APIs/).

use ethers_core::types::Address;
use getset::Getters;
use network_state_core::types::block::{BeaconBlock, BeaconHead, BeaconSyncStatus};
use serde::Deserialize;

/// Every Beacon Node API response wraps its payload in a `data` field.
#[derive(Debug, Clone, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct DataResponse<T> {
    data: T,
}

impl<T> DataResponse<T> {
    pub fn into_data(self) -> T {
        self.data
    }
}

/// Payload of `/eth/v1/beacon/genesis`.
#[derive(Debug, Clone, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct Genesis {
    #[serde(with = "quoted_u64")]
    genesis_time: u64,
}

/// Payload of `/eth/v1/config/spec`, restricted to the timing parameters.
#[derive(Debug, Clone, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct Spec {
    #[serde(rename = "SECONDS_PER_SLOT", with = "quoted_u64")]
    seconds_per_slot: u64,
    #[serde(rename = "SLOTS_PER_EPOCH", with = "quoted_u64")]
    slots_per_epoch: u64,
}

/// A checkpoint of the chain, only its epoch is needed.
#[derive(Debug, Clone, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct Checkpoint {
    #[serde(with = "quoted_u64")]
    epoch: u64,
}

/// Payload of `/eth/v1/beacon/states/{state_id}/finality_checkpoints`.
#[derive(Debug, Clone, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct FinalityCheckpoints {
    previous_justified: Checkpoint,
    current_justified: Checkpoint,
    finalized: Checkpoint,
}

impl From<FinalityCheckpoints> for BeaconHead {
    fn from(checkpoints: FinalityCheckpoints) -> Self {
        BeaconHead::new(
            checkpoints.finalized.epoch,
            checkpoints.current_justified.epoch,
            checkpoints.previous_justified.epoch,
        )
    }
}

/// Payload of `/eth/v2/beacon/blocks/{block_id}`.
#[derive(Debug, Clone, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct SignedBlock {
    message: BlockMessage,
}

#[derive(Debug, Clone, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct BlockMessage {
    #[serde(with = "quoted_u64")]
    slot: u64,
    #[serde(with = "quoted_u64")]
    proposer_index: u64,
    body: BlockBody,
}

#[derive(Debug, Clone, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct BlockBody {
    /// Absent for blocks proposed before the merge.
    #[serde(default)]
    execution_payload: Option<ExecutionPayload>,
}

#[derive(Debug, Clone, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct ExecutionPayload {
    #[serde(with = "quoted_u64")]
    block_number: u64,
    fee_recipient: Address,
}

impl From<SignedBlock> for BeaconBlock {
    fn from(block: SignedBlock) -> Self {
        let BlockMessage {
            slot,
            proposer_index,
            body,
        } = block.message;

        match body.execution_payload {
            Some(payload) => BeaconBlock::new(
                slot,
                proposer_index,
                Some(payload.block_number),
                Some(payload.fee_recipient),
            ),
            None => BeaconBlock::new(slot, proposer_index, None, None),
        }
    }
}

/// Payload of `/eth/v1/node/syncing`.
#[derive(Debug, Clone, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct Syncing {
    #[serde(with = "quoted_u64")]
    head_slot: u64,
    #[serde(with = "quoted_u64")]
    sync_distance: u64,
    is_syncing: bool,
}

impl From<Syncing> for BeaconSyncStatus {
    fn from(syncing: Syncing) -> Self {
        BeaconSyncStatus::new(syncing.is_syncing, syncing.head_slot, syncing.sync_distance)
    }
}

/// Serde helper for integers encoded as decimal strings.
mod quoted_u64 {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        value.parse::<u64>().map_err(D::Error::custom)
    }
}
