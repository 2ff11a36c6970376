// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # Time module
//!
//! Conversions between wall-clock time, execution block timestamps and Beacon slot numbers. All
//! functions are pure and only depend on a [`BeaconConfig`].

use crate::overflow_error;
use crate::types::config::BeaconConfig;
use crate::types::error::ConfigurationError;
use std::time::Duration;

/// Get the slot a timestamp falls in, `floor((timestamp - genesis_time) / seconds_per_slot)`.
///
/// # Arguments
///
/// * `timestamp` - Unix timestamp in seconds, e.g. the timestamp of an execution block.
/// * `config` - The Beacon configuration of the network.
///
/// # Errors
///
/// Returns a `ConfigurationError::ClockSkew` if the timestamp precedes the genesis time.
pub fn slot_for_timestamp(timestamp: u64, config: &BeaconConfig) -> Result<u64, ConfigurationError> {
    let seconds_since_genesis = timestamp.checked_sub(config.genesis_time()).ok_or(
        ConfigurationError::ClockSkew {
            timestamp,
            genesis_time: config.genesis_time(),
        },
    )?;

    Ok(seconds_since_genesis / config.seconds_per_slot())
}

/// Get the last slot of an epoch. An epoch is finalized once its last slot is justified, so this is
/// the slot a finalized state is read at.
///
/// # Errors
///
/// Returns a `ConfigurationError::Overflow` if the slot does not fit in a `u64`.
pub fn finalized_slot_for_epoch(epoch: u64, config: &BeaconConfig) -> Result<u64, ConfigurationError> {
    epoch
        .checked_mul(config.slots_per_epoch())
        .and_then(|first_slot| first_slot.checked_add(config.slots_per_epoch() - 1))
        .ok_or(overflow_error!("finalized slot for epoch"))
}

/// Get the epoch a slot belongs to.
pub fn epoch_for_slot(slot: u64, config: &BeaconConfig) -> u64 {
    slot / config.slots_per_epoch()
}

/// Get the Unix timestamp at which a slot starts.
///
/// # Errors
///
/// Returns a `ConfigurationError::Overflow` if the timestamp does not fit in a `u64`.
pub fn slot_start_time(slot: u64, config: &BeaconConfig) -> Result<u64, ConfigurationError> {
    slot.checked_mul(config.seconds_per_slot())
        .and_then(|seconds| seconds.checked_add(config.genesis_time()))
        .ok_or(overflow_error!("slot start time"))
}

/// Check that a block timestamp is within `threshold` of the current time. Blocks from the future
/// are considered recent.
pub fn is_within_threshold(block_timestamp: u64, now: u64, threshold: Duration) -> bool {
    now.saturating_sub(block_timestamp) < threshold.as_secs()
}
