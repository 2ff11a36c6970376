// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # Beacon configuration module
//!
//! The timing parameters of a consensus network. They are fetched once from the Beacon node at
//! startup and never change for the lifetime of the process.

use crate::types::error::ConfigurationError;
use getset::CopyGetters;
use serde::{Deserialize, Serialize};

/// `BeaconConfig` holds the genesis time and slot timing of a consensus network.
///
/// Deserialization goes through [`BeaconConfig::new`], so a decoded configuration is always valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, CopyGetters)]
#[serde(try_from = "RawBeaconConfig")]
#[getset(get_copy = "pub")]
pub struct BeaconConfig {
    /// Unix timestamp of the genesis, in seconds.
    genesis_time: u64,
    /// Duration of a slot, in seconds.
    seconds_per_slot: u64,
    /// Number of slots in an epoch.
    slots_per_epoch: u64,
}

impl BeaconConfig {
    /// Create a new `BeaconConfig`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if `seconds_per_slot` or `slots_per_epoch` is zero, as every
    /// slot computation would be undefined.
    pub fn new(
        genesis_time: u64,
        seconds_per_slot: u64,
        slots_per_epoch: u64,
    ) -> Result<Self, ConfigurationError> {
        if seconds_per_slot == 0 {
            return Err(ConfigurationError::ZeroValue {
                field: "seconds_per_slot".into(),
            });
        }
        if slots_per_epoch == 0 {
            return Err(ConfigurationError::ZeroValue {
                field: "slots_per_epoch".into(),
            });
        }

        Ok(Self {
            genesis_time,
            seconds_per_slot,
            slots_per_epoch,
        })
    }
}

/// Unvalidated form of a [`BeaconConfig`].
#[derive(Deserialize)]
struct RawBeaconConfig {
    genesis_time: u64,
    seconds_per_slot: u64,
    slots_per_epoch: u64,
}

impl TryFrom<RawBeaconConfig> for BeaconConfig {
    type Error = ConfigurationError;

    fn try_from(raw: RawBeaconConfig) -> Result<Self, Self::Error> {
        Self::new(raw.genesis_time, raw.seconds_per_slot, raw.slots_per_epoch)
    }
}
