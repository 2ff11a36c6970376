// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # Execution block module
//!
//! This module contains the data structures read from an execution client: block headers and the
//! sync progress object returned while the client is catching up.

use getset::CopyGetters;
use serde::{Deserialize, Serialize};

/// `ExecutionHeader` is the subset of an execution block header needed to place it in time.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct ExecutionHeader {
    number: u64,
    /// Unix timestamp of the block, in seconds.
    timestamp: u64,
}

impl ExecutionHeader {
    pub const fn new(number: u64, timestamp: u64) -> Self {
        Self { number, timestamp }
    }
}

/// `SyncProgress` is reported by an execution client that considers itself to be syncing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct SyncProgress {
    starting_block: u64,
    current_block: u64,
    highest_block: u64,
}

impl SyncProgress {
    pub const fn new(starting_block: u64, current_block: u64, highest_block: u64) -> Self {
        Self {
            starting_block,
            current_block,
            highest_block,
        }
    }

    /// Fraction of the sync range already processed, clamped to `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        if self.is_complete() {
            return 1.0;
        }
        let total = self.highest_block.saturating_sub(self.starting_block);
        if total == 0 {
            return 0.0;
        }
        let done = self.current_block.saturating_sub(self.starting_block);
        (done as f64 / total as f64).clamp(0.0, 1.0)
    }

    /// Whether the current block has caught up with the highest known block.
    pub const fn is_complete(&self) -> bool {
        self.current_block >= self.highest_block
    }
}
