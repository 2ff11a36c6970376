// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # Block module
//!
//! This module contains the block-related data read from the two backing services. It is divided
//! in two modules, `consensus` and `execution`, one per layer.
//!
//! ## Sub-modules
//!
//! - `consensus`: Proposed beacon blocks, chain head checkpoints and Beacon Node sync status.
//! - `execution`: Execution block headers and execution client sync progress.

pub mod consensus;
pub mod execution;

pub use consensus::{BeaconBlock, BeaconHead, BeaconSyncStatus};
pub use execution::{ExecutionHeader, SyncProgress};
