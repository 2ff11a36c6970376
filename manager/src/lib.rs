// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # Network State
//!
//! This crate provides a consistent view of an Ethereum network built on top of two independently
//! operated backing services: an execution client and a Beacon Node. Each of them may be
//! unavailable, syncing or lagging, and each may have a fallback instance configured.
//!
//! ## Binaries
//!
//! - `state-daemon`: Keeps the latest network state up to date on a schedule and reports on it.
//!
//! ## Library
//!
//! The library has the following modules:
//! - [`client`]: The interfaces to the backing services, and their HTTP implementations.
//! - [`health`]: Decides which instance of a backing service is safe to query, and waits for
//!   instances to sync.
//! - [`state`]: Builds snapshots of the network state anchored to a single beacon slot, and
//!   publishes the latest one.
//! - [`types`]: The payloads exchanged with the backing services.
//! - [`utils`]: Parsing helpers for the configuration of the binaries.
//!
//! For more detailed information, users should refer to the specific documentation for each
//! sub-module.

pub mod client;
pub mod health;
pub mod state;
pub mod types;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_utils;
