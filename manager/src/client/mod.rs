// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # Client module
//!
//! This module contains the interfaces to the two backing services the manager reads from, along
//! with their HTTP implementations. Every remote call of the crate goes through one of these two
//! traits, which allows a primary and a fallback instance of each service to be used
//! interchangeably.
//!
//! ## Sub-modules
//!
//! - `beacon`: The Beacon Client talks to a Beacon Node through its REST API.
//! - `execution`: The Execution Client talks to an execution node through JSON-RPC.

use crate::client::error::ClientError;
use crate::types::rpc::RpcCall;
use async_trait::async_trait;
use ethers_core::types::{Address, Bytes};
use network_state_core::types::block::{
    BeaconBlock, BeaconHead, BeaconSyncStatus, ExecutionHeader, SyncProgress,
};
use network_state_core::types::config::BeaconConfig;
use serde_json::Value;
use std::fmt::Debug;
use std::time::Duration;

pub mod beacon;
pub mod error;
pub mod execution;

pub use beacon::HttpBeaconClient;
pub use execution::HttpExecutionClient;

/// Timeout of a single request to a backing service.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the HTTP client used to talk to a backing service. Every request fails once
/// `request_timeout` elapsed, so that a node accepting connections without answering cannot stall
/// its callers.
pub(crate) fn http_client(
    address: &str,
    request_timeout: Duration,
) -> Result<reqwest::Client, ClientError> {
    reqwest::Client::builder()
        .timeout(request_timeout)
        .build()
        .map_err(|err| ClientError::Request {
            endpoint: address.to_string(),
            source: Box::new(err),
        })
}

/// Read access to an execution client.
#[async_trait]
pub trait ExecutionClient: Debug + Send + Sync {
    /// Get the header of a block, or of the latest block when `number` is `None`.
    async fn header_by_number(&self, number: Option<u64>) -> Result<ExecutionHeader, ClientError>;

    /// Get the sync progress of the node, `None` if the node does not consider itself syncing.
    async fn sync_progress(&self) -> Result<Option<SyncProgress>, ClientError>;

    /// Get the code deployed at an address, at a given block or the latest one.
    async fn code_at(&self, address: Address, block: Option<u64>) -> Result<Bytes, ClientError>;

    /// Perform several reads in a single round trip. Results are returned in the order of `calls`.
    async fn batch_request(&self, calls: &[RpcCall]) -> Result<Vec<Value>, ClientError>;
}

/// Read access to a Beacon Node.
#[async_trait]
pub trait BeaconClient: Debug + Send + Sync {
    /// Get the timing configuration of the network.
    async fn get_eth2_config(&self) -> Result<BeaconConfig, ClientError>;

    /// Get the checkpoints of the chain head.
    async fn get_beacon_head(&self) -> Result<BeaconHead, ClientError>;

    /// Get the block proposed at a slot, `None` if the slot was missed.
    async fn get_beacon_block(&self, slot: u64) -> Result<Option<BeaconBlock>, ClientError>;

    /// Get the sync status of the node.
    async fn get_sync_status(&self) -> Result<BeaconSyncStatus, ClientError>;
}
