// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # RPC module
//!
//! This module contains the JSON-RPC 2.0 envelopes exchanged with an execution client, and the
//! payloads of the few methods the manager relies on.

use ethers_core::types::U64;
use getset::Getters;
use network_state_core::types::block::{ExecutionHeader, SyncProgress};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Version tag of every JSON-RPC message.
pub const JSONRPC_VERSION: &str = "2.0";

/// Format a block number as a JSON-RPC block tag, `latest` when no number is given.
pub fn block_tag(block: Option<u64>) -> String {
    match block {
        Some(number) => format!("0x{number:x}"),
        None => "latest".to_string(),
    }
}

/// A single read to perform against an execution client. Several calls can be sent in one round
/// trip as a JSON-RPC batch.
#[derive(Debug, Clone, PartialEq, Serialize, Getters)]
#[getset(get = "pub")]
pub struct RpcCall {
    method: String,
    params: Value,
}

impl RpcCall {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }
}

/// Request envelope sent over the wire.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: &'a Value,
}

impl<'a> RpcRequest<'a> {
    pub(crate) fn new(id: u64, call: &'a RpcCall) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            method: &call.method,
            params: &call.params,
        }
    }
}

/// Error object of a failed JSON-RPC call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Response envelope. Exactly one of `result` and `error` is expected to be set.
#[derive(Debug, Clone, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct RpcResponse<T> {
    id: u64,
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

impl<T> RpcResponse<T> {
    /// Split the response into its result, or the error object the node returned.
    pub fn into_result(self) -> Result<Option<T>, RpcErrorObject> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.result),
        }
    }
}

/// Header fields of an `eth_getBlockByNumber` result.
#[derive(Debug, Clone, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct RpcHeader {
    number: U64,
    timestamp: U64,
}

impl From<RpcHeader> for ExecutionHeader {
    fn from(header: RpcHeader) -> Self {
        ExecutionHeader::new(header.number.as_u64(), header.timestamp.as_u64())
    }
}

/// Progress object of an `eth_syncing` result.
#[derive(Debug, Clone, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
#[getset(get = "pub")]
pub struct RpcSyncProgress {
    starting_block: U64,
    current_block: U64,
    highest_block: U64,
}

/// `eth_syncing` returns `false` when the node is not syncing, and a progress object otherwise.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SyncingResult {
    Syncing(RpcSyncProgress),
    NotSyncing(bool),
}

impl From<SyncingResult> for Option<SyncProgress> {
    fn from(result: SyncingResult) -> Self {
        match result {
            SyncingResult::Syncing(progress) => Some(SyncProgress::new(
                progress.starting_block.as_u64(),
                progress.current_block.as_u64(),
                progress.highest_block.as_u64(),
            )),
            SyncingResult::NotSyncing(_) => None,
        }
    }
}
