// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # Execution client module
//!
//! This module contains the client for an execution node. It is responsible for fetching block
//! headers, the sync progress of the node, deployed code, and for batching arbitrary reads in a
//! single round trip.
//!
//! It maintains an internal HTTP client to handle communication with the JSON-RPC endpoint.

use crate::client::error::ClientError;
use crate::client::{http_client, ExecutionClient};
use crate::types::rpc::{block_tag, RpcCall, RpcHeader, RpcRequest, RpcResponse, SyncingResult};
use async_trait::async_trait;
use ethers_core::types::{Address, Bytes};
use getset::Getters;
use network_state_core::types::block::{ExecutionHeader, SyncProgress};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;

/// A client to handle communication with an execution node.
#[derive(Debug, Clone, Getters)]
#[getset(get = "pub")]
pub struct HttpExecutionClient {
    /// The address of the JSON-RPC endpoint.
    rpc_provider_address: String,
    /// The inner HTTP client.
    inner: Client,
}

impl HttpExecutionClient {
    /// Create a new client with the given address.
    ///
    /// # Arguments
    ///
    /// * `rpc_provider_address` - The address of the JSON-RPC endpoint.
    /// * `request_timeout` - The maximum duration of a request.
    ///
    /// # Returns
    ///
    /// A new `HttpExecutionClient`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client could not be built.
    pub fn new(rpc_provider_address: &str, request_timeout: Duration) -> Result<Self, ClientError> {
        Ok(Self {
            rpc_provider_address: rpc_provider_address.to_string(),
            inner: http_client(rpc_provider_address, request_timeout)?,
        })
    }

    /// `post` sends a JSON body to the JSON-RPC endpoint and deserializes the response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is not successful or properly formatted.
    async fn post<B: serde::Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        // Send the HTTP request
        let response = self
            .inner
            .post(&self.rpc_provider_address)
            .header(CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await
            .map_err(|err| ClientError::Request {
                endpoint: endpoint.into(),
                source: Box::new(err),
            })?;

        if !response.status().is_success() {
            return Err(ClientError::Request {
                endpoint: endpoint.into(),
                source: format!(
                    "Request not successful, got HTTP code {}",
                    response.status().as_str()
                )
                .into(),
            });
        }

        // Deserialize the response
        response.json().await.map_err(|err| ClientError::Response {
            endpoint: endpoint.into(),
            source: Box::new(err),
        })
    }

    /// `call` performs a single JSON-RPC call.
    ///
    /// # Returns
    ///
    /// The result of the call, `None` if the node returned `null`.
    async fn call<T: DeserializeOwned>(&self, call: &RpcCall) -> Result<Option<T>, ClientError> {
        let response: RpcResponse<T> = self
            .post(call.method(), &RpcRequest::new(1, call))
            .await?;

        response
            .into_result()
            .map_err(|err| ClientError::Rpc {
                endpoint: call.method().clone(),
                code: *err.code(),
                message: err.message().clone(),
            })
    }
}

#[async_trait]
impl ExecutionClient for HttpExecutionClient {
    async fn header_by_number(&self, number: Option<u64>) -> Result<ExecutionHeader, ClientError> {
        let call = RpcCall::new("eth_getBlockByNumber", json!([block_tag(number), false]));
        let header: RpcHeader =
            self.call(&call)
                .await?
                .ok_or_else(|| ClientError::Response {
                    endpoint: call.method().clone(),
                    source: format!("Block {} not found", block_tag(number)).into(),
                })?;

        Ok(header.into())
    }

    async fn sync_progress(&self) -> Result<Option<SyncProgress>, ClientError> {
        let call = RpcCall::new("eth_syncing", json!([]));
        let result: Option<SyncingResult> = self.call(&call).await?;

        Ok(result.and_then(Option::<SyncProgress>::from))
    }

    async fn code_at(&self, address: Address, block: Option<u64>) -> Result<Bytes, ClientError> {
        let call = RpcCall::new("eth_getCode", json!([address, block_tag(block)]));
        let code: Option<Bytes> = self.call(&call).await?;

        Ok(code.unwrap_or_default())
    }

    async fn batch_request(&self, calls: &[RpcCall]) -> Result<Vec<Value>, ClientError> {
        if calls.is_empty() {
            return Ok(Vec::new());
        }

        let requests = calls
            .iter()
            .enumerate()
            .map(|(id, call)| RpcRequest::new(id as u64, call))
            .collect::<Vec<_>>();
        let endpoint = format!("batch of {} calls", calls.len());

        let responses: Vec<RpcResponse<Value>> = self.post(&endpoint, &requests).await?;

        // Nodes may answer a batch in any order, match responses back through their id.
        let mut by_id = HashMap::with_capacity(responses.len());
        for response in responses {
            by_id.insert(*response.id(), response);
        }

        calls
            .iter()
            .enumerate()
            .map(|(id, call)| {
                let response = by_id
                    .remove(&(id as u64))
                    .ok_or_else(|| ClientError::Response {
                        endpoint: endpoint.clone(),
                        source: format!("Missing response for call {id} ({})", call.method())
                            .into(),
                    })?;

                response
                    .into_result()
                    .map(|result| result.unwrap_or(Value::Null))
                    .map_err(|err| ClientError::Rpc {
                        endpoint: call.method().clone(),
                        code: *err.code(),
                        message: err.message().clone(),
                    })
            })
            .collect()
    }
}
