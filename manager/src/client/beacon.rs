// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # Beacon client module
//!
//! This module contains the client for the Beacon Node API. It is responsible for fetching the
//! network configuration, the chain head checkpoints, proposed blocks and the node sync status.
//!
//! It maintains an internal HTTP client to handle communication with the Beacon Node.

use crate::client::error::ClientError;
use crate::client::{http_client, BeaconClient};
use crate::types::beacon::{
    DataResponse, FinalityCheckpoints, Genesis, SignedBlock, Spec, Syncing,
};
use async_trait::async_trait;
use getset::Getters;
use network_state_core::types::block::{BeaconBlock, BeaconHead, BeaconSyncStatus};
use network_state_core::types::config::BeaconConfig;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// A client to handle communication with a Beacon Node.
#[derive(Debug, Clone, Getters)]
#[getset(get = "pub")]
pub struct HttpBeaconClient {
    /// The address of the Beacon Node API.
    beacon_node_address: String,
    /// The inner HTTP client.
    inner: Client,
}

impl HttpBeaconClient {
    /// Create a new client with the given address.
    ///
    /// # Arguments
    ///
    /// * `beacon_node_address` - The address of the Beacon Node API.
    /// * `request_timeout` - The maximum duration of a request.
    ///
    /// # Returns
    ///
    /// A new `HttpBeaconClient`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client could not be built.
    pub fn new(beacon_node_address: &str, request_timeout: Duration) -> Result<Self, ClientError> {
        Ok(Self {
            beacon_node_address: beacon_node_address.trim_end_matches('/').to_string(),
            inner: http_client(beacon_node_address, request_timeout)?,
        })
    }

    /// `get_data` makes an HTTP GET request to the Beacon Node API and deserializes the `data`
    /// field of the response.
    ///
    /// # Arguments
    ///
    /// * `path` - The path of the endpoint, starting with `/`.
    ///
    /// # Returns
    ///
    /// The payload, or `None` if the node answered with HTTP 404.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is not successful or properly formatted.
    async fn get_data<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ClientError> {
        // Format the endpoint for the call
        let url = format!("{}{}", self.beacon_node_address, path);

        // Send the HTTP request
        let response = self
            .inner
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| ClientError::Request {
                endpoint: url.clone(),
                source: Box::new(err),
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(ClientError::Request {
                endpoint: url,
                source: format!(
                    "Request not successful, got HTTP code {}",
                    response.status().as_str()
                )
                .into(),
            });
        }

        // Deserialize the response
        let response: DataResponse<T> =
            response.json().await.map_err(|err| ClientError::Response {
                endpoint: url.clone(),
                source: Box::new(err),
            })?;

        Ok(Some(response.into_data()))
    }

    /// Same as `get_data`, but a missing resource is an error.
    async fn get_required_data<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.get_data(path)
            .await?
            .ok_or_else(|| ClientError::Response {
                endpoint: format!("{}{}", self.beacon_node_address, path),
                source: "Resource not found, got HTTP code 404".into(),
            })
    }
}

#[async_trait]
impl BeaconClient for HttpBeaconClient {
    async fn get_eth2_config(&self) -> Result<BeaconConfig, ClientError> {
        let (genesis, spec) = tokio::try_join!(
            self.get_required_data::<Genesis>("/eth/v1/beacon/genesis"),
            self.get_required_data::<Spec>("/eth/v1/config/spec"),
        )?;

        BeaconConfig::new(
            *genesis.genesis_time(),
            *spec.seconds_per_slot(),
            *spec.slots_per_epoch(),
        )
        .map_err(|err| ClientError::Response {
            endpoint: format!("{}/eth/v1/config/spec", self.beacon_node_address),
            source: Box::new(err),
        })
    }

    async fn get_beacon_head(&self) -> Result<BeaconHead, ClientError> {
        let checkpoints: FinalityCheckpoints = self
            .get_required_data("/eth/v1/beacon/states/head/finality_checkpoints")
            .await?;

        Ok(checkpoints.into())
    }

    async fn get_beacon_block(&self, slot: u64) -> Result<Option<BeaconBlock>, ClientError> {
        let block: Option<SignedBlock> = self
            .get_data(&format!("/eth/v2/beacon/blocks/{slot}"))
            .await?;

        Ok(block.map(BeaconBlock::from))
    }

    async fn get_sync_status(&self) -> Result<BeaconSyncStatus, ClientError> {
        let syncing: Syncing = self.get_required_data("/eth/v1/node/syncing").await?;

        Ok(syncing.into())
    }
}
