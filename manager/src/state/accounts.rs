// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # Accounts module
//!
//! A [`DetailsFetcher`] over a fixed set of accounts. The balance and nonce of every account of a
//! batch are read in a single JSON-RPC batch request, and the network-wide details are the header
//! of the snapshot block.

use crate::client::error::ClientError;
use crate::client::ExecutionClient;
use crate::state::fetcher::DetailsFetcher;
use crate::types::rpc::{block_tag, RpcCall};
use async_trait::async_trait;
use ethers_core::types::{Address, U256, U64};
use getset::{CopyGetters, Getters};
use network_state_core::types::block::ExecutionHeader;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

/// The details of an account at a given block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct AccountDetails {
    /// Balance, in wei.
    balance: U256,
    nonce: u64,
}

impl AccountDetails {
    pub const fn new(balance: U256, nonce: u64) -> Self {
        Self { balance, nonce }
    }
}

/// Reads the details of a fixed set of accounts.
#[derive(Debug, Clone, Default, Getters)]
#[getset(get = "pub")]
pub struct AccountFetcher {
    accounts: Vec<Address>,
}

impl AccountFetcher {
    pub fn new(accounts: Vec<Address>) -> Self {
        Self { accounts }
    }
}

/// Decode one value of a batch response.
fn decode<T: DeserializeOwned>(method: &str, value: Value) -> Result<T, ClientError> {
    serde_json::from_value(value).map_err(|err| ClientError::Response {
        endpoint: method.into(),
        source: Box::new(err),
    })
}

#[async_trait]
impl DetailsFetcher for AccountFetcher {
    type Details = AccountDetails;
    type NetworkDetails = ExecutionHeader;

    async fn entity_addresses(
        &self,
        _client: &dyn ExecutionClient,
        _block_number: u64,
    ) -> Result<Vec<Address>, ClientError> {
        Ok(self.accounts.clone())
    }

    async fn network_details(
        &self,
        client: &dyn ExecutionClient,
        block_number: u64,
    ) -> Result<ExecutionHeader, ClientError> {
        client.header_by_number(Some(block_number)).await
    }

    async fn fetch_batch(
        &self,
        client: &dyn ExecutionClient,
        block_number: u64,
        addresses: &[Address],
    ) -> Result<Vec<AccountDetails>, ClientError> {
        let tag = block_tag(Some(block_number));
        let calls = addresses
            .iter()
            .flat_map(|address| {
                [
                    RpcCall::new("eth_getBalance", json!([address, tag])),
                    RpcCall::new("eth_getTransactionCount", json!([address, tag])),
                ]
            })
            .collect::<Vec<_>>();

        let values = client.batch_request(&calls).await?;
        if values.len() != calls.len() {
            return Err(ClientError::Response {
                endpoint: "eth_getBalance".into(),
                source: format!("Expected {} results, got {}", calls.len(), values.len()).into(),
            });
        }

        let mut values = values.into_iter();
        let mut details = Vec::with_capacity(addresses.len());
        while let (Some(balance), Some(nonce)) = (values.next(), values.next()) {
            let balance: U256 = decode("eth_getBalance", balance)?;
            let nonce: U64 = decode("eth_getTransactionCount", nonce)?;
            details.push(AccountDetails::new(balance, nonce.as_u64()));
        }

        Ok(details)
    }
}
