// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # Fetcher module
//!
//! The [`DetailsFetcher`] trait is the batched field-population capability the snapshot builder
//! relies on. The builder enumerates the entities, splits them in batches of at most `batch_size`
//! addresses, and asks the fetcher to read each batch in a single round trip.

use crate::client::error::ClientError;
use crate::client::ExecutionClient;
use crate::state::error::{client_error, StateError};
use async_trait::async_trait;
use ethers_core::types::Address;
use futures::stream::{self, StreamExt, TryStreamExt};
use indexmap::{IndexMap, IndexSet};
use std::fmt::Debug;

/// Reads the details of the entities of a snapshot. Every read is made at the given execution
/// block number.
#[async_trait]
pub trait DetailsFetcher: Send + Sync {
    /// Details of one entity.
    type Details: Debug + Clone + Send + Sync + 'static;
    /// Network-wide details.
    type NetworkDetails: Debug + Clone + Send + Sync + 'static;

    /// Enumerate the entities known at a block.
    async fn entity_addresses(
        &self,
        client: &dyn ExecutionClient,
        block_number: u64,
    ) -> Result<Vec<Address>, ClientError>;

    /// Read the network-wide details at a block.
    async fn network_details(
        &self,
        client: &dyn ExecutionClient,
        block_number: u64,
    ) -> Result<Self::NetworkDetails, ClientError>;

    /// Read the details of a batch of entities at a block, in the order of `addresses`.
    async fn fetch_batch(
        &self,
        client: &dyn ExecutionClient,
        block_number: u64,
        addresses: &[Address],
    ) -> Result<Vec<Self::Details>, ClientError>;
}

/// Read the details of a set of entities, at most `batch_size` per call to the fetcher and at most
/// `max_concurrent_batches` calls in flight.
///
/// # Returns
///
/// The details keyed by address, in the order the addresses were given. Duplicate addresses are
/// only read once.
///
/// # Errors
///
/// Returns an error if a batch could not be read, or if the fetcher returned a different number of
/// details than the number of addresses it was given.
pub async fn fetch_in_batches<F: DetailsFetcher + ?Sized>(
    fetcher: &F,
    client: &dyn ExecutionClient,
    block_number: u64,
    addresses: Vec<Address>,
    batch_size: usize,
    max_concurrent_batches: usize,
) -> Result<IndexMap<Address, F::Details>, StateError> {
    let addresses = addresses
        .into_iter()
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect::<Vec<_>>();

    // Collected up front, a lazy `Chunks` iterator would keep the stream from being `Send`.
    let batches = addresses
        .chunks(batch_size.max(1))
        .map(|batch| async move {
            let details = fetcher
                .fetch_batch(client, block_number, batch)
                .await
                .map_err(client_error!(format!(
                    "fetching the details of {} entities at block {block_number}",
                    batch.len()
                )))?;

            if details.len() != batch.len() {
                return Err(StateError::Client {
                    context: format!("fetching entity details at block {block_number}"),
                    source: ClientError::Response {
                        endpoint: "batch".into(),
                        source: format!(
                            "Expected details for {} entities, got {}",
                            batch.len(),
                            details.len()
                        )
                        .into(),
                    },
                });
            }

            Ok(batch.iter().copied().zip(details).collect::<Vec<_>>())
        })
        .collect::<Vec<_>>();

    let batches = stream::iter(batches)
        .buffered(max_concurrent_batches.max(1))
        .try_collect::<Vec<_>>()
        .await?;

    Ok(batches.into_iter().flatten().collect())
}
