// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # Requirements module
//!
//! Gates run by tasks before they act on the backing services. The `require_*` variants give up
//! after the configured sync timeout, the `wait_*` variants block until the requirement is met or
//! the wait is cancelled.

use crate::health::error::HealthError;
use crate::health::tracker::HealthTracker;
use crate::health::ClientKind;
use ethers_core::types::Address;
use log::info;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

impl HealthTracker {
    /// Require an execution client to be synced, waiting at most for the configured sync timeout.
    ///
    /// # Errors
    ///
    /// Returns a `HealthError::NotReady` if the timeout elapsed, or any error of the wait.
    pub async fn require_execution_synced(
        &self,
        cancel: &CancellationToken,
    ) -> Result<(), HealthError> {
        self.require_synced(ClientKind::Execution, self.config().sync_timeout(), cancel)
            .await
    }

    /// Require a beacon client to be synced, waiting at most for the configured sync timeout.
    ///
    /// # Errors
    ///
    /// Returns a `HealthError::NotReady` if the timeout elapsed, or any error of the wait.
    pub async fn require_beacon_synced(&self, cancel: &CancellationToken) -> Result<(), HealthError> {
        self.require_synced(ClientKind::Beacon, self.config().sync_timeout(), cancel)
            .await
    }

    /// Wait for an execution client to be synced, without timeout.
    pub async fn wait_execution_synced(&self, cancel: &CancellationToken) -> Result<(), HealthError> {
        self.require_synced(ClientKind::Execution, Duration::ZERO, cancel)
            .await
    }

    /// Wait for a beacon client to be synced, without timeout.
    pub async fn wait_beacon_synced(&self, cancel: &CancellationToken) -> Result<(), HealthError> {
        self.require_synced(ClientKind::Beacon, Duration::ZERO, cancel)
            .await
    }

    /// Require a contract to be deployed at the given address, as seen by a synced execution
    /// client.
    ///
    /// # Errors
    ///
    /// Returns a `HealthError::ContractNotDeployed` if there is no code at the address, or any
    /// error of the sync requirement.
    pub async fn require_contract_deployed(
        &self,
        address: Address,
        cancel: &CancellationToken,
    ) -> Result<(), HealthError> {
        self.require_execution_synced(cancel).await?;

        if self.is_contract_deployed(address, cancel).await? {
            Ok(())
        } else {
            Err(HealthError::ContractNotDeployed { address })
        }
    }

    /// Wait for a contract to be deployed at the given address, checking every
    /// `contract_poll_interval`.
    pub async fn wait_contract_deployed(
        &self,
        address: Address,
        cancel: &CancellationToken,
    ) -> Result<(), HealthError> {
        self.wait_execution_synced(cancel).await?;

        loop {
            if self.is_contract_deployed(address, cancel).await? {
                return Ok(());
            }

            info!(
                "No contract deployed at {address:?} yet, checking again in {:?}",
                self.config().contract_poll_interval()
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(HealthError::Cancelled),
                _ = tokio::time::sleep(self.config().contract_poll_interval()) => {}
            }
        }
    }

    async fn require_synced(
        &self,
        kind: ClientKind,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<(), HealthError> {
        if self.wait_until_synced(kind, timeout, cancel).await? {
            Ok(())
        } else {
            Err(HealthError::NotReady {
                kind,
                waited: timeout,
            })
        }
    }

    async fn is_contract_deployed(
        &self,
        address: Address,
        cancel: &CancellationToken,
    ) -> Result<bool, HealthError> {
        let check = async {
            let endpoint = self
                .ready_endpoint(ClientKind::Execution, self.execution())
                .await?;

            let code = endpoint
                .client()
                .code_at(address, None)
                .await
                .map_err(|source| HealthError::Transport {
                    kind: ClientKind::Execution,
                    role: endpoint.role(),
                    source,
                })?;

            Ok::<_, HealthError>(!code.is_empty())
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(HealthError::Cancelled),
            deployed = check => deployed,
        }
    }
}
