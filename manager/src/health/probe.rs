// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # Probe module
//!
//! The sync probes run against each kind of backing client. A probe comes in two flavors:
//! - [`SyncProbe::poll_synced`] is the fine-grained probe used while waiting on a client. Transport
//!   errors are returned as such, since they say nothing about the sync state of the client.
//! - [`SyncProbe::probe_health`] is the coarse probe used to rank instances. Transport errors mark
//!   the instance as unavailable.

use crate::client::error::ClientError;
use crate::client::{BeaconClient, ExecutionClient};
use crate::health::config::HealthConfig;
use crate::health::Health;
use async_trait::async_trait;
use network_state_core::time::is_within_threshold;
use std::time::{SystemTime, UNIX_EPOCH};

/// Outcome of a successful sync probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyncPoll {
    Syncing(Option<f64>),
    Synced,
}

impl From<SyncPoll> for Health {
    fn from(poll: SyncPoll) -> Self {
        match poll {
            SyncPoll::Syncing(progress) => Health::Syncing(progress),
            SyncPoll::Synced => Health::Synced,
        }
    }
}

/// Sync probing of a backing client.
#[async_trait]
pub trait SyncProbe: Send + Sync {
    /// Probe the sync state of the client.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the client could not be reached.
    async fn poll_synced(&self, config: &HealthConfig) -> Result<SyncPoll, ClientError>;

    /// Probe the health of the client, folding transport errors into [`Health::Unavailable`].
    async fn probe_health(&self, config: &HealthConfig) -> Health {
        match self.poll_synced(config).await {
            Ok(poll) => poll.into(),
            Err(err) => Health::Unavailable(err.to_string()),
        }
    }
}

/// Current Unix time in seconds.
pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

#[async_trait]
impl SyncProbe for dyn ExecutionClient {
    async fn poll_synced(&self, config: &HealthConfig) -> Result<SyncPoll, ClientError> {
        match self.sync_progress().await? {
            Some(progress) if !progress.is_complete() => {
                Ok(SyncPoll::Syncing(Some(progress.fraction())))
            }
            // Some clients stop reporting progress slightly before reaching the head of the
            // chain, so the age of their latest block decides.
            _ => {
                let latest = self.header_by_number(None).await?;

                if is_within_threshold(
                    latest.timestamp(),
                    unix_now(),
                    config.recent_block_threshold(),
                ) {
                    Ok(SyncPoll::Synced)
                } else {
                    Ok(SyncPoll::Syncing(None))
                }
            }
        }
    }
}

#[async_trait]
impl SyncProbe for dyn BeaconClient {
    async fn poll_synced(&self, _config: &HealthConfig) -> Result<SyncPoll, ClientError> {
        let status = self.get_sync_status().await?;

        if status.syncing() {
            Ok(SyncPoll::Syncing(Some(status.progress())))
        } else {
            Ok(SyncPoll::Synced)
        }
    }
}
