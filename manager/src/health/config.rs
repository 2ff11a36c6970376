// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

use getset::CopyGetters;
use std::time::Duration;

/// Delay between two probes of a syncing client.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Delay between two full re-evaluations of every instance while waiting.
pub const DEFAULT_STATUS_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Timeout of the requirement gates.
pub const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(16);

/// Maximum age of the latest block of an execution client considered caught up.
pub const DEFAULT_RECENT_BLOCK_THRESHOLD: Duration = Duration::from_secs(5 * 60);

/// Delay between two checks for a contract deployment.
pub const DEFAULT_CONTRACT_POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Polling intervals and timeouts of the [`HealthTracker`](crate::health::HealthTracker).
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct HealthConfig {
    poll_interval: Duration,
    status_refresh_interval: Duration,
    sync_timeout: Duration,
    recent_block_threshold: Duration,
    contract_poll_interval: Duration,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            status_refresh_interval: DEFAULT_STATUS_REFRESH_INTERVAL,
            sync_timeout: DEFAULT_SYNC_TIMEOUT,
            recent_block_threshold: DEFAULT_RECENT_BLOCK_THRESHOLD,
            contract_poll_interval: DEFAULT_CONTRACT_POLL_INTERVAL,
        }
    }
}

impl HealthConfig {
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub const fn with_status_refresh_interval(mut self, status_refresh_interval: Duration) -> Self {
        self.status_refresh_interval = status_refresh_interval;
        self
    }

    /// Set the timeout of the requirement gates. Zero waits indefinitely.
    pub const fn with_sync_timeout(mut self, sync_timeout: Duration) -> Self {
        self.sync_timeout = sync_timeout;
        self
    }

    pub const fn with_recent_block_threshold(mut self, recent_block_threshold: Duration) -> Self {
        self.recent_block_threshold = recent_block_threshold;
        self
    }

    pub const fn with_contract_poll_interval(mut self, contract_poll_interval: Duration) -> Self {
        self.contract_poll_interval = contract_poll_interval;
        self
    }
}
