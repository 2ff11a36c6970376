// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # Tracker module
//!
//! The [`HealthTracker`] owns the instances of both backing services and their last known health.
//!
//! Instances of a service are evaluated in order of precedence:
//! 1. A synced primary is used, the fallback is not probed at all.
//! 2. Otherwise a synced fallback is used.
//! 3. Otherwise the first working instance, primary first, is the one to wait on.
//! 4. Otherwise no instance is usable.
//!
//! Waiting for a service to sync is serialized per service, so that concurrent callers do not
//! each poll a possibly struggling client.

use crate::client::{BeaconClient, ExecutionClient};
use crate::health::config::HealthConfig;
use crate::health::error::HealthError;
use crate::health::probe::{SyncPoll, SyncProbe};
use crate::health::{ClientEndpoint, ClientKind, Endpoints, Health, Role, SyncStatus};
use getset::{CopyGetters, Getters};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Outcome of an evaluation of the instances of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCheck {
    /// The instance with this role is synced and should be queried.
    Ready(Role),
    /// No instance is synced, the instance with this role is working and should be waited on.
    WaitOn(Role),
}

impl StatusCheck {
    pub const fn is_ready(&self) -> bool {
        matches!(self, StatusCheck::Ready(_))
    }
}

/// Same as [`StatusCheck`], holding the selected instance.
enum Selection<'a, C: ?Sized> {
    Ready(&'a ClientEndpoint<C>),
    WaitOn(&'a ClientEndpoint<C>),
}

impl<C: ?Sized> Selection<'_, C> {
    fn status(&self) -> StatusCheck {
        match self {
            Selection::Ready(endpoint) => StatusCheck::Ready(endpoint.role()),
            Selection::WaitOn(endpoint) => StatusCheck::WaitOn(endpoint.role()),
        }
    }
}

/// Last known health of the instances of a service.
#[derive(Debug, Clone, PartialEq, Getters, CopyGetters)]
pub struct StatusReport {
    #[getset(get_copy = "pub")]
    kind: ClientKind,
    #[getset(get = "pub")]
    primary: SyncStatus,
    #[getset(get = "pub")]
    fallback: Option<SyncStatus>,
}

/// Tracks the health of the primary and fallback instances of the execution and beacon clients.
#[derive(Debug, Getters)]
pub struct HealthTracker {
    #[getset(get = "pub")]
    execution: Endpoints<dyn ExecutionClient>,
    #[getset(get = "pub")]
    beacon: Endpoints<dyn BeaconClient>,
    #[getset(get = "pub")]
    config: HealthConfig,
    execution_wait_lock: Mutex<()>,
    beacon_wait_lock: Mutex<()>,
}

impl HealthTracker {
    /// Create a new tracker.
    ///
    /// # Arguments
    ///
    /// * `execution` - The primary and fallback execution clients.
    /// * `beacon` - The primary and fallback beacon clients.
    /// * `config` - Polling intervals and timeouts.
    pub fn new(
        execution: Endpoints<dyn ExecutionClient>,
        beacon: Endpoints<dyn BeaconClient>,
        config: HealthConfig,
    ) -> Self {
        Self {
            execution,
            beacon,
            config,
            execution_wait_lock: Mutex::new(()),
            beacon_wait_lock: Mutex::new(()),
        }
    }

    /// Evaluate the instances of a service, probing them in order of precedence.
    ///
    /// # Errors
    ///
    /// Returns a `HealthError::NoAvailableClient` if no instance is working.
    pub async fn check_status(&self, kind: ClientKind) -> Result<StatusCheck, HealthError> {
        match kind {
            ClientKind::Execution => Ok(self.evaluate(kind, &self.execution).await?.status()),
            ClientKind::Beacon => Ok(self.evaluate(kind, &self.beacon).await?.status()),
        }
    }

    /// Wait until an instance of a service is synced.
    ///
    /// Only one caller polls a given service at a time, others wait for it to be done and then
    /// evaluate the instances again.
    ///
    /// # Arguments
    ///
    /// * `kind` - The service to wait on.
    /// * `timeout` - The maximum time to wait for, zero waits indefinitely.
    /// * `cancel` - Aborts the wait.
    ///
    /// # Returns
    ///
    /// `true` once an instance is synced, `false` if the timeout elapsed first.
    ///
    /// # Errors
    ///
    /// Returns an error if no instance is usable, if probing the waited on instance failed, or if
    /// the wait was cancelled.
    pub async fn wait_until_synced(
        &self,
        kind: ClientKind,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<bool, HealthError> {
        let lock = match kind {
            ClientKind::Execution => &self.execution_wait_lock,
            ClientKind::Beacon => &self.beacon_wait_lock,
        };

        let _guard = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(HealthError::Cancelled),
            guard = lock.lock() => guard,
        };

        let poll = async {
            match kind {
                ClientKind::Execution => self.poll_until_synced(kind, &self.execution).await,
                ClientKind::Beacon => self.poll_until_synced(kind, &self.beacon).await,
            }
        };

        // Probes are raced against the deadline and the token too, so a client that never answers
        // cannot hold the lock past them.
        let bounded = async {
            if timeout.is_zero() {
                return poll.await;
            }

            tokio::time::timeout(timeout, poll)
                .await
                .unwrap_or_else(|_| {
                    warn!("Timed out after {timeout:?} waiting for the {kind} client to sync");
                    Ok(false)
                })
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(HealthError::Cancelled),
            result = bounded => result,
        }
    }

    /// Last known health of the instances of a service. Does not probe anything.
    pub fn status_report(&self, kind: ClientKind) -> StatusReport {
        let (primary, fallback) = match kind {
            ClientKind::Execution => Self::report(&self.execution),
            ClientKind::Beacon => Self::report(&self.beacon),
        };

        StatusReport {
            kind,
            primary,
            fallback,
        }
    }

    /// Get the handle of the execution client to query right now.
    ///
    /// # Errors
    ///
    /// Returns a `HealthError::NotReady` if no instance is synced, or a
    /// `HealthError::NoAvailableClient` if none is working.
    pub async fn ready_execution_client(&self) -> Result<Arc<dyn ExecutionClient>, HealthError> {
        Ok(self
            .ready_endpoint(ClientKind::Execution, &self.execution)
            .await?
            .client()
            .clone())
    }

    /// Get the handle of the beacon client to query right now.
    ///
    /// # Errors
    ///
    /// Returns a `HealthError::NotReady` if no instance is synced, or a
    /// `HealthError::NoAvailableClient` if none is working.
    pub async fn ready_beacon_client(&self) -> Result<Arc<dyn BeaconClient>, HealthError> {
        Ok(self
            .ready_endpoint(ClientKind::Beacon, &self.beacon)
            .await?
            .client()
            .clone())
    }

    pub(crate) async fn ready_endpoint<'a, C>(
        &self,
        kind: ClientKind,
        endpoints: &'a Endpoints<C>,
    ) -> Result<&'a ClientEndpoint<C>, HealthError>
    where
        C: ?Sized + SyncProbe,
    {
        match self.evaluate(kind, endpoints).await? {
            Selection::Ready(endpoint) => Ok(endpoint),
            Selection::WaitOn(_) => Err(HealthError::NotReady {
                kind,
                waited: Duration::ZERO,
            }),
        }
    }

    async fn evaluate<'a, C>(
        &self,
        kind: ClientKind,
        endpoints: &'a Endpoints<C>,
    ) -> Result<Selection<'a, C>, HealthError>
    where
        C: ?Sized + SyncProbe,
    {
        let mut wait_on = None;

        for endpoint in endpoints.iter() {
            let health = endpoint.client().probe_health(&self.config).await;
            endpoint.record(health.clone());
            debug!("{} {kind} client health: {health:?}", endpoint.role());

            match health {
                Health::Synced => {
                    if endpoint.role() == Role::Fallback {
                        warn!("Primary {kind} client is not synced, using the fallback client");
                    }
                    return Ok(Selection::Ready(endpoint));
                }
                Health::Syncing(_) if wait_on.is_none() => wait_on = Some(endpoint),
                _ => {}
            }
        }

        if let Some(endpoint) = wait_on {
            return Ok(Selection::WaitOn(endpoint));
        }

        let error_of = |role| {
            endpoints
                .get(role)
                .and_then(|endpoint| endpoint.health().error())
        };

        Err(HealthError::NoAvailableClient {
            kind,
            primary_error: error_of(Role::Primary).unwrap_or_default(),
            fallback_error: error_of(Role::Fallback),
        })
    }

    /// Poll the instances of a service until one is synced. Neither bounded nor cancellable on its
    /// own, see [`HealthTracker::wait_until_synced`].
    async fn poll_until_synced<C>(
        &self,
        kind: ClientKind,
        endpoints: &Endpoints<C>,
    ) -> Result<bool, HealthError>
    where
        C: ?Sized + SyncProbe,
    {
        let mut last_refresh = Instant::now();
        let mut selection = self.evaluate(kind, endpoints).await?;

        loop {
            let endpoint = match selection {
                Selection::Ready(_) => return Ok(true),
                Selection::WaitOn(endpoint) => endpoint,
            };

            if last_refresh.elapsed() >= self.config.status_refresh_interval() {
                info!("Refreshing the status of the {kind} clients");
                selection = self.evaluate(kind, endpoints).await?;
                last_refresh = Instant::now();
                continue;
            }

            match endpoint.client().poll_synced(&self.config).await {
                Ok(SyncPoll::Synced) => {
                    endpoint.record(Health::Synced);
                    info!("{} {kind} client is synced", endpoint.role());
                    return Ok(true);
                }
                Ok(SyncPoll::Syncing(progress)) => {
                    endpoint.record(Health::Syncing(progress));
                    match progress {
                        Some(progress) => info!(
                            "{} {kind} client is syncing ({:.2}%), waiting",
                            endpoint.role(),
                            progress * 100.0
                        ),
                        None => info!(
                            "{} {kind} client is still catching up with the chain head, waiting",
                            endpoint.role()
                        ),
                    }
                }
                Err(source) => {
                    endpoint.record(Health::Unavailable(source.to_string()));
                    return Err(HealthError::Transport {
                        kind,
                        role: endpoint.role(),
                        source,
                    });
                }
            }

            tokio::time::sleep(self.config.poll_interval()).await;
        }
    }

    fn report<C: ?Sized>(endpoints: &Endpoints<C>) -> (SyncStatus, Option<SyncStatus>) {
        let status_of = |role| {
            endpoints
                .get(role)
                .map(|endpoint| SyncStatus::from(&endpoint.health()))
        };

        (
            status_of(Role::Primary).unwrap_or_else(|| SyncStatus::from(&Health::Unknown)),
            status_of(Role::Fallback),
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::{tracker_with, MockBeaconClient, MockExecutionClient};
    use network_state_core::types::block::{BeaconSyncStatus, SyncProgress};

    fn syncing(current_block: u64) -> Result<Option<SyncProgress>, String> {
        Ok(Some(SyncProgress::new(0, current_block, 100)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_primary_preferred_fallback_not_probed() {
        let primary = Arc::new(MockExecutionClient::synced());
        let fallback = Arc::new(MockExecutionClient::synced());
        let tracker = tracker_with(primary.clone(), Some(fallback.clone()), None);

        assert_eq!(
            tracker.check_status(ClientKind::Execution).await.unwrap(),
            StatusCheck::Ready(Role::Primary)
        );
        assert_eq!(primary.sync_calls(), 1);
        assert_eq!(fallback.sync_calls(), 0);

        let report = tracker.status_report(ClientKind::Execution);
        assert!(report.primary().is_synced());
        assert!(!report.fallback().as_ref().unwrap().is_working());
    }

    #[tokio::test(start_paused = true)]
    async fn test_synced_fallback_is_used() {
        let primary = Arc::new(MockExecutionClient::synced().with_sync_script(vec![syncing(40)]));
        let fallback = Arc::new(MockExecutionClient::synced());
        let tracker = tracker_with(primary, Some(fallback), None);

        assert_eq!(
            tracker.check_status(ClientKind::Execution).await.unwrap(),
            StatusCheck::Ready(Role::Fallback)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_on_first_working_client() {
        let primary = Arc::new(
            MockExecutionClient::synced().with_sync_script(vec![Err("connection refused".into())]),
        );
        let fallback = Arc::new(MockExecutionClient::synced().with_sync_script(vec![syncing(40)]));
        let tracker = tracker_with(primary.clone(), Some(fallback), None);

        assert_eq!(
            tracker.check_status(ClientKind::Execution).await.unwrap(),
            StatusCheck::WaitOn(Role::Fallback)
        );

        primary.set_sync_script(vec![syncing(10)]);
        assert_eq!(
            tracker.check_status(ClientKind::Execution).await.unwrap(),
            StatusCheck::WaitOn(Role::Primary)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_available_client() {
        let primary = Arc::new(
            MockExecutionClient::synced().with_sync_script(vec![Err("primary is down".into())]),
        );
        let fallback = Arc::new(
            MockExecutionClient::synced().with_sync_script(vec![Err("fallback is down".into())]),
        );
        let tracker = tracker_with(primary, Some(fallback), None);

        match tracker.check_status(ClientKind::Execution).await {
            Err(HealthError::NoAvailableClient {
                kind,
                primary_error,
                fallback_error,
            }) => {
                assert_eq!(kind, ClientKind::Execution);
                assert!(primary_error.contains("primary is down"));
                assert!(fallback_error.unwrap().contains("fallback is down"));
            }
            other => panic!("Expected NoAvailableClient, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out_without_error() {
        let primary = Arc::new(MockExecutionClient::synced().with_sync_script(vec![syncing(40)]));
        let tracker = tracker_with(primary, None, None);

        let started = Instant::now();
        let synced = tracker
            .wait_until_synced(
                ClientKind::Execution,
                Duration::from_secs(1),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(!synced);
        // The wait ends at the deadline, not at the next poll.
        assert!(started.elapsed() >= Duration::from_secs(1));
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(tracker.execution_wait_lock.try_lock().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_on_unresponsive_client_times_out() {
        // The status check answers, the next probe never does.
        let primary = Arc::new(
            MockExecutionClient::synced()
                .with_sync_script(vec![syncing(40)])
                .with_hang_after(1),
        );
        let tracker = tracker_with(primary.clone(), None, None);

        let started = Instant::now();
        let synced = tracker
            .wait_until_synced(
                ClientKind::Execution,
                Duration::from_secs(1),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(!synced);
        assert_eq!(primary.sync_calls(), 2);
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(tracker.execution_wait_lock.try_lock().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_on_unresponsive_client_is_cancellable() {
        let primary = Arc::new(
            MockExecutionClient::synced()
                .with_sync_script(vec![syncing(40)])
                .with_hang_after(1),
        );
        let tracker = tracker_with(primary, None, None);
        let cancel = CancellationToken::new();

        let waiter = {
            let tracker = tracker.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tracker
                    .wait_until_synced(ClientKind::Execution, Duration::ZERO, &cancel)
                    .await
            })
        };

        tokio::time::sleep(Duration::from_secs(2)).await;
        cancel.cancel();

        let result = tokio::time::timeout(Duration::from_secs(3600), waiter)
            .await
            .expect("the wait should end once cancelled");
        assert!(matches!(result.unwrap(), Err(HealthError::Cancelled)));

        // Later waiters are not blocked by the abandoned probe.
        assert!(tracker.execution_wait_lock.try_lock().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_indefinitely_until_synced() {
        // Status check, then four fine polls at 40% before the client reports being synced.
        let primary = Arc::new(MockExecutionClient::synced().with_sync_script(vec![
            syncing(40),
            syncing(40),
            syncing(40),
            syncing(40),
            syncing(40),
            Ok(None),
        ]));
        let tracker = tracker_with(primary.clone(), None, None);

        let started = Instant::now();
        let synced = tracker
            .wait_until_synced(ClientKind::Execution, Duration::ZERO, &CancellationToken::new())
            .await
            .unwrap();

        assert!(synced);
        assert_eq!(primary.sync_calls(), 6);
        assert!(started.elapsed() >= Duration::from_secs(20));
        assert!(started.elapsed() < Duration::from_secs(21));

        let primary_health = tracker.execution().get(Role::Primary).unwrap().health();
        assert_eq!(primary_health, Health::Synced);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_detects_fallback_on_refresh() {
        let primary = Arc::new(MockExecutionClient::synced().with_sync_script(vec![syncing(40)]));
        let fallback = Arc::new(
            MockExecutionClient::synced().with_sync_script(vec![Err("fallback is down".into())]),
        );
        let tracker = tracker_with(primary.clone(), Some(fallback.clone()), None);

        let waiter = {
            let tracker = tracker.clone();
            tokio::spawn(async move {
                let cancel = CancellationToken::new();
                tracker
                    .wait_until_synced(ClientKind::Execution, Duration::ZERO, &cancel)
                    .await
            })
        };

        // The fallback comes back while the primary keeps syncing.
        tokio::time::sleep(Duration::from_secs(30)).await;
        fallback.set_sync_script(vec![Ok(None)]);

        assert!(waiter.await.unwrap().unwrap());
        assert_eq!(
            tracker.check_status(ClientKind::Execution).await.unwrap(),
            StatusCheck::Ready(Role::Fallback)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_propagates_transport_errors() {
        let primary = Arc::new(
            MockExecutionClient::synced()
                .with_sync_script(vec![syncing(40), Err("connection reset".into())]),
        );
        let tracker = tracker_with(primary, None, None);

        let result = tracker
            .wait_until_synced(ClientKind::Execution, Duration::ZERO, &CancellationToken::new())
            .await;

        assert!(matches!(
            result,
            Err(HealthError::Transport {
                kind: ClientKind::Execution,
                role: Role::Primary,
                ..
            })
        ));
        // The lock is released on error.
        assert!(tracker.execution_wait_lock.try_lock().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_is_cancellable() {
        let primary = Arc::new(MockExecutionClient::synced().with_sync_script(vec![syncing(40)]));
        let tracker = tracker_with(primary, None, None);
        let cancel = CancellationToken::new();

        let waiter = {
            let tracker = tracker.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tracker
                    .wait_until_synced(ClientKind::Execution, Duration::ZERO, &cancel)
                    .await
            })
        };

        tokio::time::sleep(Duration::from_secs(12)).await;
        cancel.cancel();

        assert!(matches!(
            waiter.await.unwrap(),
            Err(HealthError::Cancelled)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_waiters_are_serialized() {
        let beacon = Arc::new(MockBeaconClient::synced().with_sync_script(vec![
            Ok(BeaconSyncStatus::new(true, 10, 90)),
            Ok(BeaconSyncStatus::new(true, 50, 50)),
            Ok(BeaconSyncStatus::new(false, 100, 0)),
        ]));
        let tracker = tracker_with(
            Arc::new(MockExecutionClient::synced()),
            None,
            Some(beacon.clone()),
        );

        let waiters = (0..3)
            .map(|_| {
                let tracker = tracker.clone();
                tokio::spawn(async move {
                    let cancel = CancellationToken::new();
                    tracker
                        .wait_until_synced(ClientKind::Beacon, Duration::ZERO, &cancel)
                        .await
                })
            })
            .collect::<Vec<_>>();

        for waiter in waiters {
            assert!(waiter.await.unwrap().unwrap());
        }

        assert_eq!(beacon.max_in_flight(), 1);
        // The first waiter polls three times, the two others find the client synced right away.
        assert_eq!(beacon.sync_calls(), 5);
    }
}
