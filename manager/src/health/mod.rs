// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # Health module
//!
//! This module decides which instance of a backing service is safe to query at any given moment.
//! Each service, execution and beacon, is configured with a primary instance and an optional
//! fallback one. The [`HealthTracker`] probes them in that order, picks the first synced one, and
//! implements bounded waiting for a syncing instance to catch up.
//!
//! ## Sub-modules
//!
//! - `config`: Polling intervals and timeouts of the tracker.
//! - `error`: The error type of the module.
//! - `probe`: The sync probes run against each kind of client.
//! - `requirements`: Gates used by tasks before they act on the backing services.
//! - `tracker`: The tracker itself.

use getset::{CopyGetters, Getters};
use parking_lot::Mutex;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub mod config;
pub mod error;
pub mod probe;
pub mod requirements;
pub mod tracker;

pub use config::HealthConfig;
pub use error::HealthError;
pub use probe::{SyncPoll, SyncProbe};
pub use tracker::{HealthTracker, StatusCheck, StatusReport};

/// The kind of backing service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientKind {
    Execution,
    Beacon,
}

impl Display for ClientKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientKind::Execution => write!(f, "execution"),
            ClientKind::Beacon => write!(f, "beacon"),
        }
    }
}

/// The role of an instance of a backing service. Primaries are always preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Primary,
    Fallback,
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Primary => write!(f, "primary"),
            Role::Fallback => write!(f, "fallback"),
        }
    }
}

/// Last known health of an instance.
#[derive(Debug, Clone, PartialEq)]
pub enum Health {
    /// Never probed.
    Unknown,
    /// Reachable but catching up, with its progress in `[0, 1]` when the client reports one.
    Syncing(Option<f64>),
    Synced,
    /// The last probe failed with the given reason.
    Unavailable(String),
}

impl Health {
    /// Whether the instance answered its last probe.
    pub const fn is_working(&self) -> bool {
        matches!(self, Health::Syncing(_) | Health::Synced)
    }

    pub const fn is_synced(&self) -> bool {
        matches!(self, Health::Synced)
    }

    /// The reason the instance is not usable, if any.
    pub fn error(&self) -> Option<String> {
        match self {
            Health::Unknown => Some("client has not been probed yet".to_string()),
            Health::Unavailable(reason) => Some(reason.clone()),
            Health::Syncing(_) | Health::Synced => None,
        }
    }
}

/// A point in time read of the health of an instance, as exposed to consumers.
#[derive(Debug, Clone, PartialEq, Getters, CopyGetters)]
pub struct SyncStatus {
    #[getset(get_copy = "pub")]
    is_working: bool,
    #[getset(get_copy = "pub")]
    is_synced: bool,
    #[getset(get_copy = "pub")]
    sync_progress: Option<f64>,
    #[getset(get = "pub")]
    error: Option<String>,
}

impl From<&Health> for SyncStatus {
    fn from(health: &Health) -> Self {
        let sync_progress = match health {
            Health::Syncing(progress) => *progress,
            Health::Synced => Some(1.0),
            Health::Unknown | Health::Unavailable(_) => None,
        };

        Self {
            is_working: health.is_working(),
            is_synced: health.is_synced(),
            sync_progress,
            error: health.error(),
        }
    }
}

/// One configured instance of a backing service.
#[derive(Debug)]
pub struct ClientEndpoint<C: ?Sized> {
    role: Role,
    client: Arc<C>,
    health: Mutex<Health>,
}

impl<C: ?Sized> ClientEndpoint<C> {
    pub fn new(role: Role, client: Arc<C>) -> Self {
        Self {
            role,
            client,
            health: Mutex::new(Health::Unknown),
        }
    }

    pub const fn role(&self) -> Role {
        self.role
    }

    pub const fn client(&self) -> &Arc<C> {
        &self.client
    }

    /// Health recorded by the last probe of this instance.
    pub fn health(&self) -> Health {
        self.health.lock().clone()
    }

    pub(crate) fn record(&self, health: Health) {
        *self.health.lock() = health;
    }
}

/// The instances of one backing service, primary first.
#[derive(Debug)]
pub struct Endpoints<C: ?Sized> {
    endpoints: Vec<ClientEndpoint<C>>,
}

impl<C: ?Sized> Endpoints<C> {
    /// Create the instance list of a service.
    ///
    /// # Arguments
    ///
    /// * `primary` - The handle of the primary instance.
    /// * `fallback` - The handle of the fallback instance, if one is configured.
    pub fn new(primary: Arc<C>, fallback: Option<Arc<C>>) -> Self {
        let mut endpoints = vec![ClientEndpoint::new(Role::Primary, primary)];
        if let Some(fallback) = fallback {
            endpoints.push(ClientEndpoint::new(Role::Fallback, fallback));
        }

        Self { endpoints }
    }

    /// Iterate over the instances in order of precedence.
    pub fn iter(&self) -> impl Iterator<Item = &ClientEndpoint<C>> {
        self.endpoints.iter()
    }

    pub fn get(&self, role: Role) -> Option<&ClientEndpoint<C>> {
        self.endpoints.iter().find(|endpoint| endpoint.role() == role)
    }

    pub fn has_fallback(&self) -> bool {
        self.get(Role::Fallback).is_some()
    }
}
