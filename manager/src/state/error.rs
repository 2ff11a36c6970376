// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

use crate::client::error::ClientError;
use crate::health::error::HealthError;
use network_state_core::types::error::ConfigurationError;
use thiserror::Error;

/// The error type for the `state` module.
#[derive(Debug, Error)]
pub enum StateError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Health(#[from] HealthError),
    #[error("Error while {context}: {source}")]
    Client {
        context: String,
        #[source]
        source: ClientError,
    },
    #[error("No block found between slot {from_slot} and slot {floor}")]
    MissingData { from_slot: u64, floor: u64 },
    #[error("Block at slot {slot} has no execution payload")]
    MissingExecutionPayload { slot: u64 },
    #[error("Snapshot build was cancelled")]
    Cancelled,
}

impl StateError {
    /// Whether the error comes from a backing service being temporarily unusable. Callers running
    /// on a schedule can skip the current cycle and try again on the next one. Other errors most
    /// likely require operator intervention.
    pub const fn is_transient(&self) -> bool {
        match self {
            StateError::Health(err) => !matches!(err, HealthError::ContractNotDeployed { .. }),
            StateError::Client { .. } | StateError::Cancelled => true,
            StateError::Configuration(_)
            | StateError::MissingData { .. }
            | StateError::MissingExecutionPayload { .. } => false,
        }
    }
}

/// Macro to wrap a `ClientError` into a `StateError::Client` with the given context.
macro_rules! client_error {
    ($context:expr) => {
        |source| $crate::state::error::StateError::Client {
            context: $context.into(),
            source,
        }
    };
}

pub(crate) use client_error;
