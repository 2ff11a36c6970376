// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

use crate::client::error::ClientError;
use crate::health::{ClientKind, Role};
use ethers_core::types::Address;
use std::time::Duration;
use thiserror::Error;

/// The error type for the `health` module.
#[derive(Debug, Error)]
pub enum HealthError {
    #[error(
        "No {kind} client is available, primary: {primary_error}, fallback: {}",
        fallback_error.as_deref().unwrap_or("not configured")
    )]
    NoAvailableClient {
        kind: ClientKind,
        primary_error: String,
        fallback_error: Option<String>,
    },
    #[error("The {kind} client is not synced yet, waited {waited:?}")]
    NotReady { kind: ClientKind, waited: Duration },
    #[error("Could not probe the {role} {kind} client: {source}")]
    Transport {
        kind: ClientKind,
        role: Role,
        #[source]
        source: ClientError,
    },
    #[error("No contract is deployed at {address:?}")]
    ContractNotDeployed { address: Address },
    #[error("Wait was cancelled")]
    Cancelled,
}
