// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

/// Errors caused by inconsistent network parameters or local clock skew. They are never retried,
/// as they most likely require operator intervention.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error(
        "Timestamp {timestamp} is before the network genesis time {genesis_time}, the system clock or the network configuration is wrong"
    )]
    ClockSkew { timestamp: u64, genesis_time: u64 },
    #[error("Invalid Beacon configuration, {field} must be greater than zero")]
    ZeroValue { field: String },
    #[error("Arithmetic overflow while computing {operation}")]
    Overflow { operation: String },
    #[error("Malformed address \"{input}\": {reason}")]
    MalformedAddress { input: String, reason: String },
}

/// Macro to create a `ConfigurationError::Overflow` for the given operation.
#[macro_export]
macro_rules! overflow_error {
    ($operation:expr) => {
        ConfigurationError::Overflow {
            operation: String::from($operation),
        }
    };
}
