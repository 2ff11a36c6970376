// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # Types Module
//!
//! This module provides the core data structures read from the execution and consensus layers,
//! along with the network timing configuration they are interpreted with.
//!
//! ## Sub-modules
//!
//! - `block`: This sub-module contains all the structures related to block data on both layers.
//! - `config`: This sub-module contains the timing parameters of the Beacon chain.
//! - `error`: This sub-module contains the configuration error type.
//!
//! For more detailed information, users should refer to the specific
//! documentation for each sub-module.

use crate::types::error::ConfigurationError;
use std::str::FromStr;

pub mod block;
pub mod config;
pub mod error;

pub use ethers_core::types::{Address, Bytes, U256};

/// Length in bytes for an Ethereum address.
pub const ADDRESS_BYTES_LEN: usize = 20;

/// Parse a `0x` prefixed (or bare) hexadecimal Ethereum address.
///
/// # Errors
///
/// Returns a `ConfigurationError::MalformedAddress` if the input is not 20 bytes of hexadecimal.
pub fn parse_address(input: &str) -> Result<Address, ConfigurationError> {
    let trimmed = input.trim();
    let hex = trimmed.strip_prefix("0x").unwrap_or(trimmed);

    if hex.len() != ADDRESS_BYTES_LEN * 2 {
        return Err(ConfigurationError::MalformedAddress {
            input: input.to_string(),
            reason: format!(
                "expected {} hexadecimal characters, got {}",
                ADDRESS_BYTES_LEN * 2,
                hex.len()
            ),
        });
    }

    Address::from_str(hex).map_err(|err| ConfigurationError::MalformedAddress {
        input: input.to_string(),
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_address() {
        let address = parse_address("0x4838B106FCe9647Bdf1E7877BF73cE8B0BAD5f97").unwrap();
        assert_eq!(
            address,
            parse_address("4838b106fce9647bdf1e7877bf73ce8b0bad5f97").unwrap()
        );

        assert!(matches!(
            parse_address("0x4838B106"),
            Err(ConfigurationError::MalformedAddress { .. })
        ));
        assert!(matches!(
            parse_address("0xZZ38B106FCe9647Bdf1E7877BF73cE8B0BAD5f97"),
            Err(ConfigurationError::MalformedAddress { .. })
        ));
    }
}
