// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

use ethers_core::types::Address;
use network_state_core::types::error::ConfigurationError;
use network_state_core::types::parse_address;
use url::Url;

/// Validate a backing service address and normalize it. Addresses given as `host:port` get an
/// `http://` scheme, and the trailing `/` is removed so that paths can be appended to it.
///
/// # Errors
///
/// Returns an error if the address cannot be parsed or has no host.
pub fn validate_and_format_url(url: &str) -> Result<String, url::ParseError> {
    let parsed_url = match Url::parse(url) {
        Ok(parsed_url) if parsed_url.has_host() => parsed_url,
        Ok(_) | Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(&format!("http://{url}"))?
        }
        Err(e) => return Err(e),
    };

    if !parsed_url.has_host() {
        return Err(url::ParseError::EmptyHost);
    }

    Ok(parsed_url.as_str().trim_end_matches('/').to_string())
}

/// Parse a list of comma separated account addresses.
///
/// # Errors
///
/// Returns a `ConfigurationError::MalformedAddress` for the first malformed address.
pub fn parse_addresses(input: &str) -> Result<Vec<Address>, ConfigurationError> {
    input
        .split(',')
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .map(parse_address)
        .collect()
}
