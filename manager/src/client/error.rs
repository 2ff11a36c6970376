// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

/// The error type for the `client` module. Any of its variants means the backing service could not
/// be talked to, and says nothing about its sync state.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request for endpoint \"{endpoint}\" failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Sync + Send>,
    },
    #[error("Error while handling response for endpoint \"{endpoint}\": {source}")]
    Response {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Sync + Send>,
    },
    #[error("RPC call \"{endpoint}\" returned error {code}: {message}")]
    Rpc {
        endpoint: String,
        code: i64,
        message: String,
    },
    #[error("Could not connect to the given address, {address}")]
    Connection { address: String },
}
