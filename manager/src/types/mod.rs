// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # Types module
//!
//! This module contains the payloads exchanged with the remote services. Responses are decoded here
//! and converted into the types of `network_state_core`.
//!
//! ## Sub-modules
//!
//! - `beacon`: This sub-module contains the data structures used by the Beacon Node REST API.
//! - `rpc`: This sub-module contains the JSON-RPC envelopes used by the execution client.
//!
//! For more detailed information, users should refer to the specific documentation for each sub-module.

pub mod beacon;
pub mod rpc;
