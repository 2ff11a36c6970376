// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! # Network State Core
//!
//! This crate provides the core types and utilities used when reading the state of an Ethereum
//! network through its two layers: an execution client and a consensus (Beacon) client. It does
//! not perform any I/O.
//!
//! ## Sub-modules
//!
//! - `time`: This sub-module contains the conversions between timestamps, slots and epochs.
//! - `types`: This sub-module contains the block, sync status and configuration data structures.
//!
//! For more detailed information, users should refer to the specific documentation for each sub-module.

pub mod time;
pub mod types;
