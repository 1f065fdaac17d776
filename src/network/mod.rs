// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Network profile resolution.
//!
//! This module provides:
//! - The built-in deployment table (sepolia, mainnet, localhost, custom)
//! - Merging of caller overrides into a preset
//! - Validation of chain id, endpoints and ACL address

pub mod resolver;
pub mod types;

pub use resolver::{
    get_chain_id, get_gateway_url, get_network_config, is_supported_network,
    merge_network_config, resolve, validate_network_config,
};
pub use types::*;
