// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is an in-memory structure passed at call time. It can be
//! built directly, deserialized, or loaded from the environment.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `FHEVM_NETWORK` | Network name (`sepolia`, `mainnet`, `localhost`, `custom`) | `sepolia` |
//! | `FHEVM_NODE_URL` | Override for the JSON-RPC node endpoint | preset |
//! | `FHEVM_GATEWAY_URL` | Override for the decryption gateway endpoint | preset |
//! | `FHEVM_CHAIN_ID` | Override for the chain id | preset |
//! | `FHEVM_ACL_ADDRESS` | Override for the ACL contract address | preset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use serde::{Deserialize, Serialize};

use crate::error::{FhevmError, Result};
use crate::network::{NetworkName, NetworkProfile, ProfileOverrides};

/// Environment variable name for the network selector.
pub const NETWORK_ENV: &str = "FHEVM_NETWORK";

/// Environment variable name for the node endpoint override.
pub const NODE_URL_ENV: &str = "FHEVM_NODE_URL";

/// Environment variable name for the gateway endpoint override.
pub const GATEWAY_URL_ENV: &str = "FHEVM_GATEWAY_URL";

/// Environment variable name for the chain id override.
pub const CHAIN_ID_ENV: &str = "FHEVM_CHAIN_ID";

/// Environment variable name for the ACL contract address override.
pub const ACL_ADDRESS_ENV: &str = "FHEVM_ACL_ADDRESS";

/// Environment variable name for the log output format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Network used when nothing is configured.
pub const DEFAULT_NETWORK: NetworkName = NetworkName::Sepolia;

/// Either a canonical network name or a complete profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NetworkSelector {
    Named(NetworkName),
    Profile(NetworkProfile),
}

impl From<NetworkName> for NetworkSelector {
    fn from(name: NetworkName) -> Self {
        NetworkSelector::Named(name)
    }
}

impl From<NetworkProfile> for NetworkSelector {
    fn from(profile: NetworkProfile) -> Self {
        NetworkSelector::Profile(profile)
    }
}

/// Instance configuration: a network selector plus optional field overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FhevmConfig {
    pub network: NetworkSelector,
    #[serde(flatten)]
    pub overrides: ProfileOverrides,
}

impl FhevmConfig {
    pub fn new(network: impl Into<NetworkSelector>) -> Self {
        Self {
            network: network.into(),
            overrides: ProfileOverrides::default(),
        }
    }

    pub fn with_gateway_url(mut self, url: impl Into<String>) -> Self {
        self.overrides.gateway_url = Some(url.into());
        self
    }

    pub fn with_node_url(mut self, url: impl Into<String>) -> Self {
        self.overrides.node_url = Some(url.into());
        self
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.overrides.chain_id = Some(chain_id);
        self
    }

    pub fn with_acl_address(mut self, address: impl Into<String>) -> Self {
        self.overrides.acl_address = Some(address.into());
        self
    }

    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let network = match non_empty(NETWORK_ENV) {
            Some(raw) => raw.parse::<NetworkName>()?,
            None => DEFAULT_NETWORK,
        };

        let chain_id = non_empty(CHAIN_ID_ENV)
            .map(|raw| {
                raw.trim().parse::<u64>().map_err(|e| {
                    FhevmError::Network(format!("Invalid {CHAIN_ID_ENV} '{raw}': {e}"))
                })
            })
            .transpose()?;

        Ok(Self {
            network: NetworkSelector::Named(network),
            overrides: ProfileOverrides {
                chain_id,
                node_url: non_empty(NODE_URL_ENV),
                gateway_url: non_empty(GATEWAY_URL_ENV),
                acl_address: non_empty(ACL_ADDRESS_ENV),
            },
        })
    }

    /// Merge a partial configuration on top of this one.
    ///
    /// A network in `partial` replaces the current selector; override fields
    /// present in `partial` replace the current ones.
    pub fn merged_with(&self, partial: ConfigOverrides) -> Self {
        let network = partial.network.unwrap_or_else(|| self.network.clone());
        let current = &self.overrides;
        let next = partial.overrides;
        Self {
            network,
            overrides: ProfileOverrides {
                chain_id: next.chain_id.or(current.chain_id),
                node_url: next.node_url.or_else(|| current.node_url.clone()),
                gateway_url: next.gateway_url.or_else(|| current.gateway_url.clone()),
                acl_address: next.acl_address.or_else(|| current.acl_address.clone()),
            },
        }
    }
}

impl Default for FhevmConfig {
    fn default() -> Self {
        Self::new(DEFAULT_NETWORK)
    }
}

/// Partial configuration used by reinitialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOverrides {
    #[serde(default)]
    pub network: Option<NetworkSelector>,
    #[serde(flatten)]
    pub overrides: ProfileOverrides,
}
