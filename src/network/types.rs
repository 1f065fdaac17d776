// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Network types and the built-in deployment table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FhevmError;

/// Canonical network identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkName {
    Sepolia,
    Mainnet,
    Localhost,
    Custom,
}

impl NetworkName {
    pub const ALL: [NetworkName; 4] = [
        NetworkName::Sepolia,
        NetworkName::Mainnet,
        NetworkName::Localhost,
        NetworkName::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkName::Sepolia => "sepolia",
            NetworkName::Mainnet => "mainnet",
            NetworkName::Localhost => "localhost",
            NetworkName::Custom => "custom",
        }
    }

    /// Built-in preset for this network.
    pub fn preset(&self) -> &'static NetworkPreset {
        match self {
            NetworkName::Sepolia => &SEPOLIA,
            NetworkName::Mainnet => &MAINNET,
            NetworkName::Localhost => &LOCALHOST,
            NetworkName::Custom => &CUSTOM,
        }
    }
}

impl fmt::Display for NetworkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkName {
    type Err = FhevmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_ascii_lowercase();
        NetworkName::ALL
            .into_iter()
            .find(|name| name.as_str() == value)
            .ok_or_else(|| FhevmError::Network(format!("Unknown network: {s}")))
    }
}

/// Static deployment data for a named network.
#[derive(Debug, Clone)]
pub struct NetworkPreset {
    pub name: NetworkName,
    pub chain_id: u64,
    /// JSON-RPC node endpoint
    pub node_url: &'static str,
    /// Decryption gateway endpoint
    pub gateway_url: &'static str,
    /// ACL contract address
    pub acl_address: Option<&'static str>,
}

/// Sepolia testnet deployment.
pub const SEPOLIA: NetworkPreset = NetworkPreset {
    name: NetworkName::Sepolia,
    chain_id: 11_155_111,
    node_url: "https://sepolia.infura.io/v3/",
    gateway_url: "https://gateway.sepolia.zama.ai",
    acl_address: Some("0x9d6f6d3D3D3D3D3D3D3D3D3D3D3D3D3D3D3D3D3D"),
};

/// Ethereum mainnet deployment.
pub const MAINNET: NetworkPreset = NetworkPreset {
    name: NetworkName::Mainnet,
    chain_id: 1,
    node_url: "https://mainnet.infura.io/v3/",
    gateway_url: "https://gateway.zama.ai",
    acl_address: Some("0x0000000000000000000000000000000000000000"),
};

/// Local development node (hardhat / anvil defaults).
pub const LOCALHOST: NetworkPreset = NetworkPreset {
    name: NetworkName::Localhost,
    chain_id: 31_337,
    node_url: "http://localhost:8545",
    gateway_url: "http://localhost:3000",
    acl_address: None,
};

/// Placeholder for caller-supplied deployments; invalid until overridden.
pub const CUSTOM: NetworkPreset = NetworkPreset {
    name: NetworkName::Custom,
    chain_id: 0,
    node_url: "",
    gateway_url: "",
    acl_address: None,
};

/// Fully resolved network profile.
///
/// Produced by the resolver and never mutated afterwards; reinitialization
/// derives a fresh profile instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkProfile {
    pub name: NetworkName,
    pub chain_id: u64,
    pub node_url: String,
    pub gateway_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acl_address: Option<String>,
}

impl From<&NetworkPreset> for NetworkProfile {
    fn from(preset: &NetworkPreset) -> Self {
        Self {
            name: preset.name,
            chain_id: preset.chain_id,
            node_url: preset.node_url.to_string(),
            gateway_url: preset.gateway_url.to_string(),
            acl_address: preset.acl_address.map(str::to_string),
        }
    }
}

/// Partial profile used to override fields of a preset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileOverrides {
    #[serde(default)]
    pub chain_id: Option<u64>,
    #[serde(default)]
    pub node_url: Option<String>,
    #[serde(default)]
    pub gateway_url: Option<String>,
    #[serde(default)]
    pub acl_address: Option<String>,
}

impl ProfileOverrides {
    pub fn is_empty(&self) -> bool {
        self.chain_id.is_none()
            && self.node_url.is_none()
            && self.gateway_url.is_none()
            && self.acl_address.is_none()
    }

    /// Apply the present fields onto `profile`.
    pub fn apply_to(&self, mut profile: NetworkProfile) -> NetworkProfile {
        if let Some(chain_id) = self.chain_id {
            profile.chain_id = chain_id;
        }
        if let Some(node_url) = &self.node_url {
            profile.node_url = node_url.clone();
        }
        if let Some(gateway_url) = &self.gateway_url {
            profile.gateway_url = gateway_url.clone();
        }
        if let Some(acl_address) = &self.acl_address {
            profile.acl_address = Some(acl_address.clone());
        }
        profile
    }
}
