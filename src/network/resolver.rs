// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Resolution of network names and partial overrides into validated profiles.
//!
//! Everything here is a pure function over its input and the static preset
//! table in [`super::types`].

use crate::config::{FhevmConfig, NetworkSelector};
use crate::error::{FhevmError, Result};
use crate::validation::is_valid_address;

use super::types::{NetworkName, NetworkProfile, ProfileOverrides};

/// Look up the preset profile for a network name.
///
/// Returns a copy of the preset without validating it (`custom` is
/// intentionally incomplete until overridden).
pub fn get_network_config(name: &str) -> Result<NetworkProfile> {
    let network: NetworkName = name.parse()?;
    Ok(NetworkProfile::from(network.preset()))
}

/// Check that a profile is complete and well-formed.
pub fn validate_network_config(profile: &NetworkProfile) -> Result<()> {
    if profile.chain_id == 0 {
        return Err(FhevmError::Network("Invalid chainId".to_string()));
    }

    if !is_valid_url(&profile.node_url) {
        return Err(FhevmError::Network("Invalid RPC URL".to_string()));
    }

    if !is_valid_url(&profile.gateway_url) {
        return Err(FhevmError::Network("Invalid gateway URL".to_string()));
    }

    if let Some(acl) = &profile.acl_address {
        if !is_valid_address(acl) {
            return Err(FhevmError::Network(format!("Invalid ACL address: {acl}")));
        }
    }

    Ok(())
}

/// Merge overrides into a named preset and validate the result.
pub fn merge_network_config(
    network: NetworkName,
    overrides: &ProfileOverrides,
) -> Result<NetworkProfile> {
    let merged = overrides.apply_to(NetworkProfile::from(network.preset()));
    validate_network_config(&merged)?;
    Ok(merged)
}

/// Resolve an instance configuration into a validated profile.
///
/// Overrides apply to full profiles as well as to named presets.
pub fn resolve(config: &FhevmConfig) -> Result<NetworkProfile> {
    match &config.network {
        NetworkSelector::Named(name) => merge_network_config(*name, &config.overrides),
        NetworkSelector::Profile(profile) => {
            let merged = config.overrides.apply_to(profile.clone());
            validate_network_config(&merged)?;
            Ok(merged)
        }
    }
}

/// Chain id of a named network.
pub fn get_chain_id(name: &str) -> Result<u64> {
    Ok(get_network_config(name)?.chain_id)
}

/// Gateway endpoint of a named network.
pub fn get_gateway_url(name: &str) -> Result<String> {
    Ok(get_network_config(name)?.gateway_url)
}

pub fn is_supported_network(name: &str) -> bool {
    name.parse::<NetworkName>().is_ok()
}

fn is_valid_url(raw: &str) -> bool {
    !raw.is_empty() && url::Url::parse(raw).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sepolia_like(node_url: &str, gateway_url: &str, chain_id: u64) -> NetworkProfile {
        NetworkProfile {
            name: NetworkName::Sepolia,
            chain_id,
            node_url: node_url.to_string(),
            gateway_url: gateway_url.to_string(),
            acl_address: None,
        }
    }

    #[test]
    fn sepolia_preset() {
        let config = get_network_config("sepolia").unwrap();
        assert_eq!(config.name, NetworkName::Sepolia);
        assert_eq!(config.chain_id, 11_155_111);
        assert!(config.node_url.contains("sepolia"));
        assert!(!config.gateway_url.is_empty());
        assert!(validate_network_config(&config).is_ok());
    }

    #[test]
    fn localhost_preset() {
        let config = get_network_config("localhost").unwrap();
        assert_eq!(config.chain_id, 31_337);
        assert!(config.node_url.contains("localhost"));
    }

    #[test]
    fn unknown_network_fails() {
        let err = get_network_config("unknown-network").unwrap_err();
        assert!(matches!(err, FhevmError::Network(_)));
    }

    #[test]
    fn accepts_valid_profile() {
        let profile = sepolia_like(
            "https://sepolia.infura.io/v3/test",
            "https://gateway.test.com",
            11_155_111,
        );
        assert!(validate_network_config(&profile).is_ok());
    }

    #[test]
    fn rejects_zero_chain_id() {
        let profile = sepolia_like("https://rpc.test", "https://gateway.test.com", 0);
        let err = validate_network_config(&profile).unwrap_err();
        assert_eq!(err, FhevmError::Network("Invalid chainId".into()));
    }

    #[test]
    fn rejects_malformed_endpoints() {
        let bad_rpc = sepolia_like("invalid-url", "https://gateway.test.com", 1);
        assert!(matches!(
            validate_network_config(&bad_rpc),
            Err(FhevmError::Network(msg)) if msg.contains("RPC")
        ));

        let bad_gateway = sepolia_like("https://rpc.test", "invalid-url", 1);
        assert!(matches!(
            validate_network_config(&bad_gateway),
            Err(FhevmError::Network(msg)) if msg.contains("gateway")
        ));
    }

    #[test]
    fn rejects_malformed_acl_address() {
        let mut profile = sepolia_like("https://rpc.test", "https://gateway.test.com", 1);
        profile.acl_address = Some("0x1234".into());
        assert!(validate_network_config(&profile).is_err());
    }

    #[test]
    fn custom_requires_overrides() {
        let err = merge_network_config(NetworkName::Custom, &ProfileOverrides::default());
        assert!(err.is_err());

        let merged = merge_network_config(
            NetworkName::Custom,
            &ProfileOverrides {
                chain_id: Some(8009),
                node_url: Some("http://10.0.0.2:8545".into()),
                gateway_url: Some("http://10.0.0.2:7077".into()),
                acl_address: None,
            },
        )
        .unwrap();
        assert_eq!(merged.name, NetworkName::Custom);
        assert_eq!(merged.chain_id, 8009);
    }

    #[test]
    fn resolve_applies_overrides_to_named_network() {
        let config = FhevmConfig::new(NetworkName::Sepolia)
            .with_gateway_url("https://gateway.internal")
            .with_chain_id(42);
        let profile = resolve(&config).unwrap();
        assert_eq!(profile.gateway_url, "https://gateway.internal");
        assert_eq!(profile.chain_id, 42);
        assert_eq!(profile.node_url, "https://sepolia.infura.io/v3/");
    }

    #[test]
    fn resolve_validates_full_profile() {
        let bad = FhevmConfig::new(sepolia_like("https://rpc.test", "nope", 5));
        assert!(matches!(resolve(&bad), Err(FhevmError::Network(_))));

        let good = sepolia_like("https://rpc.test", "https://gw.test", 5);
        assert_eq!(resolve(&FhevmConfig::new(good.clone())).unwrap(), good);
    }

    #[test]
    fn lookup_helpers() {
        assert_eq!(get_chain_id("mainnet").unwrap(), 1);
        assert_eq!(get_gateway_url("localhost").unwrap(), "http://localhost:3000");
        assert!(is_supported_network("custom"));
        assert!(!is_supported_network("goerli"));
    }
}
