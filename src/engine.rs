// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Seam to the external cryptographic engine.
//!
//! The engine is a black box: it binds to a network, exposes one encrypt
//! primitive per supported type, and optionally decrypts through the gateway,
//! signs permits and generates key pairs. Optional capabilities default to
//! [`EngineError::Unsupported`] so their absence surfaces as a typed error.

use std::fmt;
use std::sync::Arc;

use alloy::primitives::U256;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::network::NetworkProfile;

/// Parameters the engine needs to bind to a deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineParams {
    pub chain_id: u64,
    pub node_url: String,
    pub gateway_url: String,
    pub acl_address: Option<String>,
}

impl From<&NetworkProfile> for EngineParams {
    fn from(profile: &NetworkProfile) -> Self {
        Self {
            chain_id: profile.chain_id,
            node_url: profile.node_url.clone(),
            gateway_url: profile.gateway_url.clone(),
            acl_address: profile.acl_address.clone(),
        }
    }
}

/// Plaintext produced by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearValue {
    Bool(bool),
    Uint(u64),
    BigUint(U256),
    Text(String),
}

impl ClearValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ClearValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            ClearValue::Uint(v) => Some(*v),
            ClearValue::BigUint(v) => u64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_u256(&self) -> Option<U256> {
        match self {
            ClearValue::Uint(v) => Some(U256::from(*v)),
            ClearValue::BigUint(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ClearValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ClearValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClearValue::Bool(v) => write!(f, "{v}"),
            ClearValue::Uint(v) => write!(f, "{v}"),
            ClearValue::BigUint(v) => write!(f, "{v}"),
            ClearValue::Text(v) => f.write_str(v),
        }
    }
}

/// Re-encryption key pair generated by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPair {
    pub public_key: String,
    pub private_key: String,
}

/// Capability surface of a bound engine.
#[async_trait]
pub trait FhevmEngine: Send + Sync {
    /// Network public key, if the engine has one loaded.
    fn public_key(&self) -> Option<String>;

    async fn encrypt_bool(&self, value: bool) -> Result<Vec<u8>, EngineError>;
    async fn encrypt_uint8(&self, value: u8) -> Result<Vec<u8>, EngineError>;
    async fn encrypt_uint16(&self, value: u16) -> Result<Vec<u8>, EngineError>;
    async fn encrypt_uint32(&self, value: u32) -> Result<Vec<u8>, EngineError>;
    async fn encrypt_uint64(&self, value: u64) -> Result<Vec<u8>, EngineError>;
    async fn encrypt_uint128(&self, value: u128) -> Result<Vec<u8>, EngineError>;
    async fn encrypt_uint256(&self, value: U256) -> Result<Vec<u8>, EngineError>;
    async fn encrypt_address(&self, value: &str) -> Result<Vec<u8>, EngineError>;
    async fn encrypt_bytes256(&self, value: &str) -> Result<Vec<u8>, EngineError>;

    /// Gateway decryption of a contract-held handle.
    async fn decrypt(
        &self,
        _contract_address: &str,
        _handle: &str,
        _signature: Option<&str>,
    ) -> Result<ClearValue, EngineError> {
        Err(EngineError::Unsupported("Decryption"))
    }

    /// EIP-712 permit binding `user_address` to `contract_address`.
    async fn generate_permit_signature(
        &self,
        _contract_address: &str,
        _user_address: &str,
    ) -> Result<String, EngineError> {
        Err(EngineError::Unsupported("Permission signature generation"))
    }

    fn generate_keypair(&self) -> Result<KeyPair, EngineError> {
        Err(EngineError::Unsupported("Key pair generation"))
    }
}

/// Factory binding an engine to a network.
#[async_trait]
pub trait EngineConnector: Send + Sync {
    async fn connect(&self, params: &EngineParams) -> Result<Arc<dyn FhevmEngine>, EngineError>;
}
