// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet signer integration.
//!
//! Permission operations only need the signer's address, used to default an
//! omitted user address. Any wallet layer can plug in through
//! [`AddressSource`]; alloy's local signer is supported out of the box.

use alloy::signers::{local::PrivateKeySigner, Signer};
use async_trait::async_trait;

use crate::error::{FhevmError, Result};

/// Anything able to report the address it signs for.
#[async_trait]
pub trait AddressSource: Send + Sync {
    async fn address(&self) -> Result<String>;
}

#[async_trait]
impl AddressSource for PrivateKeySigner {
    async fn address(&self) -> Result<String> {
        Ok(format!("{:?}", Signer::address(self)))
    }
}

/// Fixed address, for read-only callers that never sign.
#[derive(Debug, Clone)]
pub struct StaticAddress(pub String);

#[async_trait]
impl AddressSource for StaticAddress {
    async fn address(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Create a local signer from a hex private key (with or without `0x`).
pub fn signer_from_hex(private_key_hex: &str) -> Result<PrivateKeySigner> {
    let key_bytes = alloy::hex::decode(private_key_hex.trim())
        .map_err(|e| FhevmError::Fhevm(format!("Invalid private key: {e}")))?;

    PrivateKeySigner::from_slice(&key_bytes)
        .map_err(|e| FhevmError::Fhevm(format!("Invalid private key: {e}")))
}
