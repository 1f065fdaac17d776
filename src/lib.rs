// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! FHEVM SDK - client core for confidential smart contracts
//!
//! This crate validates and encrypts inputs for FHEVM contracts, requests
//! decryption of on-chain ciphertext handles through the gateway, and manages
//! decryption permissions. The homomorphic engine itself is external and
//! plugs in through [`engine::EngineConnector`].
//!
//! ## Modules
//!
//! - `network` - Network presets and profile resolution
//! - `config` - Client configuration (environment and overrides)
//! - `validation` - Input type checks and normalization
//! - `instance` - Engine instance lifecycle
//! - `encryption` - Single and batch encryption
//! - `decryption` - Decryption requests and polling
//! - `permissions` - Permit signatures and access-control lists
//! - `client` - Stateful facade over the above

pub mod client;
pub mod config;
pub mod decryption;
pub mod encryption;
pub mod engine;
pub mod error;
pub mod instance;
pub mod logging;
pub mod network;
pub mod permissions;
pub mod signing;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use client::{FhevmClient, InstanceState};
pub use config::{ConfigOverrides, FhevmConfig};
pub use decryption::{DecryptionRequest, FixedInterval, PollStrategy, WaitOptions};
pub use encryption::{EncryptedValue, EncryptionRequest};
pub use engine::{ClearValue, EngineConnector, EngineParams, FhevmEngine, KeyPair};
pub use error::{EngineError, ErrorKind, FhevmError, Result};
pub use instance::EngineInstance;
pub use network::{NetworkName, NetworkProfile, ProfileOverrides};
pub use permissions::{AclStore, InMemoryAcl, PermissionManager, PlaceholderAcl};
pub use validation::{EncryptedType, InputType, PlainValue};
