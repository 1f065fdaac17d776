// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Encryption pipeline.
//!
//! Readiness check, then validation and normalization, then dispatch to the
//! engine primitive selected by the declared type. Batches fan out
//! concurrently and are all-or-nothing.

use alloy::primitives::U256;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::engine::FhevmEngine;
use crate::error::{FhevmError, Result};
use crate::instance::{ensure_ready, EngineInstance};
use crate::validation::{normalize_value, CanonicalValue, EncryptedType, InputType, PlainValue};

/// Ciphertext ready to be submitted to a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedValue {
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
    #[serde(rename = "type")]
    pub input_type: InputType,
    pub encrypted_type: EncryptedType,
}

/// One item of a batch encryption.
#[derive(Debug, Clone, PartialEq)]
pub struct EncryptionRequest {
    pub value: PlainValue,
    pub input_type: InputType,
}

impl EncryptionRequest {
    pub fn new(value: impl Into<PlainValue>, input_type: InputType) -> Self {
        Self {
            value: value.into(),
            input_type,
        }
    }
}

/// Encrypt a single plaintext value as `ty`.
pub async fn encrypt_value(
    instance: &EngineInstance,
    value: impl Into<PlainValue>,
    ty: InputType,
) -> Result<EncryptedValue> {
    ensure_ready(instance)?;

    let canonical = normalize_value(&value.into(), ty)?;

    let data = dispatch(instance.engine().as_ref(), &canonical, ty)
        .await
        .map_err(|e| {
            warn!(input_type = %ty, generation = instance.generation(), error = %e, "Engine encryption failed");
            FhevmError::Encryption(format!("Failed to encrypt {ty}: {e}"))
        })?;

    debug!(
        input_type = %ty,
        generation = instance.generation(),
        bytes = data.len(),
        "Encrypted value"
    );

    Ok(EncryptedValue {
        data,
        input_type: ty,
        encrypted_type: ty.encrypted_type(),
    })
}

pub async fn encrypt_bool(instance: &EngineInstance, value: bool) -> Result<EncryptedValue> {
    encrypt_value(instance, value, InputType::Bool).await
}

pub async fn encrypt_address(instance: &EngineInstance, address: &str) -> Result<EncryptedValue> {
    encrypt_value(instance, address, InputType::Address).await
}

/// Encrypt every request concurrently.
///
/// Any failure fails the whole batch; completed ciphertexts are discarded.
pub async fn encrypt_batch(
    instance: &EngineInstance,
    requests: Vec<EncryptionRequest>,
) -> Result<Vec<EncryptedValue>> {
    ensure_ready(instance)?;

    let count = requests.len();
    let pending = requests
        .into_iter()
        .map(|req| encrypt_value(instance, req.value, req.input_type));

    let encrypted = try_join_all(pending).await.map_err(|e| {
        warn!(count, error = %e, "Batch encryption failed");
        FhevmError::Encryption(format!("Batch encryption failed: {e}"))
    })?;

    debug!(count, "Encrypted batch");
    Ok(encrypted)
}

async fn dispatch(
    engine: &dyn FhevmEngine,
    value: &CanonicalValue,
    ty: InputType,
) -> std::result::Result<Vec<u8>, String> {
    let result = match (ty, value) {
        (InputType::Bool, CanonicalValue::Bool(b)) => engine.encrypt_bool(*b).await,
        (InputType::Uint8, CanonicalValue::Uint(v)) => engine.encrypt_uint8(narrow(*v)?).await,
        (InputType::Uint16, CanonicalValue::Uint(v)) => engine.encrypt_uint16(narrow(*v)?).await,
        (InputType::Uint32, CanonicalValue::Uint(v)) => engine.encrypt_uint32(narrow(*v)?).await,
        (InputType::Uint64, CanonicalValue::Uint(v)) => engine.encrypt_uint64(narrow(*v)?).await,
        (InputType::Uint128, CanonicalValue::Uint(v)) => engine.encrypt_uint128(narrow(*v)?).await,
        (InputType::Uint256, CanonicalValue::Uint(v)) => engine.encrypt_uint256(*v).await,
        (InputType::Address, CanonicalValue::Address(a)) => engine.encrypt_address(a).await,
        (InputType::Bytes, CanonicalValue::Bytes(b)) => engine.encrypt_bytes256(b).await,
        _ => return Err(format!("Unsupported encryption type: {ty}")),
    };
    result.map_err(|e| e.to_string())
}

fn narrow<T: TryFrom<U256>>(value: U256) -> std::result::Result<T, String> {
    T::try_from(value).map_err(|_| format!("value {value} does not fit the target width"))
}

/// Raw ciphertext bytes as passed to a contract call.
pub fn to_contract_input(encrypted: &EncryptedValue) -> &[u8] {
    &encrypted.data
}

/// `0x`-prefixed hex of the ciphertext.
pub fn to_hex(encrypted: &EncryptedValue) -> String {
    bytes_to_hex(&encrypted.data)
}

pub fn bytes_to_hex(bytes: &[u8]) -> String {
    alloy::hex::encode_prefixed(bytes)
}

/// Decode hex (with or without `0x`) into bytes.
pub fn hex_to_bytes(hex: &str) -> Result<Vec<u8>> {
    alloy::hex::decode(hex)
        .map_err(|e| FhevmError::Validation(format!("Invalid hex string: {hex} ({e})")))
}

pub fn get_encrypted_size(encrypted: &EncryptedValue) -> usize {
    encrypted.data.len()
}

/// Byte-wise ciphertext comparison; different lengths are never equal.
pub fn are_encrypted_values_equal(a: &EncryptedValue, b: &EncryptedValue) -> bool {
    a.data.len() == b.data.len() && a.data.iter().zip(&b.data).all(|(x, y)| x == y)
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&alloy::hex::encode_prefixed(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        alloy::hex::decode(&raw).map_err(serde::de::Error::custom)
    }
}
