// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Decryption Lifecycle
//!
//! Recovers plaintext for contract-held ciphertext handles through the
//! engine's gateway primitive.
//!
//! ## Variants
//!
//! - Single request, with an implicit or an explicit authorization signature
//! - Concurrent batch (all-or-nothing)
//! - Poll-until-ready: retries only failures that report a result that is not
//!   ready yet, with the delay supplied by a [`PollStrategy`] (fixed interval
//!   by default), and gives up after a bounded timeout
//! - Readiness probe that collapses every failure into `false`
//!
//! Shape validation of the contract address and handle happens before any
//! engine call.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::U256;
use futures::future::try_join_all;
use tokio::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::engine::ClearValue;
use crate::error::{EngineError, ErrorKind, FhevmError, Result};
use crate::instance::{ensure_ready, EngineInstance};
use crate::validation::{
    to_integer, validate_contract_address, validate_handle, EncryptedType, PlainValue,
};

/// Default overall deadline for [`wait_for_decryption`].
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_millis(60_000);

/// Default delay between attempts of [`wait_for_decryption`].
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1_000);

/// One entry of a batch decryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptionRequest {
    pub contract_address: String,
    pub handle: String,
    pub expected_type: Option<EncryptedType>,
}

impl DecryptionRequest {
    pub fn new(contract_address: impl Into<String>, handle: impl Into<String>) -> Self {
        Self {
            contract_address: contract_address.into(),
            handle: handle.into(),
            expected_type: None,
        }
    }

    pub fn expecting(mut self, ty: EncryptedType) -> Self {
        self.expected_type = Some(ty);
        self
    }
}

/// Delay policy between attempts of the poll loop.
pub trait PollStrategy: Send + Sync {
    /// Delay after the `attempt`-th not-ready failure (1-based).
    fn next_delay(&self, attempt: u32) -> Duration;
}

/// Constant delay, no jitter, no backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedInterval(pub Duration);

impl PollStrategy for FixedInterval {
    fn next_delay(&self, _attempt: u32) -> Duration {
        self.0
    }
}

/// Options for [`wait_for_decryption`].
#[derive(Clone)]
pub struct WaitOptions {
    pub timeout: Duration,
    pub interval: Duration,
    pub expected_type: Option<EncryptedType>,
    /// Overrides `interval` when set
    pub strategy: Option<Arc<dyn PollStrategy>>,
}

impl WaitOptions {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn expecting(mut self, ty: EncryptedType) -> Self {
        self.expected_type = Some(ty);
        self
    }

    pub fn strategy(mut self, strategy: Arc<dyn PollStrategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_WAIT_TIMEOUT,
            interval: DEFAULT_POLL_INTERVAL,
            expected_type: None,
            strategy: None,
        }
    }
}

impl std::fmt::Debug for WaitOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaitOptions")
            .field("timeout", &self.timeout)
            .field("interval", &self.interval)
            .field("expected_type", &self.expected_type)
            .field("custom_strategy", &self.strategy.is_some())
            .finish()
    }
}

/// Decrypt `handle` held by `contract_address`.
///
/// The result is coerced according to `expected_type`, or passed through
/// unchanged when it is `None`.
pub async fn request_decryption(
    instance: &EngineInstance,
    contract_address: &str,
    handle: &str,
    expected_type: Option<EncryptedType>,
) -> Result<ClearValue> {
    ensure_ready(instance)?;
    validate_contract_address(contract_address)?;
    validate_handle(handle)?;

    gateway_decrypt(
        instance,
        contract_address,
        handle,
        None,
        expected_type,
        "Failed to decrypt value",
    )
    .await
}

/// Same as [`request_decryption`], forwarding an explicit permit signature.
pub async fn request_decryption_with_signature(
    instance: &EngineInstance,
    contract_address: &str,
    handle: &str,
    signature: &str,
    expected_type: Option<EncryptedType>,
) -> Result<ClearValue> {
    ensure_ready(instance)?;
    validate_contract_address(contract_address)?;
    validate_handle(handle)?;
    if signature.trim().is_empty() {
        return Err(FhevmError::Validation(
            "Signature must be a non-empty string".to_string(),
        ));
    }

    gateway_decrypt(
        instance,
        contract_address,
        handle,
        Some(signature),
        expected_type,
        "Failed to decrypt with signature",
    )
    .await
}

async fn gateway_decrypt(
    instance: &EngineInstance,
    contract_address: &str,
    handle: &str,
    signature: Option<&str>,
    expected_type: Option<EncryptedType>,
    context: &str,
) -> Result<ClearValue> {
    let request_id = Uuid::new_v4();
    debug!(
        %request_id,
        contract = contract_address,
        handle,
        signed = signature.is_some(),
        "Requesting decryption"
    );

    let raw = match instance
        .engine()
        .decrypt(contract_address, handle, signature)
        .await
    {
        Ok(raw) => raw,
        Err(EngineError::Unsupported(_)) => {
            return Err(FhevmError::Decryption(
                "Decryption not supported by this instance".to_string(),
            ));
        }
        Err(e) => {
            debug!(%request_id, error = %e, "Gateway decryption failed");
            return Err(FhevmError::Decryption(format!("{context}: {e}")));
        }
    };

    let value = coerce(raw, expected_type)?;
    debug!(%request_id, expected = ?expected_type, "Decryption fulfilled");
    Ok(value)
}

/// Decrypt every request concurrently; any failure fails the batch.
pub async fn request_batch_decryption(
    instance: &EngineInstance,
    requests: Vec<DecryptionRequest>,
) -> Result<Vec<ClearValue>> {
    ensure_ready(instance)?;

    let count = requests.len();
    let pending = requests.iter().map(|req| {
        request_decryption(
            instance,
            &req.contract_address,
            &req.handle,
            req.expected_type,
        )
    });

    try_join_all(pending).await.map_err(|e| {
        warn!(count, error = %e, "Batch decryption failed");
        FhevmError::Decryption(format!("Batch decryption failed: {e}"))
    })
}

/// Poll [`request_decryption`] until it succeeds or `options.timeout` elapses.
///
/// Only decryption failures reporting a not-ready result are retried; any
/// other failure is returned immediately.
pub async fn wait_for_decryption(
    instance: &EngineInstance,
    contract_address: &str,
    handle: &str,
    options: WaitOptions,
) -> Result<ClearValue> {
    let strategy: Arc<dyn PollStrategy> = options
        .strategy
        .clone()
        .unwrap_or_else(|| Arc::new(FixedInterval(options.interval)));

    let start = Instant::now();
    let mut attempts: u32 = 0;

    while start.elapsed() < options.timeout {
        attempts += 1;
        match request_decryption(instance, contract_address, handle, options.expected_type).await {
            Ok(value) => return Ok(value),
            Err(e) if is_retryable(&e) => {
                let delay = strategy.next_delay(attempts);
                debug!(
                    attempts,
                    ?delay,
                    handle,
                    "Decryption not ready, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }

    warn!(attempts, handle, timeout = ?options.timeout, "Decryption wait timed out");
    Err(FhevmError::Decryption(format!(
        "Decryption timeout after {}ms",
        options.timeout.as_millis()
    )))
}

fn is_retryable(err: &FhevmError) -> bool {
    err.kind() == ErrorKind::Decryption && err.indicates_not_ready()
}

/// Probe with a single request; every failure reads as `false`.
pub async fn is_decryption_ready(
    instance: &EngineInstance,
    contract_address: &str,
    handle: &str,
) -> bool {
    request_decryption(instance, contract_address, handle, None)
        .await
        .is_ok()
}

/// Single request raced against a deadline.
pub async fn decrypt_with_timeout(
    instance: &EngineInstance,
    contract_address: &str,
    handle: &str,
    timeout: Duration,
) -> Result<ClearValue> {
    tokio::time::timeout(
        timeout,
        request_decryption(instance, contract_address, handle, None),
    )
    .await
    .map_err(|_| FhevmError::Decryption("Decryption timeout".to_string()))?
}

/// Decrypt and read the result as a boolean (non-zero is `true`).
pub async fn decrypt_to_bool(
    instance: &EngineInstance,
    contract_address: &str,
    handle: &str,
) -> Result<bool> {
    let value =
        request_decryption(instance, contract_address, handle, Some(EncryptedType::Ebool)).await?;
    value
        .as_bool()
        .ok_or_else(|| FhevmError::Decryption(format!("Expected boolean result, got {value}")))
}

/// Decrypt and read the result as an unsigned 64-bit integer.
pub async fn decrypt_to_u64(
    instance: &EngineInstance,
    contract_address: &str,
    handle: &str,
) -> Result<u64> {
    let value = request_decryption(instance, contract_address, handle, None).await?;
    let wide = coerce(value, Some(EncryptedType::Euint64))?;
    wide.as_u64()
        .ok_or_else(|| FhevmError::Decryption(format!("Result {wide} does not fit in 64 bits")))
}

/// Coerce a gateway result to the shape implied by `expected`.
fn coerce(raw: ClearValue, expected: Option<EncryptedType>) -> Result<ClearValue> {
    let Some(ty) = expected else {
        return Ok(raw);
    };

    match ty {
        EncryptedType::Ebool => Ok(ClearValue::Bool(truthy(&raw)?)),
        EncryptedType::Euint4
        | EncryptedType::Euint8
        | EncryptedType::Euint16
        | EncryptedType::Euint32 => {
            let bits = match ty {
                EncryptedType::Euint4 => 4,
                EncryptedType::Euint8 => 8,
                EncryptedType::Euint16 => 16,
                _ => 32,
            };
            let value = numeric(&raw, ty)?;
            let max = (U256::from(1u8) << bits) - U256::from(1u8);
            if value > max {
                return Err(FhevmError::Decryption(format!(
                    "Result {value} out of range for {ty}"
                )));
            }
            // bounded by max above
            Ok(ClearValue::Uint(value.to::<u64>()))
        }
        EncryptedType::Euint64 | EncryptedType::Euint128 | EncryptedType::Euint256 => {
            Ok(ClearValue::BigUint(numeric(&raw, ty)?))
        }
        EncryptedType::Eaddress
        | EncryptedType::Ebytes64
        | EncryptedType::Ebytes128
        | EncryptedType::Ebytes256 => Ok(ClearValue::Text(raw.to_string())),
    }
}

fn numeric(raw: &ClearValue, ty: EncryptedType) -> Result<U256> {
    match raw {
        ClearValue::Bool(b) => Ok(U256::from(*b as u8)),
        ClearValue::Uint(v) => Ok(U256::from(*v)),
        ClearValue::BigUint(v) => Ok(*v),
        ClearValue::Text(text) => {
            let parsed = to_integer(&PlainValue::Text(text.clone())).map_err(|_| {
                FhevmError::Decryption(format!("Cannot read '{text}' as {ty}"))
            })?;
            if parsed.negative {
                return Err(FhevmError::Decryption(format!(
                    "Negative result '{text}' for {ty}"
                )));
            }
            Ok(parsed.magnitude)
        }
    }
}

fn truthy(raw: &ClearValue) -> Result<bool> {
    match raw {
        ClearValue::Bool(b) => Ok(*b),
        ClearValue::Text(text) if text.eq_ignore_ascii_case("true") => Ok(true),
        ClearValue::Text(text) if text.eq_ignore_ascii_case("false") => Ok(false),
        other => Ok(!numeric(other, EncryptedType::Ebool)?.is_zero()),
    }
}
