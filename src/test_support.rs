// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Scripted engine and connector for unit tests.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy::primitives::U256;
use async_trait::async_trait;

use crate::engine::{ClearValue, EngineConnector, EngineParams, FhevmEngine, KeyPair};
use crate::error::EngineError;

#[derive(Default)]
struct MockState {
    public_key: Option<String>,
    failing_primitives: HashSet<&'static str>,
    decrypt_supported: bool,
    decrypt_script: VecDeque<Result<ClearValue, EngineError>>,
    decrypt_default: Option<Result<ClearValue, EngineError>>,
    last_signature: Option<String>,
    permits_supported: bool,
    keypairs_supported: bool,
}

/// Deterministic engine: ciphertext is a one-byte tag followed by the
/// big-endian plaintext.
#[derive(Clone)]
pub struct MockEngine {
    state: Arc<Mutex<MockState>>,
    encrypt_calls: Arc<AtomicUsize>,
    decrypt_calls: Arc<AtomicUsize>,
}

impl MockEngine {
    pub fn new() -> Self {
        let state = MockState {
            public_key: Some("mock-public-key".to_string()),
            decrypt_supported: true,
            decrypt_default: Some(Ok(ClearValue::Uint(42))),
            permits_supported: true,
            keypairs_supported: true,
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            encrypt_calls: Arc::new(AtomicUsize::new(0)),
            decrypt_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn with_state(self, f: impl FnOnce(&mut MockState)) -> Self {
        f(&mut self.state.lock().unwrap());
        self
    }

    pub fn without_public_key(self) -> Self {
        self.with_state(|s| s.public_key = None)
    }

    pub fn without_decrypt(self) -> Self {
        self.with_state(|s| s.decrypt_supported = false)
    }

    pub fn without_permits(self) -> Self {
        self.with_state(|s| s.permits_supported = false)
    }

    pub fn failing_primitive(self, name: &'static str) -> Self {
        self.with_state(|s| {
            s.failing_primitives.insert(name);
        })
    }

    /// Result returned once all scripted results are consumed.
    pub fn decrypt_returns(self, result: Result<ClearValue, EngineError>) -> Self {
        self.with_state(|s| s.decrypt_default = Some(result))
    }

    /// Queue results returned by the next decrypt calls, in order.
    pub fn decrypt_script(self, results: Vec<Result<ClearValue, EngineError>>) -> Self {
        self.with_state(|s| s.decrypt_script = results.into())
    }

    pub fn set_public_key(&self, key: Option<&str>) {
        self.state.lock().unwrap().public_key = key.map(str::to_string);
    }

    pub fn encrypt_calls(&self) -> usize {
        self.encrypt_calls.load(Ordering::SeqCst)
    }

    pub fn decrypt_calls(&self) -> usize {
        self.decrypt_calls.load(Ordering::SeqCst)
    }

    pub fn last_signature(&self) -> Option<String> {
        self.state.lock().unwrap().last_signature.clone()
    }

    fn ciphertext(&self, primitive: &'static str, tag: u8, body: &[u8]) -> Result<Vec<u8>, EngineError> {
        self.encrypt_calls.fetch_add(1, Ordering::SeqCst);
        if self.state.lock().unwrap().failing_primitives.contains(primitive) {
            return Err(EngineError::Rejected(format!("{primitive} refused")));
        }
        let mut out = Vec::with_capacity(body.len() + 1);
        out.push(tag);
        out.extend_from_slice(body);
        Ok(out)
    }
}

#[async_trait]
impl FhevmEngine for MockEngine {
    fn public_key(&self) -> Option<String> {
        self.state.lock().unwrap().public_key.clone()
    }

    async fn encrypt_bool(&self, value: bool) -> Result<Vec<u8>, EngineError> {
        self.ciphertext("encrypt_bool", 0, &[value as u8])
    }

    async fn encrypt_uint8(&self, value: u8) -> Result<Vec<u8>, EngineError> {
        self.ciphertext("encrypt_uint8", 8, &[value])
    }

    async fn encrypt_uint16(&self, value: u16) -> Result<Vec<u8>, EngineError> {
        self.ciphertext("encrypt_uint16", 16, &value.to_be_bytes())
    }

    async fn encrypt_uint32(&self, value: u32) -> Result<Vec<u8>, EngineError> {
        self.ciphertext("encrypt_uint32", 32, &value.to_be_bytes())
    }

    async fn encrypt_uint64(&self, value: u64) -> Result<Vec<u8>, EngineError> {
        self.ciphertext("encrypt_uint64", 64, &value.to_be_bytes())
    }

    async fn encrypt_uint128(&self, value: u128) -> Result<Vec<u8>, EngineError> {
        self.ciphertext("encrypt_uint128", 128, &value.to_be_bytes())
    }

    async fn encrypt_uint256(&self, value: U256) -> Result<Vec<u8>, EngineError> {
        self.ciphertext("encrypt_uint256", 255, &value.to_be_bytes::<32>())
    }

    async fn encrypt_address(&self, value: &str) -> Result<Vec<u8>, EngineError> {
        self.ciphertext("encrypt_address", 160, value.as_bytes())
    }

    async fn encrypt_bytes256(&self, value: &str) -> Result<Vec<u8>, EngineError> {
        self.ciphertext("encrypt_bytes256", 200, value.as_bytes())
    }

    async fn decrypt(
        &self,
        _contract_address: &str,
        _handle: &str,
        signature: Option<&str>,
    ) -> Result<ClearValue, EngineError> {
        let mut state = self.state.lock().unwrap();
        if !state.decrypt_supported {
            return Err(EngineError::Unsupported("Decryption"));
        }
        self.decrypt_calls.fetch_add(1, Ordering::SeqCst);
        state.last_signature = signature.map(str::to_string);
        match state.decrypt_script.pop_front() {
            Some(result) => result,
            None => state
                .decrypt_default
                .clone()
                .unwrap_or_else(|| Err(EngineError::Rejected("no result scripted".into()))),
        }
    }

    async fn generate_permit_signature(
        &self,
        contract_address: &str,
        user_address: &str,
    ) -> Result<String, EngineError> {
        if !self.state.lock().unwrap().permits_supported {
            return Err(EngineError::Unsupported("Permission signature generation"));
        }
        Ok(format!("permit:{contract_address}:{user_address}"))
    }

    fn generate_keypair(&self) -> Result<KeyPair, EngineError> {
        if !self.state.lock().unwrap().keypairs_supported {
            return Err(EngineError::Unsupported("Key pair generation"));
        }
        Ok(KeyPair {
            public_key: "0xpub".to_string(),
            private_key: "0xpriv".to_string(),
        })
    }
}

/// Connector handing out a shared [`MockEngine`], or failing every bind.
pub struct MockConnector {
    engine: Option<MockEngine>,
    failure: Option<String>,
    connects: AtomicUsize,
    last_params: Mutex<Option<EngineParams>>,
}

impl MockConnector {
    pub fn new(engine: MockEngine) -> Self {
        Self {
            engine: Some(engine),
            failure: None,
            connects: AtomicUsize::new(0),
            last_params: Mutex::new(None),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            engine: None,
            failure: Some(message.to_string()),
            connects: AtomicUsize::new(0),
            last_params: Mutex::new(None),
        }
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn last_params(&self) -> Option<EngineParams> {
        self.last_params.lock().unwrap().clone()
    }
}

#[async_trait]
impl EngineConnector for MockConnector {
    async fn connect(&self, params: &EngineParams) -> Result<Arc<dyn FhevmEngine>, EngineError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        *self.last_params.lock().unwrap() = Some(params.clone());
        match (&self.engine, &self.failure) {
            (Some(engine), _) => Ok(Arc::new(engine.clone())),
            (None, Some(message)) => Err(EngineError::Transport(message.clone())),
            (None, None) => Err(EngineError::Transport("no engine configured".into())),
        }
    }
}
