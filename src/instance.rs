// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Engine instance lifecycle.
//!
//! `Uninitialized -> Initializing -> Ready`, or `Initializing -> Failed`
//! where failure is the returned error and no instance exists. An instance
//! is an immutable binding between one network profile and one engine;
//! reinitialization allocates a new instance with a newer generation and
//! leaves the old one untouched.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::config::{ConfigOverrides, FhevmConfig};
use crate::engine::{EngineConnector, EngineParams, FhevmEngine};
use crate::error::{FhevmError, Result};
use crate::network::{self, NetworkProfile};
use crate::signing::AddressSource;

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// A ready binding between a network profile and the external engine.
pub struct EngineInstance {
    engine: Arc<dyn FhevmEngine>,
    profile: NetworkProfile,
    ready: bool,
    /// Lazily filled by [`get_public_key`]
    public_key: Mutex<Option<String>>,
    generation: u64,
    signer: Option<Arc<dyn AddressSource>>,
}

impl EngineInstance {
    pub fn profile(&self) -> &NetworkProfile {
        &self.profile
    }

    pub fn engine(&self) -> &Arc<dyn FhevmEngine> {
        &self.engine
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Monotonic token identifying this binding; newer instances compare greater.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn signer(&self) -> Option<&Arc<dyn AddressSource>> {
        self.signer.as_ref()
    }

    /// Public key if already cached, without asking the engine.
    pub fn cached_public_key(&self) -> Option<String> {
        self.public_key.lock().ok().and_then(|guard| guard.clone())
    }

    #[cfg(test)]
    pub(crate) fn with_ready(mut self, ready: bool) -> Self {
        self.ready = ready;
        self
    }
}

impl fmt::Debug for EngineInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineInstance")
            .field("profile", &self.profile)
            .field("ready", &self.ready)
            .field("generation", &self.generation)
            .field("has_signer", &self.signer.is_some())
            .finish_non_exhaustive()
    }
}

/// Resolve the network profile and bind a new engine to it.
pub async fn create_instance(
    connector: &dyn EngineConnector,
    config: &FhevmConfig,
) -> Result<EngineInstance> {
    build_instance(connector, config, None).await
}

/// Same as [`create_instance`], attaching a wallet signer to the instance.
pub async fn create_instance_with_signer(
    connector: &dyn EngineConnector,
    config: &FhevmConfig,
    signer: Arc<dyn AddressSource>,
) -> Result<EngineInstance> {
    build_instance(connector, config, Some(signer)).await
}

async fn build_instance(
    connector: &dyn EngineConnector,
    config: &FhevmConfig,
    signer: Option<Arc<dyn AddressSource>>,
) -> Result<EngineInstance> {
    let profile = network::resolve(config)?;

    let engine = connector
        .connect(&EngineParams::from(&profile))
        .await
        .map_err(|e| {
            warn!(network = %profile.name, chain_id = profile.chain_id, error = %e, "Engine binding failed");
            FhevmError::Fhevm(format!("Failed to create FHEVM instance: {e}"))
        })?;

    let public_key = engine.public_key();
    let generation = NEXT_GENERATION.fetch_add(1, Ordering::Relaxed);

    info!(
        network = %profile.name,
        chain_id = profile.chain_id,
        gateway = %profile.gateway_url,
        generation,
        has_public_key = public_key.is_some(),
        "FHEVM instance ready"
    );

    Ok(EngineInstance {
        engine,
        profile,
        ready: true,
        public_key: Mutex::new(public_key),
        generation,
        signer,
    })
}

/// `true` iff an instance exists and is ready.
pub fn is_ready(instance: Option<&EngineInstance>) -> bool {
    instance.is_some_and(EngineInstance::is_ready)
}

pub(crate) fn ensure_ready(instance: &EngineInstance) -> Result<()> {
    if instance.ready {
        Ok(())
    } else {
        Err(FhevmError::NotReady)
    }
}

/// Network public key, fetched from the engine and cached on first use.
pub fn get_public_key(instance: &EngineInstance) -> Result<String> {
    let mut cached = instance
        .public_key
        .lock()
        .map_err(|_| FhevmError::Fhevm("Public key cache poisoned".to_string()))?;

    if cached.is_none() {
        *cached = instance.engine.public_key();
    }

    cached
        .clone()
        .ok_or_else(|| FhevmError::Fhevm("Public key not available".to_string()))
}

/// Wallet signer attached to the instance.
pub fn get_signer(instance: &EngineInstance) -> Result<Arc<dyn AddressSource>> {
    instance
        .signer
        .clone()
        .ok_or_else(|| FhevmError::Fhevm("Provider does not support getting signer".to_string()))
}

/// Build a new instance from the current profile merged with `overrides`.
///
/// The current instance is neither mutated nor invalidated; callers must
/// drop their reference to it. The signer carries over.
pub async fn reinitialize(
    connector: &dyn EngineConnector,
    current: &EngineInstance,
    overrides: ConfigOverrides,
) -> Result<EngineInstance> {
    let config = FhevmConfig::new(current.profile.clone()).merged_with(overrides);
    info!(
        network = %current.profile.name,
        previous_generation = current.generation,
        "Reinitializing FHEVM instance"
    );
    build_instance(connector, &config, current.signer.clone()).await
}
