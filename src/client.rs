// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # FHEVM Client
//!
//! Long-lived handle owning the current engine instance.
//!
//! The client tracks the lifecycle state and hands out the current
//! [`EngineInstance`] behind an `Arc`. Reinitialization swaps the slot
//! atomically, so in-flight operations finish on the instance they started
//! with and later calls see the new one.
//!
//! Every operation issued before a successful [`FhevmClient::init`] fails
//! with [`FhevmError::NotReady`]. Dropping an `init` or `reinitialize`
//! future before it resolves leaves the state `Failed` and the current
//! instance untouched.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config::{ConfigOverrides, FhevmConfig};
use crate::decryption::{self, WaitOptions};
use crate::encryption::{self, EncryptedValue, EncryptionRequest};
use crate::engine::{ClearValue, EngineConnector};
use crate::error::{FhevmError, Result};
use crate::instance::{self, EngineInstance};
use crate::permissions::{AclStore, PermissionManager};
use crate::signing::AddressSource;
use crate::validation::{EncryptedType, InputType, PlainValue};

const CANCELLED: &str = "Initialization cancelled";

/// Lifecycle of the client's engine binding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum InstanceState {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
    /// Last (re)initialization failed with this message
    Failed(String),
}

fn lock_state(state: &Mutex<InstanceState>) -> MutexGuard<'_, InstanceState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Marks an unfinished transition as failed when dropped.
struct Transition {
    state: Arc<Mutex<InstanceState>>,
    done: bool,
}

impl Transition {
    fn complete(mut self, next: InstanceState) {
        *lock_state(&self.state) = next;
        self.done = true;
    }
}

impl Drop for Transition {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        let mut state = lock_state(&self.state);
        if *state == InstanceState::Initializing {
            warn!("FHEVM initialization cancelled");
            *state = InstanceState::Failed(CANCELLED.to_string());
        }
    }
}

#[derive(Clone)]
pub struct FhevmClient {
    config: FhevmConfig,
    connector: Arc<dyn EngineConnector>,
    signer: Option<Arc<dyn AddressSource>>,
    permissions: PermissionManager,
    state: Arc<Mutex<InstanceState>>,
    current: Arc<RwLock<Option<Arc<EngineInstance>>>>,
}

impl FhevmClient {
    pub fn new(connector: Arc<dyn EngineConnector>, config: FhevmConfig) -> Self {
        Self {
            config,
            connector,
            signer: None,
            permissions: PermissionManager::default(),
            state: Arc::new(Mutex::new(InstanceState::Uninitialized)),
            current: Arc::new(RwLock::new(None)),
        }
    }

    pub fn with_signer(mut self, signer: Arc<dyn AddressSource>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn with_acl(mut self, acl: Arc<dyn AclStore>) -> Self {
        self.permissions = PermissionManager::new(acl);
        self
    }

    pub fn config(&self) -> &FhevmConfig {
        &self.config
    }

    pub fn permissions(&self) -> &PermissionManager {
        &self.permissions
    }

    /// Bind a fresh engine instance from the client configuration.
    pub async fn init(&self) -> Result<Arc<EngineInstance>> {
        let transition = self.begin_transition()?;

        let created = match &self.signer {
            Some(signer) => {
                instance::create_instance_with_signer(
                    self.connector.as_ref(),
                    &self.config,
                    signer.clone(),
                )
                .await
            }
            None => instance::create_instance(self.connector.as_ref(), &self.config).await,
        };

        self.finish_transition(transition, created).await
    }

    /// Replace the current instance with one built from its profile merged
    /// with `overrides`.
    pub async fn reinitialize(&self, overrides: ConfigOverrides) -> Result<Arc<EngineInstance>> {
        let current = self.instance().await?;
        let transition = self.begin_transition()?;

        let created = instance::reinitialize(self.connector.as_ref(), &current, overrides).await;
        self.finish_transition(transition, created).await
    }

    fn begin_transition(&self) -> Result<Transition> {
        let mut state = lock_state(&self.state);
        if *state == InstanceState::Initializing {
            return Err(FhevmError::Fhevm(
                "Initialization already in progress".to_string(),
            ));
        }
        *state = InstanceState::Initializing;
        Ok(Transition {
            state: self.state.clone(),
            done: false,
        })
    }

    async fn finish_transition(
        &self,
        transition: Transition,
        created: Result<EngineInstance>,
    ) -> Result<Arc<EngineInstance>> {
        let mut current = self.current.write().await;
        match created {
            Ok(fresh) => {
                let fresh = Arc::new(fresh);
                if let Some(previous) = current.replace(fresh.clone()) {
                    info!(
                        previous_generation = previous.generation(),
                        generation = fresh.generation(),
                        "FHEVM instance replaced"
                    );
                }
                transition.complete(InstanceState::Ready);
                Ok(fresh)
            }
            Err(e) => {
                warn!(error = %e, "FHEVM initialization failed");
                *current = None;
                transition.complete(InstanceState::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    pub async fn state(&self) -> InstanceState {
        lock_state(&self.state).clone()
    }

    pub async fn is_ready(&self) -> bool {
        let current = self.current.read().await;
        instance::is_ready(current.as_deref())
    }

    /// Current instance. During a reinitialization this is still the
    /// previous one.
    pub async fn instance(&self) -> Result<Arc<EngineInstance>> {
        self.current
            .read()
            .await
            .clone()
            .ok_or(FhevmError::NotReady)
    }

    pub async fn public_key(&self) -> Result<String> {
        let instance = self.instance().await?;
        instance::get_public_key(&instance)
    }

    pub async fn encrypt(
        &self,
        value: impl Into<PlainValue>,
        ty: InputType,
    ) -> Result<EncryptedValue> {
        let instance = self.instance().await?;
        encryption::encrypt_value(&instance, value, ty).await
    }

    pub async fn encrypt_batch(&self, requests: Vec<EncryptionRequest>) -> Result<Vec<EncryptedValue>> {
        let instance = self.instance().await?;
        encryption::encrypt_batch(&instance, requests).await
    }

    pub async fn encrypt_address(&self, address: &str) -> Result<EncryptedValue> {
        let instance = self.instance().await?;
        encryption::encrypt_address(&instance, address).await
    }

    pub async fn decrypt(
        &self,
        contract_address: &str,
        handle: &str,
        expected_type: Option<EncryptedType>,
    ) -> Result<ClearValue> {
        let instance = self.instance().await?;
        decryption::request_decryption(&instance, contract_address, handle, expected_type).await
    }

    pub async fn wait_for_decryption(
        &self,
        contract_address: &str,
        handle: &str,
        options: WaitOptions,
    ) -> Result<ClearValue> {
        let instance = self.instance().await?;
        decryption::wait_for_decryption(&instance, contract_address, handle, options).await
    }

    pub async fn grant_permission(
        &self,
        contract_address: &str,
        target_address: &str,
        handle: &str,
    ) -> Result<()> {
        let instance = self.instance().await?;
        self.permissions
            .grant_permission(&instance, contract_address, target_address, handle)
            .await
    }

    pub async fn revoke_permission(
        &self,
        contract_address: &str,
        target_address: &str,
        handle: &str,
    ) -> Result<()> {
        let instance = self.instance().await?;
        self.permissions
            .revoke_permission(&instance, contract_address, target_address, handle)
            .await
    }

    pub async fn generate_permission(
        &self,
        contract_address: &str,
        user_address: Option<&str>,
    ) -> Result<String> {
        let instance = self.instance().await?;
        self.permissions
            .generate_permission(&instance, contract_address, user_address)
            .await
    }

    /// `false` while no instance is bound.
    pub async fn check_permission(
        &self,
        contract_address: &str,
        handle: &str,
        user_address: Option<&str>,
    ) -> Result<bool> {
        match self.instance().await {
            Ok(instance) => {
                self.permissions
                    .check_permission(&instance, contract_address, handle, user_address)
                    .await
            }
            Err(_) => Ok(false),
        }
    }
}

impl std::fmt::Debug for FhevmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FhevmClient")
            .field("config", &self.config)
            .field("has_signer", &self.signer.is_some())
            .finish_non_exhaustive()
    }
}
