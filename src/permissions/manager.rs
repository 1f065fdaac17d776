// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Permission manager.
//!
//! Every operation requires a ready instance and a well-formed contract
//! address. An omitted user address defaults to the instance's signer.
//! Failures surface as [`FhevmError::Permission`], except readiness and
//! contract-address checks which keep their own kinds, and
//! [`PermissionManager::check_permission`] which folds lookup failures into
//! `false`.

use std::sync::Arc;

use tracing::{debug, info};

use crate::engine::KeyPair;
use crate::error::{EngineError, FhevmError, Result};
use crate::instance::{ensure_ready, get_signer, EngineInstance};
use crate::permissions::acl::{AclStore, PlaceholderAcl};
use crate::signing::AddressSource;
use crate::validation::{is_valid_address, validate_contract_address};

/// Front door for permit signatures and ACL operations.
#[derive(Clone)]
pub struct PermissionManager {
    acl: Arc<dyn AclStore>,
}

impl PermissionManager {
    pub fn new(acl: Arc<dyn AclStore>) -> Self {
        Self { acl }
    }

    pub fn acl(&self) -> &Arc<dyn AclStore> {
        &self.acl
    }

    /// EIP-712 style permit binding `user_address` (or the signer) to
    /// `contract_address`.
    pub async fn generate_permission(
        &self,
        instance: &EngineInstance,
        contract_address: &str,
        user_address: Option<&str>,
    ) -> Result<String> {
        ensure_ready(instance)?;
        validate_contract_address(contract_address)?;

        let signed: Result<String> = async {
            let address = resolve_user(instance, user_address).await?;
            if !is_valid_address(&address) {
                return Err(FhevmError::Permission(format!(
                    "Invalid user address: {address}"
                )));
            }

            instance
                .engine()
                .generate_permit_signature(contract_address, &address)
                .await
                .map_err(|e| match e {
                    EngineError::Unsupported(_) => FhevmError::Permission(
                        "Permission signature generation not supported by this instance"
                            .to_string(),
                    ),
                    other => FhevmError::Permission(other.to_string()),
                })
        }
        .await;

        signed.map_err(|e| FhevmError::Permission(format!("Failed to generate permission: {e}")))
    }

    /// Ask the ACL for access to `handle` on behalf of the signer.
    pub async fn request_permission(
        &self,
        instance: &EngineInstance,
        contract_address: &str,
        handle: &str,
    ) -> Result<()> {
        ensure_ready(instance)?;
        validate_contract_address(contract_address)?;

        let outcome: Result<()> = async {
            let requester = resolve_user(instance, None).await?;
            self.acl.request(contract_address, handle, &requester).await
        }
        .await;

        outcome.map_err(|e| FhevmError::Permission(format!("Failed to request permission: {e}")))
    }

    /// Whether `user_address` (or the signer) may decrypt `handle`.
    ///
    /// An unready instance, an unresolvable address, or a failing ACL
    /// lookup all read as `false`. With the default [`PlaceholderAcl`]
    /// this is `true` for any resolvable address.
    pub async fn check_permission(
        &self,
        instance: &EngineInstance,
        contract_address: &str,
        handle: &str,
        user_address: Option<&str>,
    ) -> Result<bool> {
        if !instance.is_ready() {
            return Ok(false);
        }
        validate_contract_address(contract_address)?;

        let user = match resolve_user(instance, user_address).await {
            Ok(user) => user,
            Err(e) => {
                debug!(error = %e, "Permission check could not resolve user address");
                return Ok(false);
            }
        };

        match self.acl.is_permitted(contract_address, handle, &user).await {
            Ok(permitted) => Ok(permitted),
            Err(e) => {
                debug!(error = %e, handle, "ACL lookup failed");
                Ok(false)
            }
        }
    }

    pub async fn grant_permission(
        &self,
        instance: &EngineInstance,
        contract_address: &str,
        target_address: &str,
        handle: &str,
    ) -> Result<()> {
        ensure_ready(instance)?;
        validate_contract_address(contract_address)?;
        check_target(target_address)?;

        self.acl
            .grant(contract_address, handle, target_address)
            .await
            .map_err(|e| FhevmError::Permission(format!("Failed to grant permission: {e}")))?;

        info!(contract = contract_address, handle, target = target_address, "Permission granted");
        Ok(())
    }

    pub async fn revoke_permission(
        &self,
        instance: &EngineInstance,
        contract_address: &str,
        target_address: &str,
        handle: &str,
    ) -> Result<()> {
        ensure_ready(instance)?;
        validate_contract_address(contract_address)?;
        check_target(target_address)?;

        self.acl
            .revoke(contract_address, handle, target_address)
            .await
            .map_err(|e| FhevmError::Permission(format!("Failed to revoke permission: {e}")))?;

        info!(contract = contract_address, handle, target = target_address, "Permission revoked");
        Ok(())
    }

    pub async fn get_permitted_addresses(
        &self,
        instance: &EngineInstance,
        contract_address: &str,
        handle: &str,
    ) -> Result<Vec<String>> {
        ensure_ready(instance)?;
        validate_contract_address(contract_address)?;

        self.acl
            .permitted_addresses(contract_address, handle)
            .await
            .map_err(|e| FhevmError::Permission(format!("Failed to get permitted addresses: {e}")))
    }

    /// Fresh re-encryption key pair from the engine.
    pub fn generate_keypair(&self, instance: &EngineInstance) -> Result<KeyPair> {
        ensure_ready(instance)?;
        instance
            .engine()
            .generate_keypair()
            .map_err(|e| FhevmError::Permission(format!("Failed to generate key pair: {e}")))
    }
}

impl Default for PermissionManager {
    fn default() -> Self {
        Self::new(Arc::new(PlaceholderAcl))
    }
}

impl std::fmt::Debug for PermissionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionManager").finish_non_exhaustive()
    }
}

async fn resolve_user(instance: &EngineInstance, user_address: Option<&str>) -> Result<String> {
    match user_address {
        Some(address) if !address.is_empty() => Ok(address.to_string()),
        _ => get_signer(instance)?.address().await,
    }
}

fn check_target(target_address: &str) -> Result<()> {
    if is_valid_address(target_address) {
        Ok(())
    } else {
        Err(FhevmError::Permission(format!(
            "Invalid target address: {target_address}"
        )))
    }
}
