// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Access-control list backings.
//!
//! An ACL maps `(contract_address, handle)` to the set of addresses allowed
//! to decrypt that handle. Addresses and handles are compared
//! case-insensitively.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{FhevmError, Result};

/// Authority deciding who may decrypt a ciphertext handle.
#[async_trait]
pub trait AclStore: Send + Sync {
    async fn grant(&self, contract_address: &str, handle: &str, grantee: &str) -> Result<()>;

    async fn revoke(&self, contract_address: &str, handle: &str, grantee: &str) -> Result<()>;

    async fn is_permitted(&self, contract_address: &str, handle: &str, user: &str)
        -> Result<bool>;

    async fn permitted_addresses(&self, contract_address: &str, handle: &str)
        -> Result<Vec<String>>;

    /// Ask the authority for access on behalf of `requester`.
    async fn request(&self, contract_address: &str, handle: &str, requester: &str) -> Result<()>;
}

/// Stand-in until an on-chain ACL contract is wired up.
///
/// Every check passes, every listing is empty, and every mutation fails.
/// A passing check from this store is not an access-control guarantee.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderAcl;

#[async_trait]
impl AclStore for PlaceholderAcl {
    async fn grant(&self, _contract_address: &str, _handle: &str, _grantee: &str) -> Result<()> {
        Err(FhevmError::Permission(
            "Permission granting not yet implemented".to_string(),
        ))
    }

    async fn revoke(&self, _contract_address: &str, _handle: &str, _grantee: &str) -> Result<()> {
        Err(FhevmError::Permission(
            "Permission revocation not yet implemented".to_string(),
        ))
    }

    async fn is_permitted(
        &self,
        _contract_address: &str,
        _handle: &str,
        _user: &str,
    ) -> Result<bool> {
        Ok(true)
    }

    async fn permitted_addresses(
        &self,
        _contract_address: &str,
        _handle: &str,
    ) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn request(&self, _contract_address: &str, _handle: &str, _requester: &str) -> Result<()> {
        Err(FhevmError::Permission(
            "ACL-based permissions not yet implemented".to_string(),
        ))
    }
}

type AclKey = (String, String);

fn key(contract_address: &str, handle: &str) -> AclKey {
    (contract_address.to_lowercase(), handle.to_lowercase())
}

/// Process-local ACL.
///
/// Requests are recorded as pending and do not grant access by themselves.
#[derive(Debug, Default)]
pub struct InMemoryAcl {
    grants: RwLock<HashMap<AclKey, BTreeSet<String>>>,
    requests: RwLock<HashMap<AclKey, BTreeSet<String>>>,
}

impl InMemoryAcl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Addresses that asked for access and were not granted yet.
    pub async fn pending_requests(&self, contract_address: &str, handle: &str) -> Vec<String> {
        self.requests
            .read()
            .await
            .get(&key(contract_address, handle))
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AclStore for InMemoryAcl {
    async fn grant(&self, contract_address: &str, handle: &str, grantee: &str) -> Result<()> {
        let k = key(contract_address, handle);
        let grantee = grantee.to_lowercase();

        // lock order: requests, then grants
        let mut requests = self.requests.write().await;
        if let Some(pending) = requests.get_mut(&k) {
            pending.remove(&grantee);
            if pending.is_empty() {
                requests.remove(&k);
            }
        }
        self.grants
            .write()
            .await
            .entry(k)
            .or_default()
            .insert(grantee.clone());
        drop(requests);

        debug!(contract = contract_address, handle, grantee = %grantee, "ACL grant recorded");
        Ok(())
    }

    async fn revoke(&self, contract_address: &str, handle: &str, grantee: &str) -> Result<()> {
        let k = key(contract_address, handle);
        let grantee = grantee.to_lowercase();

        let mut grants = self.grants.write().await;
        let removed = grants.get_mut(&k).is_some_and(|set| set.remove(&grantee));
        if grants.get(&k).is_some_and(BTreeSet::is_empty) {
            grants.remove(&k);
        }

        if !removed {
            return Err(FhevmError::Permission(format!(
                "{grantee} has no permission on handle {handle}"
            )));
        }
        debug!(contract = contract_address, handle, grantee = %grantee, "ACL grant revoked");
        Ok(())
    }

    async fn is_permitted(&self, contract_address: &str, handle: &str, user: &str) -> Result<bool> {
        Ok(self
            .grants
            .read()
            .await
            .get(&key(contract_address, handle))
            .is_some_and(|set| set.contains(&user.to_lowercase())))
    }

    async fn permitted_addresses(&self, contract_address: &str, handle: &str) -> Result<Vec<String>> {
        Ok(self
            .grants
            .read()
            .await
            .get(&key(contract_address, handle))
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn request(&self, contract_address: &str, handle: &str, requester: &str) -> Result<()> {
        let k = key(contract_address, handle);
        let requester = requester.to_lowercase();

        let mut requests = self.requests.write().await;
        let granted = self
            .grants
            .read()
            .await
            .get(&k)
            .is_some_and(|set| set.contains(&requester));
        if !granted {
            requests.entry(k).or_default().insert(requester);
        }
        Ok(())
    }
}
