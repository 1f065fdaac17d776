// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Decryption permissions: permit signatures and the access-control list.

pub mod acl;
pub mod manager;

pub use acl::{AclStore, InMemoryAcl, PlaceholderAcl};
pub use manager::PermissionManager;
