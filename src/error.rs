// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Error taxonomy shared by every SDK component.
//!
//! One base kind (`Fhevm`) with six specializations. Engine and gateway
//! failures never reach callers raw; they are rewrapped into the kind of the
//! operation that observed them, with the original description embedded.

use serde::Serialize;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, FhevmError>;

/// Discriminant of an [`FhevmError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Fhevm,
    NotReady,
    Encryption,
    Decryption,
    Network,
    Validation,
    Permission,
}

impl ErrorKind {
    /// Whether this kind specializes the base `Fhevm` kind.
    pub fn is_specialization(&self) -> bool {
        !matches!(self, ErrorKind::Fhevm)
    }
}

/// Typed SDK failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FhevmError {
    #[error("{0}")]
    Fhevm(String),

    #[error("FHEVM instance is not ready. Wait for initialization to complete.")]
    NotReady,

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Decryption failed: {0}")]
    Decryption(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Permission error: {0}")]
    Permission(String),
}

impl FhevmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FhevmError::Fhevm(_) => ErrorKind::Fhevm,
            FhevmError::NotReady => ErrorKind::NotReady,
            FhevmError::Encryption(_) => ErrorKind::Encryption,
            FhevmError::Decryption(_) => ErrorKind::Decryption,
            FhevmError::Network(_) => ErrorKind::Network,
            FhevmError::Validation(_) => ErrorKind::Validation,
            FhevmError::Permission(_) => ErrorKind::Permission,
        }
    }

    /// Stable machine-readable code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            FhevmError::Fhevm(_) => "fhevm_error",
            FhevmError::NotReady => "fhevm_not_ready",
            FhevmError::Encryption(_) => "encryption_error",
            FhevmError::Decryption(_) => "decryption_error",
            FhevmError::Network(_) => "network_error",
            FhevmError::Validation(_) => "validation_error",
            FhevmError::Permission(_) => "permission_error",
        }
    }

    /// True when the failure reports a result that is not available yet.
    ///
    /// Used by the decryption poll loop to tell transient gateway states
    /// apart from hard failures.
    pub fn indicates_not_ready(&self) -> bool {
        self.to_string().to_ascii_lowercase().contains("not ready")
    }
}

/// Failures reported by the external cryptographic engine.
///
/// These stay internal to the SDK: every public operation maps them into
/// the [`FhevmError`] kind matching the operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The engine does not expose an optional capability.
    #[error("{0} not supported by this instance")]
    Unsupported(&'static str),

    /// The requested result exists but is not available yet.
    #[error("result not ready: {0}")]
    Pending(String),

    #[error("engine rejected request: {0}")]
    Rejected(String),

    #[error("transport failure: {0}")]
    Transport(String),
}
