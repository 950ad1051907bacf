// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Internal registry failures, mapped down to [`ErrorCode`] at the
//! `Registry` boundary (§4.7, §10.2) — kept distinct so the daemon's
//! `tracing` output carries the underlying I/O or parse cause rather than
//! just the flattened wire code.

use edgeproxy_core::ErrorCode;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("registry I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("registry file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("entry {0:?} not found in registry")]
    NotFound(String),
    #[error("entry {0:?} already exists in registry")]
    AlreadyExists(String),
}

impl RegistryError {
    pub fn code(&self) -> ErrorCode {
        match self {
            RegistryError::Io(_) => ErrorCode::DiskIo,
            RegistryError::Json(_) => ErrorCode::InvalidFormat,
            RegistryError::NotFound(_) => ErrorCode::NotFound,
            RegistryError::AlreadyExists(_) => ErrorCode::AlreadyExists,
        }
    }
}
