// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon-level failures, mapped down to [`ErrorCode`] at the process
//! boundary (§4.7, §10.2) — the CLI's install/uninstall paths exit with
//! `.code().as_i32()` the same way the data path's errors reach a peer
//! (§6, §10.6).

use edgeproxy_core::ErrorCode;
use edgeproxy_storage::RegistryError;

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("transport error: {0}")]
    Transport(ErrorCode),
    #[error("daemon I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl DaemonError {
    pub fn code(&self) -> ErrorCode {
        match self {
            DaemonError::Config(_) => ErrorCode::Arg,
            DaemonError::Registry(e) => e.code(),
            DaemonError::Transport(code) => *code,
            DaemonError::Io(_) => ErrorCode::DiskIo,
        }
    }
}
