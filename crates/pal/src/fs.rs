// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dirpath` browsing (§4.6) — the filesystem half of the PAL.

use async_trait::async_trait;
use edgeproxy_core::ErrorCode;

/// One directory entry surfaced to a `dirpath` browse request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

#[async_trait]
pub trait PalFs: Send + Sync {
    async fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>, ErrorCode>;
}

/// The real, `tokio::fs`-backed implementation.
pub struct TokioFs;

#[async_trait]
impl PalFs for TokioFs {
    async fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>, ErrorCode> {
        let mut reader = tokio::fs::read_dir(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ErrorCode::NotFound
            } else {
                ErrorCode::DiskIo
            }
        })?;

        let mut entries = Vec::new();
        loop {
            let next = reader.next_entry().await.map_err(|_| ErrorCode::DiskIo)?;
            let Some(entry) = next else { break };
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            let name = entry.file_name().to_string_lossy().into_owned();
            entries.push(DirEntry { name, is_dir });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    pub struct FakeFs {
        pub dirs: HashMap<String, Vec<DirEntry>>,
    }

    impl FakeFs {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_dir(mut self, path: impl Into<String>, entries: Vec<DirEntry>) -> Self {
            self.dirs.insert(path.into(), entries);
            self
        }
    }

    #[async_trait]
    impl PalFs for FakeFs {
        async fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>, ErrorCode> {
            self.dirs.get(path).cloned().ok_or(ErrorCode::NotFound)
        }
    }
}

#[cfg(test)]
#[path = "fs_tests.rs"]
mod tests;
