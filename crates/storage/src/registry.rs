// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The name-service registry accessor (§10.4): load-on-startup,
//! atomic-write-on-change access to `ns.local.json`/`ns.hub.json`,
//! following the same temp-file/fsync/rename pattern the daemon's
//! snapshot storage uses for crash safety.

use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::entry::NameServiceEntry;
use crate::error::RegistryError;

/// A `ns.*.json` registry: an in-memory index over its entries, backed by
/// one file on disk. Not shared across threads on its own — callers hold
/// it behind whatever lock their process-wide state already uses (mirrors
/// `MaterializedState`'s role in the daemon's own storage layer).
#[derive(Debug, Clone)]
pub struct Registry {
    path: PathBuf,
    entries: HashMap<String, NameServiceEntry>,
}

impl Registry {
    /// Loads `path` if it exists, or starts empty — a missing registry
    /// file is not an error; it means no entries have been persisted yet.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        let path = path.into();
        let entries = match std::fs::read(&path) {
            Ok(bytes) => {
                let list: Vec<NameServiceEntry> = serde_json::from_slice(&bytes)?;
                list.into_iter().map(|e| (e.id.clone(), e)).collect()
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "registry file absent, starting empty");
                HashMap::new()
            }
            Err(err) => return Err(err.into()),
        };
        Ok(Registry { path, entries })
    }

    pub fn get(&self, id: &str) -> Option<&NameServiceEntry> {
        self.entries.get(id)
    }

    pub fn entries(&self) -> impl Iterator<Item = &NameServiceEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts a new entry and persists the registry. Fails if `entry.id`
    /// is already present — callers that mean to update an existing entry
    /// should use [`Registry::upsert`] instead.
    pub fn insert(&mut self, entry: NameServiceEntry) -> Result<(), RegistryError> {
        if self.entries.contains_key(&entry.id) {
            return Err(RegistryError::AlreadyExists(entry.id));
        }
        self.entries.insert(entry.id.clone(), entry);
        self.persist()
    }

    /// Inserts or replaces an entry by id, then persists.
    pub fn upsert(&mut self, entry: NameServiceEntry) -> Result<(), RegistryError> {
        self.entries.insert(entry.id.clone(), entry);
        self.persist()
    }

    pub fn remove(&mut self, id: &str) -> Result<NameServiceEntry, RegistryError> {
        let entry = self.entries.remove(id).ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        self.persist()?;
        Ok(entry)
    }

    /// Writes the whole entry set to a temp file in the registry's own
    /// directory, fsyncs it, then renames it over the target path — the
    /// rename is atomic on the same filesystem, so a crash mid-write never
    /// leaves a half-written `ns.*.json` behind.
    fn persist(&self) -> Result<(), RegistryError> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut list: Vec<&NameServiceEntry> = self.entries.values().collect();
        list.sort_by(|a, b| a.id.cmp(&b.id));

        let mut tmp = NamedTempFile::new_in(dir)?;
        let bytes = serde_json::to_vec_pretty(&list)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|err| RegistryError::Io(err.error))?;
        sync_dir(dir)?;
        Ok(())
    }
}

/// Fsyncs the containing directory so the rename itself survives a crash,
/// not just the file's contents.
fn sync_dir(dir: &Path) -> Result<(), RegistryError> {
    match File::open(dir) {
        Ok(f) => {
            if let Err(err) = f.sync_all() {
                warn!(dir = %dir.display(), error = %err, "failed to fsync registry directory");
            }
            Ok(())
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
