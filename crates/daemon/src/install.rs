// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `proxyd --install`/`--uninstall` (§6, §10.6): registers or deregisters
//! this proxy against both name-service registries. The original source
//! also contacts the hub directly over MQTT during install; that client is
//! out of scope here (§1 Non-goals), so installing is expressed purely as
//! writing the same two JSON records a successful install would have left
//! behind, through the accessor in `edgeproxy-storage`.

use edgeproxy_core::id::{IdGen, UuidIdGen};
use edgeproxy_storage::{EntryKind, NameServiceEntry, Registry};

use crate::config::ProxyConfig;
use crate::error::DaemonError;

pub fn install(config: &ProxyConfig) -> Result<(), DaemonError> {
    let mut local = Registry::load(&config.local_registry_path)?;
    let mut hub = Registry::load(&config.hub_registry_path)?;

    let entry = NameServiceEntry {
        id: UuidIdGen.next(),
        name: config.name.clone(),
        kind: EntryKind::Proxy,
        address: None,
        connection_string: Some(config.connection_string.clone()),
    };

    local.upsert(entry.clone())?;
    hub.upsert(entry)?;

    tracing::info!(name = %config.name, "proxy installed");
    Ok(())
}

pub fn uninstall(config: &ProxyConfig) -> Result<(), DaemonError> {
    let mut local = Registry::load(&config.local_registry_path)?;
    let mut hub = Registry::load(&config.hub_registry_path)?;

    let victim = local.entries().find(|e| e.name == config.name).map(|e| e.id.clone());
    if let Some(id) = victim {
        local.remove(&id)?;
        let _ = hub.remove(&id);
    }

    tracing::info!(name = %config.name, "proxy uninstalled");
    Ok(())
}

#[cfg(test)]
#[path = "install_tests.rs"]
mod tests;
