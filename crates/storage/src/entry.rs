// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use edgeproxy_wire::SocketAddress;
use serde::{Deserialize, Serialize};

/// A record identifying a proxy or a service endpoint (§3, §10.4).
///
/// Supplemented from the original `ns.local.json`/`ns.hub.json` registry
/// format — the core only consumes these four fields through the accessor
/// in this crate; the rest of the file layout is a collaborator concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameServiceEntry {
    pub id: String,
    pub name: String,
    pub kind: EntryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<SocketAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Proxy,
    Server,
    Host,
    Service,
}
