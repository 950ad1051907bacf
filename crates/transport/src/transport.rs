// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The transport contract (§4.3) — the factory half, separate from
//! [`crate::connection::Connection`] itself.

use async_trait::async_trait;
use edgeproxy_core::ErrorCode;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::connection::{Connection, ConnectionEvent};

/// Creates connections to a single named entry (a registered proxy/hub
/// pair, per the name-service). Real adapters (MQTT-over-TLS, WS-over-TLS)
/// implement this against their respective protocols; this workspace ships
/// a loopback test double and a minimal non-TLS WebSocket reference
/// adapter.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Opens a connection to `entry`. Events for the connection's lifetime
    /// are delivered on `events`; the returned handle is used only to
    /// `send`/`close`.
    async fn create_connection(
        &self,
        entry: &str,
        events: mpsc::Sender<ConnectionEvent>,
    ) -> Result<Arc<dyn Connection>, ErrorCode>;
}
