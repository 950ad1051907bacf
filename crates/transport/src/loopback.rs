// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! An in-process transport test double: two [`LoopbackConnection`]s wired
//! directly to each other, with no network involved. Used to drive the
//! socket-link server and browse server end to end (S1, S6) without a real
//! broker.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use edgeproxy_core::ErrorCode;
use edgeproxy_wire::Message;
use tokio::sync::mpsc;

use crate::connection::{Connection, ConnectionEvent};

pub struct LoopbackConnection {
    /// Notified of events belonging to *this* connection (closed,
    /// reconnecting) — i.e. this connection's own owner's channel.
    own_events: mpsc::Sender<ConnectionEvent>,
    /// Where a `send` on this connection shows up as `Received` — the
    /// peer connection's owner's channel.
    peer_events: mpsc::Sender<ConnectionEvent>,
    closed: Arc<AtomicBool>,
}

impl LoopbackConnection {
    /// Creates two connections wired to each other: sending on one
    /// delivers `Received` to the other's owner.
    pub fn pair(
        events_a: mpsc::Sender<ConnectionEvent>,
        events_b: mpsc::Sender<ConnectionEvent>,
    ) -> (Arc<LoopbackConnection>, Arc<LoopbackConnection>) {
        let a = Arc::new(LoopbackConnection {
            own_events: events_a.clone(),
            peer_events: events_b.clone(),
            closed: Arc::new(AtomicBool::new(false)),
        });
        let b = Arc::new(LoopbackConnection {
            own_events: events_b,
            peer_events: events_a,
            closed: Arc::new(AtomicBool::new(false)),
        });
        (a, b)
    }

    /// Delivers an event as if the transport itself raised it (S6: a
    /// `reconnecting`/`closed` the test drives directly rather than via a
    /// peer `send`).
    pub async fn inject(&self, event: ConnectionEvent) {
        let _ = self.own_events.send(event).await;
    }
}

#[async_trait]
impl Connection for LoopbackConnection {
    async fn send(&self, message: Message) -> Result<(), ErrorCode> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ErrorCode::Closed);
        }
        self.peer_events
            .send(ConnectionEvent::Received(message))
            .await
            .map_err(|_| ErrorCode::Closed)
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.own_events.send(ConnectionEvent::Closed).await;
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "loopback_tests.rs"]
mod tests;
