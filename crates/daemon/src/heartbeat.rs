// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The connection-level self-ping (§9(b), §10.6): separate from whatever
//! keepalive the transport's own protocol provides, this detects a
//! silently dead connection before the next real send would. Grounded on
//! the browse server's `arm_timeout` debounce (`edgeproxy-browse`'s
//! `session.rs`) — a `do-later` that re-arms itself, except this one keeps
//! re-arming on every firing rather than only on a fresh external result.

use std::sync::Arc;
use std::time::Duration;

use edgeproxy_core::{Address, TimerId};
use edgeproxy_scheduler::{do_later, Scheduler};
use edgeproxy_transport::Connection;
use edgeproxy_wire::{Message, MessageBody, MessageFactory};

pub struct Heartbeat {
    scheduler: Arc<Scheduler>,
    connection: Arc<dyn Connection>,
    factory: Arc<MessageFactory>,
    self_address: Address,
    entry: String,
    interval: Duration,
}

impl Heartbeat {
    pub fn new(
        scheduler: Arc<Scheduler>,
        connection: Arc<dyn Connection>,
        factory: Arc<MessageFactory>,
        self_address: Address,
        entry: String,
        interval: Duration,
    ) -> Arc<Self> {
        Arc::new(Heartbeat { scheduler, connection, factory, self_address, entry, interval })
    }

    /// Arms the next self-ping. Unlike a browse stream timeout, this one
    /// re-arms itself every time it fires — it only stops when the
    /// connection is gone and a ping can no longer be sent.
    pub fn arm(self: &Arc<Self>) {
        let heartbeat = self.clone();
        do_later(&self.scheduler, TimerId::heartbeat(&self.entry), "heartbeat", self.interval, move || {
            tokio::spawn(heartbeat.clone().fire());
        });
    }

    async fn fire(self: Arc<Self>) {
        let (correlation_id, _pending) = match self.factory.begin_request() {
            Ok(pair) => pair,
            Err(code) => {
                tracing::trace!(error = %code, entry = %self.entry, "skipping heartbeat ping: connection is busy");
                self.arm();
                return;
            }
        };

        let ping = Message::request(self.self_address, Address::ZERO, correlation_id, MessageBody::Ping);
        let sent = self.connection.send(ping).await;
        self.factory.cancel(correlation_id);

        match sent {
            Ok(()) => {
                tracing::trace!(entry = %self.entry, "heartbeat ping sent");
                self.arm();
            }
            Err(code) => {
                tracing::debug!(%code, entry = %self.entry, "heartbeat ping failed: connection closed");
            }
        }
    }
}

#[cfg(test)]
#[path = "heartbeat_tests.rs"]
mod tests;
