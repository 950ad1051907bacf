// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The socket-link server (§4.4): one per registered transport entry, owns
//! the connection and the link map, and dispatches inbound control-plane
//! messages by source address.

use std::collections::HashMap;
use std::sync::Arc;

use edgeproxy_core::{Address, ErrorCode};
use edgeproxy_pal::PalSocketFactory;
use edgeproxy_transport::{Connection, ConnectionEvent};
use edgeproxy_wire::{Message, MessageBody, MessageType};
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::link::Link;
use crate::state::LinkState;

pub struct LinkServer {
    connection: Arc<dyn Connection>,
    factory: Arc<dyn PalSocketFactory>,
    self_address: Address,
    links: Mutex<HashMap<Address, Arc<Link>>>,
}

impl LinkServer {
    pub fn new(connection: Arc<dyn Connection>, factory: Arc<dyn PalSocketFactory>, self_address: Address) -> Arc<Self> {
        Arc::new(LinkServer { connection, factory, self_address, links: Mutex::new(HashMap::new()) })
    }

    pub fn link_count(&self) -> usize {
        self.links.lock().len()
    }

    pub fn link(&self, address: &Address) -> Option<Arc<Link>> {
        self.links.lock().get(address).cloned()
    }

    /// Drains `events` until the connection reports `closed`. Runs as a
    /// single task, so dispatch is serialized the way §5 requires.
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<ConnectionEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                ConnectionEvent::Received(msg) => self.dispatch(msg).await,
                ConnectionEvent::Reconnecting(err) => {
                    tracing::warn!(?err, "transport reconnecting; notifying every link to decide locally whether to drain or fail inflight work");
                    let links: Vec<Arc<Link>> = self.links.lock().values().cloned().collect();
                    for link in links {
                        link.notify_reconnecting();
                    }
                }
                ConnectionEvent::Closed => {
                    self.teardown_all().await;
                    break;
                }
            }
        }
    }

    async fn teardown_all(&self) {
        let links: Vec<Arc<Link>> = self.links.lock().drain().map(|(_, link)| link).collect();
        for link in links {
            let close_msg = Message::request(link.address(), self.self_address, 0, MessageBody::LinkClose);
            let _ = link.handle(&close_msg).await;
        }
    }

    async fn dispatch(self: &Arc<Self>, msg: Message) {
        let response = match msg.r#type {
            MessageType::Ping => msg.respond(ErrorCode::Ok, MessageBody::Empty),
            MessageType::Resolve => msg.respond(ErrorCode::NotSupported, MessageBody::Empty),
            MessageType::LinkClose => self.dispatch_close(&msg).await,
            MessageType::LinkOpen => self.dispatch_open(&msg).await,
            _ => self.dispatch_to_existing(&msg).await,
        };
        if self.connection.send(response).await.is_err() {
            tracing::debug!(address = %msg.source_address, "dropped response: connection closed");
        }
    }

    async fn dispatch_close(&self, msg: &Message) -> Message {
        match self.link(&msg.source_address) {
            Some(link) => link.handle(msg).await.0,
            // Closing an address the server never heard of is idempotent (§4.4).
            None => msg.respond(ErrorCode::Ok, MessageBody::Empty),
        }
    }

    async fn dispatch_open(self: &Arc<Self>, msg: &Message) -> Message {
        if self.links.lock().contains_key(&msg.source_address) {
            return msg.respond(ErrorCode::AlreadyExists, MessageBody::Empty);
        }
        let link = Link::new(msg.source_address, self.factory.clone());
        self.links.lock().insert(msg.source_address, link.clone());
        link.handle(msg).await.0
    }

    async fn dispatch_to_existing(self: &Arc<Self>, msg: &Message) -> Message {
        let Some(link) = self.link(&msg.source_address) else {
            return msg.respond(ErrorCode::NotFound, MessageBody::Empty);
        };
        let (response, accepted) = link.handle(msg).await;

        if matches!(msg.r#type, MessageType::LinkConnect) && link.state() == LinkState::Connected {
            link.spawn_receive_pump(self.connection.clone(), self.self_address);
        }
        if let Some(new_link) = accepted {
            self.links.lock().insert(new_link.address(), new_link.clone());
            new_link.spawn_receive_pump(self.connection.clone(), self.self_address);
        }
        response
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
