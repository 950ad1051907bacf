// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A single link: one socket-backed endpoint reachable by address on the
//! control plane (§4.5).
//!
//! Every inbound message to a link arrives already serialized by the socket-
//! link server's dispatch loop (§4.4), so `Link` itself needs no task
//! affinity assertion of its own — the server is the one scheduler this
//! object is ever touched from.

use std::collections::{HashMap, VecDeque};
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use edgeproxy_core::{Address, ErrorCode};
use edgeproxy_pal::{PalSocket, PalSocketFactory, SocketSpec};
use edgeproxy_transport::Connection;
use edgeproxy_wire::{Message, MessageBody, MessageType, SocketAddress, SocketType};
use parking_lot::Mutex;

use crate::state::LinkState;

fn wire_addr_to_std(addr: &SocketAddress) -> Result<SocketAddr, ErrorCode> {
    match addr {
        SocketAddress::Ip { host, port } => {
            let ip = IpAddr::from_str(host).map_err(|_| ErrorCode::NoAddress)?;
            Ok(SocketAddr::new(ip, *port))
        }
        SocketAddress::Unresolved { .. } => Err(ErrorCode::NoHost),
    }
}

/// One entry in the socket-link server's link map.
pub struct Link {
    address: Address,
    factory: Arc<dyn PalSocketFactory>,
    state: Mutex<LinkState>,
    socket: Mutex<Option<Arc<dyn PalSocket>>>,
    send_queue: Mutex<VecDeque<Vec<u8>>>,
    next_seq: AtomicU32,
    // At-most-once cache for state-advancing control messages (§4.5): a
    // retry with a correlation id already seen for this link replays the
    // recorded response instead of re-running the operation.
    response_cache: Mutex<HashMap<u64, Message>>,
    // Counts transport `reconnecting` notices this link has observed. The
    // link decides locally whether to drain or fail inflight work (§9
    // design notes); today it's a no-op beyond the count, but real links
    // (e.g. ones with a send queue backed up) are the natural place to act
    // on it.
    reconnects: AtomicU32,
    // Guards `spawn_receive_pump` so a retried `link-connect` (replayed from
    // `response_cache` without touching state) can't start a second receive
    // loop on the same socket.
    pump_started: AtomicBool,
}

impl Link {
    pub fn new(address: Address, factory: Arc<dyn PalSocketFactory>) -> Arc<Self> {
        Arc::new(Link {
            address,
            factory,
            state: Mutex::new(LinkState::Created),
            socket: Mutex::new(None),
            send_queue: Mutex::new(VecDeque::new()),
            next_seq: AtomicU32::new(0),
            response_cache: Mutex::new(HashMap::new()),
            reconnects: AtomicU32::new(0),
            pump_started: AtomicBool::new(false),
        })
    }

    /// Wraps an already-connected socket (used for accepted connections),
    /// skipping straight to `connected`.
    fn from_socket(address: Address, factory: Arc<dyn PalSocketFactory>, socket: Arc<dyn PalSocket>) -> Arc<Self> {
        let link = Link::new(address, factory);
        *link.state.lock() = LinkState::Connected;
        *link.socket.lock() = Some(socket);
        link
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn state(&self) -> LinkState {
        *self.state.lock()
    }

    /// Records a transport `reconnecting` notice (§4.4, §9 design notes).
    pub fn notify_reconnecting(&self) {
        self.reconnects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reconnect_count(&self) -> u32 {
        self.reconnects.load(Ordering::Relaxed)
    }

    fn socket_handle(&self) -> Result<Arc<dyn PalSocket>, ErrorCode> {
        self.socket.lock().clone().ok_or(ErrorCode::BadState)
    }

    async fn close_now(&self) {
        let socket = self.socket.lock().take();
        if let Some(socket) = socket {
            let _ = socket.close().await;
        }
    }

    /// Handles one inbound message addressed to this link, returning the
    /// response to send back on the control plane and, for `link-accept`,
    /// the freshly created link the server must insert into its map.
    pub async fn handle(self: &Arc<Self>, msg: &Message) -> (Message, Option<Arc<Link>>) {
        if let Some(cached) = self.response_cache.lock().get(&msg.correlation_id).cloned() {
            return (cached, None);
        }

        let (response, new_link) = self.dispatch(msg).await;

        if matches!(
            msg.r#type,
            MessageType::LinkOpen
                | MessageType::LinkBind
                | MessageType::LinkListen
                | MessageType::LinkConnect
                | MessageType::LinkClose
        ) {
            self.response_cache.lock().insert(msg.correlation_id, response.clone());
        }
        (response, new_link)
    }

    async fn dispatch(self: &Arc<Self>, msg: &Message) -> (Message, Option<Arc<Link>>) {
        match &msg.body {
            MessageBody::LinkOpen { sock_type, address, .. } => {
                (self.handle_open(msg, *sock_type, address.as_ref()).await, None)
            }
            MessageBody::LinkBind { address } => (self.handle_bind(msg, address).await, None),
            MessageBody::LinkListen { backlog } => (self.handle_listen(msg, *backlog).await, None),
            MessageBody::LinkConnect { address } => (self.handle_connect(msg, address).await, None),
            MessageBody::LinkAccept => self.handle_accept(msg).await,
            MessageBody::LinkClose => (self.handle_close(msg).await, None),
            MessageBody::LinkSetOpt { .. } | MessageBody::LinkGetOpt { .. } => {
                (msg.respond(ErrorCode::NotImpl, MessageBody::Empty), None)
            }
            MessageBody::Data { buffer } => (self.handle_data(msg, buffer).await, None),
            MessageBody::Poll { timeout_ms, max } => (self.handle_poll(msg, *timeout_ms, *max).await, None),
            MessageBody::Ping | MessageBody::Empty => (msg.respond(ErrorCode::Ok, MessageBody::Empty), None),
            MessageBody::Resolve { .. } => (msg.respond(ErrorCode::NotSupported, MessageBody::Empty), None),
        }
    }

    async fn handle_open(self: &Arc<Self>, msg: &Message, sock_type: SocketType, _address: Option<&SocketAddress>) -> Message {
        if self.state() != LinkState::Created {
            return msg.respond(ErrorCode::BadState, MessageBody::Empty);
        }
        match self.factory.create(SocketSpec { stream: !matches!(sock_type, SocketType::Dgram) }).await {
            Ok(socket) => {
                *self.socket.lock() = Some(Arc::from(socket));
                *self.state.lock() = LinkState::Opened;
                msg.respond(ErrorCode::Ok, MessageBody::Empty)
            }
            Err(code) => msg.respond(code, MessageBody::Empty),
        }
    }

    async fn handle_bind(&self, msg: &Message, address: &SocketAddress) -> Message {
        if self.state() != LinkState::Opened {
            return msg.respond(ErrorCode::BadState, MessageBody::Empty);
        }
        let addr = match wire_addr_to_std(address) {
            Ok(a) => a,
            Err(code) => return msg.respond(code, MessageBody::Empty),
        };
        let socket = match self.socket_handle() {
            Ok(s) => s,
            Err(code) => return msg.respond(code, MessageBody::Empty),
        };
        match socket.bind(addr).await {
            Ok(_) => {
                *self.state.lock() = LinkState::Bound;
                msg.respond(ErrorCode::Ok, MessageBody::Empty)
            }
            Err(code) => msg.respond(code, MessageBody::Empty),
        }
    }

    async fn handle_listen(&self, msg: &Message, backlog: u32) -> Message {
        if !matches!(self.state(), LinkState::Opened | LinkState::Bound) {
            return msg.respond(ErrorCode::BadState, MessageBody::Empty);
        }
        let socket = match self.socket_handle() {
            Ok(s) => s,
            Err(code) => return msg.respond(code, MessageBody::Empty),
        };
        match socket.listen(backlog).await {
            Ok(()) => {
                *self.state.lock() = LinkState::Listening;
                msg.respond(ErrorCode::Ok, MessageBody::Empty)
            }
            Err(code) => msg.respond(code, MessageBody::Empty),
        }
    }

    async fn handle_connect(self: &Arc<Self>, msg: &Message, address: &SocketAddress) -> Message {
        if self.state() != LinkState::Opened {
            return msg.respond(ErrorCode::BadState, MessageBody::Empty);
        }
        let addr = match wire_addr_to_std(address) {
            Ok(a) => a,
            Err(code) => return msg.respond(code, MessageBody::Empty),
        };
        let socket = match self.socket_handle() {
            Ok(s) => s,
            Err(code) => return msg.respond(code, MessageBody::Empty),
        };
        *self.state.lock() = LinkState::Connecting;
        match socket.connect(addr).await {
            Ok(()) => {
                *self.state.lock() = LinkState::Connected;
                msg.respond(ErrorCode::Ok, MessageBody::Empty)
            }
            Err(code) => {
                *self.state.lock() = LinkState::Closing;
                self.close_now().await;
                *self.state.lock() = LinkState::Closed;
                msg.respond(code, MessageBody::Empty)
            }
        }
    }

    /// Pragmatic encoding of the new link's address in an accept response:
    /// the closed message-body set has no dedicated "new-address" variant,
    /// so the 16 raw address bytes ride in a `data` body.
    async fn handle_accept(self: &Arc<Self>, msg: &Message) -> (Message, Option<Arc<Link>>) {
        if self.state() != LinkState::Listening {
            return (msg.respond(ErrorCode::BadState, MessageBody::Empty), None);
        }
        let socket = match self.socket_handle() {
            Ok(s) => s,
            Err(code) => return (msg.respond(code, MessageBody::Empty), None),
        };
        match socket.accept().await {
            Ok(accepted) => {
                let new_address = Address::random();
                let new_link = Link::from_socket(new_address, self.factory.clone(), Arc::from(accepted));
                let response = msg.respond(ErrorCode::Ok, MessageBody::Data { buffer: new_address.as_bytes().to_vec() });
                (response, Some(new_link))
            }
            Err(code) => (msg.respond(code, MessageBody::Empty), None),
        }
    }

    async fn handle_close(self: &Arc<Self>, msg: &Message) -> Message {
        if self.state().is_closed_or_closing() {
            return msg.respond(ErrorCode::Ok, MessageBody::Empty);
        }
        *self.state.lock() = LinkState::Closing;
        self.close_now().await;
        *self.state.lock() = LinkState::Closed;
        msg.respond(ErrorCode::Ok, MessageBody::Empty)
    }

    async fn handle_data(&self, msg: &Message, buffer: &[u8]) -> Message {
        if self.state().is_closed_or_closing() {
            return msg.respond(ErrorCode::Undelivered, MessageBody::Empty);
        }
        if self.state() != LinkState::Connected {
            return msg.respond(ErrorCode::BadState, MessageBody::Empty);
        }
        self.send_queue.lock().push_back(buffer.to_vec());
        match self.drain_send_queue().await {
            Ok(()) => msg.respond(ErrorCode::Ok, MessageBody::Empty),
            Err(code) => {
                *self.state.lock() = LinkState::Closing;
                self.close_now().await;
                *self.state.lock() = LinkState::Closed;
                msg.respond(code, MessageBody::Empty)
            }
        }
    }

    /// Send pump (§4.5): pops the queue front, hands it to the PAL; on
    /// `retry` the buffer goes back to the head and the pump stops for now
    /// (re-armed by the next `data` message or poll).
    async fn drain_send_queue(&self) -> Result<(), ErrorCode> {
        loop {
            let buf = {
                let mut queue = self.send_queue.lock();
                match queue.pop_front() {
                    Some(b) => b,
                    None => return Ok(()),
                }
            };
            let socket = self.socket_handle()?;
            match socket.send(&buf).await {
                Ok(_) => continue,
                Err(ErrorCode::Retry) => {
                    self.send_queue.lock().push_front(buf);
                    return Ok(());
                }
                Err(code) => return Err(code),
            }
        }
    }

    async fn handle_poll(&self, msg: &Message, timeout_ms: u32, max: u32) -> Message {
        if self.state() != LinkState::Connected {
            return msg.respond(ErrorCode::BadState, MessageBody::Empty);
        }
        let socket = match self.socket_handle() {
            Ok(s) => s,
            Err(code) => return msg.respond(code, MessageBody::Empty),
        };
        let recv = tokio::time::timeout(std::time::Duration::from_millis(timeout_ms as u64), socket.recv(max as usize)).await;
        match recv {
            Ok(Ok(buffer)) => msg.respond(ErrorCode::Ok, MessageBody::Data { buffer }),
            Ok(Err(code)) => msg.respond(code, MessageBody::Empty),
            Err(_) => msg.respond(ErrorCode::Ok, MessageBody::Data { buffer: Vec::new() }),
        }
    }

    /// Receive pump (§4.5): posts a `data` message per non-empty read,
    /// stopping (without closing the link) on the first empty read, which
    /// signals the peer's write half closed.
    pub fn spawn_receive_pump(self: Arc<Self>, connection: Arc<dyn Connection>, proxy_address: Address) {
        if self.pump_started.swap(true, Ordering::SeqCst) {
            return;
        }
        tokio::spawn(async move {
            loop {
                if self.state().is_closed_or_closing() {
                    break;
                }
                let socket = match self.socket_handle() {
                    Ok(s) => s,
                    Err(_) => break,
                };
                match socket.recv(4096).await {
                    Ok(buffer) if buffer.is_empty() => break,
                    Ok(buffer) => {
                        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
                        let mut data_msg = Message::request(self.address, proxy_address, 0, MessageBody::Data { buffer });
                        data_msg.sequence_id = seq;
                        if connection.send(data_msg).await.is_err() {
                            break;
                        }
                    }
                    Err(code) if code.is_terminal_io() => {
                        *self.state.lock() = LinkState::Closing;
                        self.close_now().await;
                        *self.state.lock() = LinkState::Closed;
                        break;
                    }
                    Err(_) => break,
                }
            }
        });
    }
}

#[cfg(test)]
#[path = "link_tests.rs"]
mod tests;
