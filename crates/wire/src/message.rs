// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The control-plane message envelope (§3, §6).
//!
//! `type` ranges over a closed set; `body` is a tagged union keyed by that
//! same set. Keeping `r#type` and `body` as two fields (rather than folding
//! the type into the body's serde tag) matches the wire schema in §6, where
//! `type` is a standalone envelope field read before the body is decoded.

use edgeproxy_core::{Address, ErrorCode};
use serde::{Deserialize, Serialize};

/// The closed set of message types (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageType {
    Ping,
    Resolve,
    LinkOpen,
    LinkSetOpt,
    LinkGetOpt,
    LinkBind,
    LinkListen,
    LinkConnect,
    LinkAccept,
    LinkClose,
    Data,
    Poll,
}

impl MessageType {
    pub fn of(body: &MessageBody) -> Self {
        match body {
            MessageBody::Ping => MessageType::Ping,
            MessageBody::Resolve { .. } => MessageType::Resolve,
            MessageBody::LinkOpen { .. } => MessageType::LinkOpen,
            MessageBody::LinkSetOpt { .. } => MessageType::LinkSetOpt,
            MessageBody::LinkGetOpt { .. } => MessageType::LinkGetOpt,
            MessageBody::LinkBind { .. } => MessageType::LinkBind,
            MessageBody::LinkListen { .. } => MessageType::LinkListen,
            MessageBody::LinkConnect { .. } => MessageType::LinkConnect,
            MessageBody::LinkAccept => MessageType::LinkAccept,
            MessageBody::LinkClose => MessageType::LinkClose,
            MessageBody::Data { .. } => MessageType::Data,
            MessageBody::Poll { .. } => MessageType::Poll,
            MessageBody::Empty => MessageType::Ping,
        }
    }
}

/// Socket family, mirrors the PAL's address-family constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressFamily {
    Inet,
    Inet6,
    Unix,
    Unspec,
}

/// Socket type, mirrors the PAL's socket-type constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocketType {
    Stream,
    Dgram,
    Raw,
}

/// Transport protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    Tcp,
    Udp,
    Unspec,
}

/// A socket endpoint: either a resolved IP:port or an unresolved host:port
/// pending a `resolve`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SocketAddress {
    Ip { host: String, port: u16 },
    Unresolved { host: String, port: u16 },
}

impl SocketAddress {
    pub fn ip(host: impl Into<String>, port: u16) -> Self {
        SocketAddress::Ip { host: host.into(), port }
    }
}

impl std::fmt::Display for SocketAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SocketAddress::Ip { host, port } => write!(f, "{host}:{port}"),
            SocketAddress::Unresolved { host, port } => write!(f, "{host}:{port} (unresolved)"),
        }
    }
}

/// The per-type body union (§6). Bodies are tagged by the sibling `r#type`
/// field in [`Message`], not self-tagged, so this enum is encoded as an
/// externally-untagged payload by the codec (see `codec.rs`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MessageBody {
    Ping,
    Resolve { host: String, port: u16 },
    LinkOpen { family: AddressFamily, sock_type: SocketType, protocol: Protocol, address: Option<SocketAddress> },
    LinkSetOpt { option: String, value: OptionValue },
    LinkGetOpt { option: String },
    LinkBind { address: SocketAddress },
    LinkListen { backlog: u32 },
    LinkConnect { address: SocketAddress },
    LinkAccept,
    LinkClose,
    Data { buffer: Vec<u8> },
    Poll { timeout_ms: u32, max: u32 },
    /// Used for responses that carry no payload beyond the envelope
    /// (error-only replies, `ok` acks).
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OptionValue {
    Int(i64),
    Bool(bool),
    Text(String),
}

/// The full wire envelope (§6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub source_address: Address,
    pub proxy_address: Address,
    pub sequence_id: u32,
    pub correlation_id: u64,
    pub error_code: ErrorCode,
    pub r#type: MessageType,
    pub body: MessageBody,
}

impl Message {
    /// Build a request-shaped message (`error_code = Ok`).
    pub fn request(source: Address, proxy: Address, correlation_id: u64, body: MessageBody) -> Self {
        Message {
            source_address: source,
            proxy_address: proxy,
            sequence_id: 0,
            correlation_id,
            error_code: ErrorCode::Ok,
            r#type: MessageType::of(&body),
            body,
        }
    }

    /// Build a response echoing `self`'s correlation id (§4.5: "the
    /// responder echoes the request's correlation id unchanged").
    pub fn respond(&self, error_code: ErrorCode, body: MessageBody) -> Self {
        Message {
            source_address: self.source_address,
            proxy_address: self.proxy_address,
            sequence_id: 0,
            correlation_id: self.correlation_id,
            error_code,
            r#type: MessageType::of(&body),
            body,
        }
    }

    pub fn error_response(&self, error_code: ErrorCode) -> Self {
        self.respond(error_code, MessageBody::Empty)
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
