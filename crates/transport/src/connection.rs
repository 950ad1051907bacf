// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The connection contract (§4.3).

use async_trait::async_trait;
use edgeproxy_core::ErrorCode;
use edgeproxy_wire::Message;

/// Events a connection emits to its owner's event channel.
#[derive(Debug, Clone)]
pub enum ConnectionEvent {
    Received(Message),
    Reconnecting(ErrorCode),
    Closed,
}

/// A duplex, framed message pipe to the broker.
///
/// `send` always returns promptly: the actual write happens in the
/// background, and its outcome is reported as a `Closed`/`Reconnecting`
/// event rather than through the `send` call itself — the spec's "cloning
/// is mandatory at the call site to guarantee a callback" becomes, in an
/// owned-value language, simply: `send` takes `Message` by value and the
/// caller retains nothing it needs to await.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Enqueues `message` for transmission. Returns `Err(ErrorCode::Closed)`
    /// immediately if the connection is already closed (§9 open question
    /// (a): no completion callback fires in that case).
    async fn send(&self, message: Message) -> Result<(), ErrorCode>;

    /// Level-triggered close: a second call is a no-op. Exactly one
    /// `ConnectionEvent::Closed` is ever delivered regardless of how many
    /// times `close` is called.
    async fn close(&self);

    fn is_closed(&self) -> bool;
}
