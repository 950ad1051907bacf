// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-connection request bookkeeping (§4.2).
//!
//! Each connection hands out correlation ids through a [`MessageFactory`]
//! and tracks requests awaiting a response. A soft cap on the number of
//! requests in flight (default 100) keeps one chatty link from starving the
//! others sharing a connection; once the cap is hit, `begin_request`
//! returns `ErrorCode::Retry` rather than blocking, matching the rest of
//! the design's non-blocking backpressure posture (§4.4, §5).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use edgeproxy_core::ErrorCode;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::message::Message;

pub const DEFAULT_MAX_INFLIGHT: usize = 100;

struct Inner {
    pending: HashMap<u64, oneshot::Sender<Message>>,
    max_inflight: usize,
}

/// Allocates correlation ids and resolves responses to their matching
/// request for one connection.
pub struct MessageFactory {
    next_id: AtomicU64,
    inner: Mutex<Inner>,
}

impl MessageFactory {
    pub fn new(max_inflight: usize) -> Self {
        MessageFactory {
            next_id: AtomicU64::new(1),
            inner: Mutex::new(Inner { pending: HashMap::new(), max_inflight }),
        }
    }

    /// Allocates a correlation id and registers a slot for its response.
    ///
    /// Returns `Err(ErrorCode::Retry)` when the connection already has
    /// `max_inflight` requests outstanding.
    pub fn begin_request(&self) -> Result<(u64, oneshot::Receiver<Message>), ErrorCode> {
        let mut inner = self.inner.lock();
        if inner.pending.len() >= inner.max_inflight {
            return Err(ErrorCode::Retry);
        }
        let correlation_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        inner.pending.insert(correlation_id, tx);
        Ok((correlation_id, rx))
    }

    /// Routes an inbound response to its waiting requester, if any.
    ///
    /// Returns `true` if a matching request was found and completed; a
    /// response with no matching correlation id (already timed out, or a
    /// duplicate delivery) is silently dropped (§4.5 at-most-once
    /// correlation semantics).
    pub fn complete(&self, response: Message) -> bool {
        let sender = self.inner.lock().pending.remove(&response.correlation_id);
        match sender {
            Some(tx) => tx.send(response).is_ok(),
            None => false,
        }
    }

    /// Cancels a request without waiting for its response, e.g. when the
    /// requester drops its future.
    pub fn cancel(&self, correlation_id: u64) {
        self.inner.lock().pending.remove(&correlation_id);
    }

    pub fn inflight(&self) -> usize {
        self.inner.lock().pending.len()
    }
}

impl Default for MessageFactory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_INFLIGHT)
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
