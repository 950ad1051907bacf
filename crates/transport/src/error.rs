// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Internal transport failures, mapped down to [`ErrorCode`] at the
//! `Transport`/`Connection` trait boundary (§4.7, §10.2) — kept distinct so
//! the WS adapter's `tracing` output carries the underlying cause rather
//! than just the flattened wire code.

use edgeproxy_core::ErrorCode;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("websocket handshake failed: {0}")]
    Handshake(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("failed to encode outgoing frame: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("failed to decode incoming frame: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

impl TransportError {
    pub fn code(&self) -> ErrorCode {
        match self {
            TransportError::Handshake(_) => ErrorCode::Network,
            TransportError::Encode(_) | TransportError::Decode(_) => ErrorCode::InvalidFormat,
        }
    }
}
