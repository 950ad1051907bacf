// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! edgeproxy-transport: the broker connection abstraction — `Transport`
//! creates `Connection`s, which carry codec-encoded messages and report
//! `received`/`reconnecting`/`closed` events.

pub mod connection;
pub mod error;
pub mod transport;
pub mod ws;

#[cfg(any(test, feature = "test-support"))]
pub mod loopback;

pub use connection::{Connection, ConnectionEvent};
pub use error::TransportError;
pub use transport::Transport;
pub use ws::WsTransport;

#[cfg(any(test, feature = "test-support"))]
pub use loopback::LoopbackConnection;
