// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! edgeproxy-wire: the control-plane message envelope, its binary codec,
//! and per-connection correlation-id bookkeeping.

pub mod codec;
pub mod message;
pub mod pool;

pub use codec::{BinaryCodec, Codec, CodecError, MAX_FRAME_LEN};
pub use message::{
    AddressFamily, Message, MessageBody, MessageType, OptionValue, Protocol, SocketAddress, SocketType,
};
pub use pool::{MessageFactory, DEFAULT_MAX_INFLIGHT};
