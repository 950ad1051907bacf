// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! edgeproxy-pal: the platform abstraction layer — sockets, filesystem,
//! service discovery, and network scanning — that the link state machine
//! and browse server drive instead of touching the OS directly.

pub mod fs;
pub mod scan;
pub mod sd;
pub mod socket;

pub use fs::{DirEntry, PalFs, TokioFs};
pub use scan::{PalScan, TcpConnectScan};
pub use sd::{PalSdBrowser, PalSdClient, SdResult, UnavailableSdClient};
pub use socket::{PalSocket, PalSocketFactory, SocketSpec};
