// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! edgeproxy-browse: the browse server and its per-client sessions (§4.6) —
//! filesystem `dirpath` listing, DNS-SD `resolve`/`service` streams, and
//! `ipscan`/`portscan` network discovery, all multiplexed over one local
//! session socket per client.

pub mod framing;
pub mod server;
pub mod session;
pub mod types;

pub use server::{BrowseServer, BrowseTimings, SdClientFactory};
pub use session::{BrowseCaps, BrowseSession};
pub use types::{BrowseRequest, BrowseRequestType, BrowseResponse};
