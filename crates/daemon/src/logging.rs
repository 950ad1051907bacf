// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Global `tracing` subscriber setup (§10.1): `RUST_LOG`-driven, defaulting
//! to `info` so control-plane transitions are visible out of the box
//! without drowning in per-frame `trace` data.

use tracing_subscriber::EnvFilter;

pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
