// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `proxyd` command line (§6): no arguments runs the daemon;
//! `--install`/`--uninstall` register or deregister this proxy against the
//! name-service registries instead.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "proxyd", about = "Edge-side socket proxy daemon")]
pub struct Cli {
    /// Registers this proxy in the hub and records it locally, then exits.
    #[arg(short = 'i', long = "install")]
    pub install: bool,

    /// Reverses `--install`: removes this proxy from both registries, then exits.
    #[arg(short = 'u', long = "uninstall")]
    pub uninstall: bool,

    /// Hub connection string. Falls back to `_HUB_CS` if absent (§6).
    #[arg(short = 'c', long = "connection-string", env = "_HUB_CS")]
    pub connection_string: Option<String>,

    /// Proxy name recorded alongside the connection string.
    #[arg(short = 'n', long = "name")]
    pub name: Option<String>,

    /// Path to a JSON config file, overriding the usual search order.
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
}
