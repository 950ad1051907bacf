// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The flat error taxonomy shared by every subsystem.
//!
//! Every fallible operation in the proxy returns one of these codes. The
//! string names are wire-stable: they are sent to peers and written to logs,
//! so renaming a variant is a breaking change (see `err_string` round-trip
//! test in `error_tests.rs`).

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The complete, closed set of failure codes.
///
/// Order only matters in that `as_i32`/`from_i32` must stay stable once a
/// release ships a code on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Ok = 0,
    Unknown = 1,
    Fatal = 2,
    Arg = 3,
    Fault = 4,
    BadState = 5,
    OutOfMemory = 6,
    AlreadyExists = 7,
    NotFound = 8,
    NotSupported = 9,
    NotImpl = 10,
    Permission = 11,
    Retry = 12,
    NoMore = 13,
    Network = 14,
    Connecting = 15,
    Busy = 16,
    Writing = 17,
    Reading = 18,
    Waiting = 19,
    Timeout = 20,
    Aborted = 21,
    Closed = 22,
    Shutdown = 23,
    Refused = 24,
    NoAddress = 25,
    NoHost = 26,
    HostUnknown = 27,
    AddressFamily = 28,
    Duplicate = 29,
    BadFlags = 30,
    InvalidFormat = 31,
    DiskIo = 32,
    Missing = 33,
    PropGet = 34,
    PropSet = 35,
    Reset = 36,
    Undelivered = 37,
    Crypto = 38,
    Comm = 39,
}

impl ErrorCode {
    /// All variants, in declaration order. Used by property tests that walk
    /// the closed set (e.g. name-stability, round trip through `i32`).
    pub const ALL: &'static [ErrorCode] = &[
        ErrorCode::Ok,
        ErrorCode::Unknown,
        ErrorCode::Fatal,
        ErrorCode::Arg,
        ErrorCode::Fault,
        ErrorCode::BadState,
        ErrorCode::OutOfMemory,
        ErrorCode::AlreadyExists,
        ErrorCode::NotFound,
        ErrorCode::NotSupported,
        ErrorCode::NotImpl,
        ErrorCode::Permission,
        ErrorCode::Retry,
        ErrorCode::NoMore,
        ErrorCode::Network,
        ErrorCode::Connecting,
        ErrorCode::Busy,
        ErrorCode::Writing,
        ErrorCode::Reading,
        ErrorCode::Waiting,
        ErrorCode::Timeout,
        ErrorCode::Aborted,
        ErrorCode::Closed,
        ErrorCode::Shutdown,
        ErrorCode::Refused,
        ErrorCode::NoAddress,
        ErrorCode::NoHost,
        ErrorCode::HostUnknown,
        ErrorCode::AddressFamily,
        ErrorCode::Duplicate,
        ErrorCode::BadFlags,
        ErrorCode::InvalidFormat,
        ErrorCode::DiskIo,
        ErrorCode::Missing,
        ErrorCode::PropGet,
        ErrorCode::PropSet,
        ErrorCode::Reset,
        ErrorCode::Undelivered,
        ErrorCode::Crypto,
        ErrorCode::Comm,
    ];

    /// Stable lowercase identifier, matching the variant name. This is what
    /// goes on the wire and into logs — never change an existing mapping.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Ok => "ok",
            ErrorCode::Unknown => "unknown",
            ErrorCode::Fatal => "fatal",
            ErrorCode::Arg => "arg",
            ErrorCode::Fault => "fault",
            ErrorCode::BadState => "bad_state",
            ErrorCode::OutOfMemory => "out_of_memory",
            ErrorCode::AlreadyExists => "already_exists",
            ErrorCode::NotFound => "not_found",
            ErrorCode::NotSupported => "not_supported",
            ErrorCode::NotImpl => "not_impl",
            ErrorCode::Permission => "permission",
            ErrorCode::Retry => "retry",
            ErrorCode::NoMore => "nomore",
            ErrorCode::Network => "network",
            ErrorCode::Connecting => "connecting",
            ErrorCode::Busy => "busy",
            ErrorCode::Writing => "writing",
            ErrorCode::Reading => "reading",
            ErrorCode::Waiting => "waiting",
            ErrorCode::Timeout => "timeout",
            ErrorCode::Aborted => "aborted",
            ErrorCode::Closed => "closed",
            ErrorCode::Shutdown => "shutdown",
            ErrorCode::Refused => "refused",
            ErrorCode::NoAddress => "no_address",
            ErrorCode::NoHost => "no_host",
            ErrorCode::HostUnknown => "host_unknown",
            ErrorCode::AddressFamily => "address_family",
            ErrorCode::Duplicate => "duplicate",
            ErrorCode::BadFlags => "bad_flags",
            ErrorCode::InvalidFormat => "invalid_format",
            ErrorCode::DiskIo => "disk_io",
            ErrorCode::Missing => "missing",
            ErrorCode::PropGet => "prop_get",
            ErrorCode::PropSet => "prop_set",
            ErrorCode::Reset => "reset",
            ErrorCode::Undelivered => "undelivered",
            ErrorCode::Crypto => "crypto",
            ErrorCode::Comm => "comm",
        }
    }

    pub fn is_ok(self) -> bool {
        matches!(self, ErrorCode::Ok)
    }

    /// Numeric encoding used on the wire (`error-code: i32` in the message
    /// envelope) and as the process exit code for the installer CLI.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn from_i32(v: i32) -> Option<Self> {
        Self::ALL.get(usize::try_from(v).ok()?).copied()
    }

    /// Terminal I/O errors trigger the link's `closing -> closed` transition
    /// (§4.5, §7). `retry` is handled locally and never reaches this point.
    pub fn is_terminal_io(self) -> bool {
        matches!(self, ErrorCode::Closed | ErrorCode::Aborted | ErrorCode::Reset)
    }

    /// Transient I/O is retried locally and never surfaced to the peer until
    /// it times out (§7).
    pub fn is_transient(self) -> bool {
        matches!(self, ErrorCode::Retry | ErrorCode::Waiting | ErrorCode::Connecting)
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorCode {
    type Err = UnknownErrorCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownErrorCode(s.to_string()))
    }
}

impl Default for ErrorCode {
    fn default() -> Self {
        ErrorCode::Ok
    }
}

impl std::error::Error for ErrorCode {}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown error code: {0}")]
pub struct UnknownErrorCode(pub String);

/// Returns the stable string name for a code. Thin wrapper kept for callers
/// that prefer a free function over the method (mirrors the C original's
/// `prx_err_string`).
pub fn err_string(code: ErrorCode) -> &'static str {
    code.as_str()
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
