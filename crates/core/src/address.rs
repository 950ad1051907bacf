// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The 16-byte reference type used to address links on the control plane.
//!
//! Every message envelope carries a `source-address` and a `proxy-address`
//! (§3, §6). A link's address doubles as its identity inside the socket-link
//! server's link map (§3: "a link is reachable from exactly one server's
//! map").

use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Opaque 16-byte reference. `#[serde(transparent)]` over `[u8; 16]` means
/// the wire encoding is the raw byte array (e.g. msgpack bin/array), not
/// text; lowercase hex is only the `Display`/`FromStr` form used in logs
/// and diagnostics.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address([u8; 16]);

impl Address {
    pub const ZERO: Address = Address([0u8; 16]);

    /// Generate a fresh random address (used when a new link is opened).
    pub fn random() -> Self {
        let mut buf = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut buf);
        Address(buf)
    }

    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 16]
    }
}

impl Default for Address {
    fn default() -> Self {
        Address::ZERO
    }
}

impl std::fmt::Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Address {
    type Err = InvalidAddress;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 32 {
            return Err(InvalidAddress(s.to_string()));
        }
        let mut buf = [0u8; 16];
        for (i, chunk) in s.as_bytes().chunks(2).enumerate() {
            let byte_str = std::str::from_utf8(chunk).map_err(|_| InvalidAddress(s.to_string()))?;
            buf[i] = u8::from_str_radix(byte_str, 16).map_err(|_| InvalidAddress(s.to_string()))?;
        }
        Ok(Address(buf))
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid address: {0}")]
pub struct InvalidAddress(pub String);

#[cfg(test)]
#[path = "address_tests.rs"]
mod tests;
