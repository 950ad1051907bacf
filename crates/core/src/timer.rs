// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timer identifier type for tracking scheduled timers.
//!
//! `TimerId` names a debounced `do_later` slot (§4.1): the MQTT keep-alive
//! heartbeat, the transport reconnect backoff, a browse stream's
//! all-for-now timeout, and the service-discovery client's retry backoff
//! all key into the scheduler's clear/queue pair by one of these ids.
//!
//! Unlike the short record ids in [`crate::id`], timer ids are descriptive
//! strings (they embed an entry name or address) and so are not bounded by
//! `IdBuf`'s inline capacity.

use crate::address::Address;
use serde::{Deserialize, Serialize};

/// Unique identifier for a scheduled timer slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimerId(String);

impl TimerId {
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn heartbeat(entry: &str) -> Self {
        TimerKind::Heartbeat { entry: entry.to_string() }.to_timer_id()
    }

    pub fn reconnect_backoff(entry: &str) -> Self {
        TimerKind::ReconnectBackoff { entry: entry.to_string() }.to_timer_id()
    }

    pub fn stream_timeout(handle: u128) -> Self {
        TimerKind::StreamTimeout { handle }.to_timer_id()
    }

    pub fn sdclient_retry() -> Self {
        TimerKind::SdClientRetry.to_timer_id()
    }

    pub fn link_close_drain(addr: Address) -> Self {
        TimerKind::LinkCloseDrain { addr }.to_timer_id()
    }

    pub fn kind(&self) -> Option<TimerKind> {
        TimerKind::parse(&self.0)
    }
}

impl std::fmt::Display for TimerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parsed representation of a timer ID for type-safe routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerKind {
    /// MQTT `alive` keep-alive, default 10s (§9 open question (b)).
    Heartbeat { entry: String },
    /// Transport reconnect backoff.
    ReconnectBackoff { entry: String },
    /// Browse stream all-for-now debounce, default 3000ms (§4.6, §8 property 7).
    StreamTimeout { handle: u128 },
    /// sd-client recreate backoff after a reset, default 3s (§4.6).
    SdClientRetry,
    /// Grace period between a link entering `closing` and forced `closed`.
    LinkCloseDrain { addr: Address },
}

impl TimerKind {
    pub fn parse(id: &str) -> Option<TimerKind> {
        if let Some(rest) = id.strip_prefix("heartbeat:") {
            return Some(TimerKind::Heartbeat { entry: rest.to_string() });
        }
        if let Some(rest) = id.strip_prefix("reconnect:") {
            return Some(TimerKind::ReconnectBackoff { entry: rest.to_string() });
        }
        if let Some(rest) = id.strip_prefix("stream-timeout:") {
            return Some(TimerKind::StreamTimeout { handle: rest.parse().ok()? });
        }
        if id == "sdclient-retry" {
            return Some(TimerKind::SdClientRetry);
        }
        if let Some(rest) = id.strip_prefix("link-close-drain:") {
            return Some(TimerKind::LinkCloseDrain { addr: rest.parse().ok()? });
        }
        None
    }

    pub fn to_timer_id(&self) -> TimerId {
        match self {
            TimerKind::Heartbeat { entry } => TimerId::from_string(format!("heartbeat:{entry}")),
            TimerKind::ReconnectBackoff { entry } => {
                TimerId::from_string(format!("reconnect:{entry}"))
            }
            TimerKind::StreamTimeout { handle } => {
                TimerId::from_string(format!("stream-timeout:{handle}"))
            }
            TimerKind::SdClientRetry => TimerId::from_string("sdclient-retry"),
            TimerKind::LinkCloseDrain { addr } => {
                TimerId::from_string(format!("link-close-drain:{addr}"))
            }
        }
    }
}

#[cfg(test)]
#[path = "timer_tests.rs"]
mod tests;
