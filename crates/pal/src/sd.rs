// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! DNS-SD/mDNS client abstraction (§4.6).
//!
//! Real mDNS packet handling is out of scope (§1); this module defines the
//! `pal_sdclient`/`pal_sdbrowser` contract the browse server programs
//! against, plus a deterministic fake used by both tests and — until a real
//! resolver is wired in — any build that just needs the interface to exist.

use async_trait::async_trait;
use edgeproxy_core::ErrorCode;

#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(dead_code)]
pub enum SdResult {
    Domain(String),
    ServiceType(String),
    Service { name: String, service_type: String, domain: String },
    Entry { host: String, port: u16, records: Vec<(String, String)> },
}

/// One browse/resolve session against a client.
#[async_trait]
pub trait PalSdBrowser: Send + Sync {
    /// Browse services under `service_type.domain`, or domains themselves
    /// when `service_type` is `None`.
    async fn browse(&self, service_name: Option<&str>, service_type: Option<&str>, domain: Option<&str>) -> Result<(), ErrorCode>;
    async fn resolve(&self, host: &str, port: u16) -> Result<(), ErrorCode>;
    /// Polls for the next result, if any is ready. `None` means: nothing
    /// new since the last poll (the caller should rely on its own
    /// stream-timeout debounce, §4.6, rather than block here).
    async fn poll(&self) -> Option<SdResult>;
}

/// A client capable of creating browser sessions. Resettable: when the
/// server observes a PAL error it calls `reset`-equivalent behavior by
/// simply dropping this handle and creating a new one (§4.6 sd-client
/// lifecycle) — the trait itself stays stateless about reset.
#[async_trait]
pub trait PalSdClient: Send + Sync {
    async fn create_browser(&self) -> Result<Box<dyn PalSdBrowser>, ErrorCode>;
}

/// The reference implementation: no real resolver is wired in, so every
/// operation reports `not_supported`, matching §7's rule that disabled
/// capabilities surface that code rather than silently doing nothing.
pub struct UnavailableSdClient;

#[async_trait]
impl PalSdClient for UnavailableSdClient {
    async fn create_browser(&self) -> Result<Box<dyn PalSdBrowser>, ErrorCode> {
        Err(ErrorCode::NotSupported)
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;

    /// A client that always succeeds at creating browsers, each scripted
    /// with a fixed queue of results to emit one-per-`poll`.
    #[derive(Default)]
    pub struct FakeSdClient {
        pub scripted_results: Mutex<VecDeque<SdResult>>,
        pub fail_create: Mutex<bool>,
    }

    impl FakeSdClient {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn push_result(&self, result: SdResult) {
            self.scripted_results.lock().push_back(result);
        }

        pub fn set_fail_create(&self, fail: bool) {
            *self.fail_create.lock() = fail;
        }
    }

    #[async_trait]
    impl PalSdClient for FakeSdClient {
        async fn create_browser(&self) -> Result<Box<dyn PalSdBrowser>, ErrorCode> {
            if *self.fail_create.lock() {
                return Err(ErrorCode::Comm);
            }
            Ok(Box::new(FakeSdBrowser { client: self.clone_handle() }))
        }
    }

    impl FakeSdClient {
        fn clone_handle(&self) -> Arc<Mutex<VecDeque<SdResult>>> {
            // Each browser shares the client's scripted result queue; tests
            // that need per-browser isolation should create a separate client.
            Arc::new(Mutex::new(self.scripted_results.lock().clone()))
        }
    }

    pub struct FakeSdBrowser {
        client: Arc<Mutex<VecDeque<SdResult>>>,
    }

    #[async_trait]
    impl PalSdBrowser for FakeSdBrowser {
        async fn browse(&self, _service_name: Option<&str>, _service_type: Option<&str>, _domain: Option<&str>) -> Result<(), ErrorCode> {
            Ok(())
        }
        async fn resolve(&self, _host: &str, _port: u16) -> Result<(), ErrorCode> {
            Ok(())
        }
        async fn poll(&self) -> Option<SdResult> {
            self.client.lock().pop_front()
        }
    }
}

#[cfg(test)]
#[path = "sd_tests.rs"]
mod tests;
