// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The browse server (§4.6): owns the sd-client lifecycle (lazy create,
//! 30s retry on failure, reset + 3s recreate on a live client's PAL error)
//! and the session list, and drives the accept loop over local session
//! sockets.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use edgeproxy_core::{ErrorCode, TimerId};
use edgeproxy_pal::sd::{PalSdBrowser, PalSdClient};
use edgeproxy_pal::{PalFs, PalScan, PalSocket};
use edgeproxy_scheduler::{do_later, Scheduler};

use crate::framing::{encode_response, try_decode_request};
use crate::session::{BrowseCaps, BrowseSession, SessionDeps};
use crate::types::BrowseResponse;

/// Creates the concrete sd-client object on demand. Kept as a factory
/// rather than a fixed instance because creating it is itself the
/// fallible, retriable step §4.6 describes ("lazily created... on failure
/// it is retried after 30s") — `PalSdClient` itself models only browser
/// creation, not client acquisition.
pub type SdClientFactory = Arc<dyn Fn() -> Result<Arc<dyn PalSdClient>, ErrorCode> + Send + Sync>;

/// Timing knobs the daemon's `ProxyConfig` is free to override (§9(b),
/// §10.3); these defaults match the original hard-coded constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrowseTimings {
    pub stream_timeout: Duration,
    pub sd_backoff_interval: Duration,
    pub sd_reset_interval: Duration,
}

impl Default for BrowseTimings {
    fn default() -> Self {
        BrowseTimings {
            stream_timeout: Duration::from_millis(3000),
            sd_backoff_interval: Duration::from_secs(30),
            sd_reset_interval: Duration::from_secs(3),
        }
    }
}

pub struct BrowseServer {
    fs: Arc<dyn PalFs>,
    scan: Arc<dyn PalScan>,
    scheduler: Arc<Scheduler>,
    caps: BrowseCaps,
    timings: BrowseTimings,
    sd_client_factory: SdClientFactory,
    sd_client: Mutex<Option<Arc<dyn PalSdClient>>>,
    sd_backoff: AtomicBool,
    sessions: Mutex<HashMap<u64, Arc<BrowseSession>>>,
    next_session_id: AtomicU64,
}

impl BrowseServer {
    pub fn new(
        fs: Arc<dyn PalFs>,
        scan: Arc<dyn PalScan>,
        scheduler: Arc<Scheduler>,
        caps: BrowseCaps,
        timings: BrowseTimings,
        sd_client_factory: SdClientFactory,
    ) -> Arc<Self> {
        Arc::new(BrowseServer {
            fs,
            scan,
            scheduler,
            caps,
            timings,
            sd_client_factory,
            sd_client: Mutex::new(None),
            sd_backoff: AtomicBool::new(false),
            sessions: Mutex::new(HashMap::new()),
            next_session_id: AtomicU64::new(1),
        })
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn session(&self, id: u64) -> Option<Arc<BrowseSession>> {
        self.sessions.lock().get(&id).cloned()
    }

    /// Returns the current sd-client, creating it on first use. While a
    /// prior creation attempt's 30s backoff is active, fails fast without
    /// retrying the factory.
    fn ensure_sd_client(self: &Arc<Self>) -> Result<Arc<dyn PalSdClient>, ErrorCode> {
        if let Some(client) = self.sd_client.lock().clone() {
            return Ok(client);
        }
        if self.sd_backoff.load(Ordering::Acquire) {
            return Err(ErrorCode::Comm);
        }
        match (self.sd_client_factory)() {
            Ok(client) => {
                *self.sd_client.lock() = Some(client.clone());
                Ok(client)
            }
            Err(code) => {
                self.sd_backoff.store(true, Ordering::Release);
                let server = self.clone();
                do_later(&self.scheduler, TimerId::sdclient_retry(), "sdclient-retry", self.timings.sd_backoff_interval, move || {
                    server.sd_backoff.store(false, Ordering::Release);
                });
                Err(code)
            }
        }
    }

    /// Creates a browser against the current (or newly created) sd-client.
    pub async fn ensure_sd_browser(self: &Arc<Self>) -> Result<(Arc<dyn PalSdClient>, Box<dyn PalSdBrowser>), ErrorCode> {
        let client = self.ensure_sd_client()?;
        match client.create_browser().await {
            Ok(browser) => Ok((client, browser)),
            Err(code) => {
                self.reset_sd_client(&client);
                Err(code)
            }
        }
    }

    /// `sdclient-reset` (§4.6): detaches the client if it's still the one
    /// that failed, force-closes every session captured against it, and
    /// schedules a fresh creation attempt after 3s. A no-op if `failed` has
    /// already been superseded by a later client (§8 property 8).
    pub fn reset_sd_client(self: &Arc<Self>, failed: &Arc<dyn PalSdClient>) {
        {
            let mut current = self.sd_client.lock();
            let is_current = current.as_ref().map(|c| Arc::ptr_eq(c, failed)).unwrap_or(false);
            if !is_current {
                return;
            }
            *current = None;
        }

        let stale: Vec<Arc<BrowseSession>> = self
            .sessions
            .lock()
            .values()
            .filter(|session| session.sd_owner().map(|owner| Arc::ptr_eq(&owner, failed)).unwrap_or(false))
            .cloned()
            .collect();
        for session in stale {
            session.force_close();
        }
        self.sessions.lock().retain(|_, session| !session.is_closed());

        let server = self.clone();
        do_later(&self.scheduler, TimerId::sdclient_retry(), "sdclient-recreate", self.timings.sd_reset_interval, move || {
            let _ = server.ensure_sd_client();
        });
    }

    /// Accepts one session socket and drives it until the peer closes or
    /// the session is force-closed by a reset.
    pub async fn accept_one(self: &Arc<Self>, listener: &dyn PalSocket) -> Result<(), ErrorCode> {
        let socket = listener.accept().await?;
        self.clone().spawn_session(socket);
        Ok(())
    }

    /// Accepts session sockets off `listener` until an accept fails,
    /// spawning one `BrowseSession` per connection.
    pub async fn run(self: Arc<Self>, listener: Arc<dyn PalSocket>) {
        loop {
            match listener.accept().await {
                Ok(socket) => {
                    self.clone().spawn_session(socket);
                }
                Err(code) => {
                    tracing::warn!(error = %code.as_str(), "browse session listener stopped accepting");
                    break;
                }
            }
        }
    }

    fn spawn_session(self: Arc<Self>, socket: Box<dyn PalSocket>) -> Arc<BrowseSession> {
        let id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        let (outbound_tx, mut outbound_rx) = mpsc::channel::<BrowseResponse>(64);

        let deps = SessionDeps {
            fs: self.fs.clone(),
            scan: self.scan.clone(),
            scheduler: self.scheduler.clone(),
            caps: self.caps,
            server: self.clone(),
            stream_timeout: self.timings.stream_timeout,
        };
        let session = BrowseSession::new(id, deps, outbound_tx);
        self.sessions.lock().insert(id, session.clone());

        let socket: Arc<dyn PalSocket> = Arc::from(socket);

        let writer_socket = socket.clone();
        tokio::spawn(async move {
            while let Some(resp) = outbound_rx.recv().await {
                let Ok(bytes) = encode_response(&resp) else { continue };
                if writer_socket.send(&bytes).await.is_err() {
                    break;
                }
            }
        });

        let reader_session = session.clone();
        let reader_server = self.clone();
        tokio::spawn(async move {
            let mut buf: VecDeque<u8> = VecDeque::new();
            loop {
                let chunk = match socket.recv(4096).await {
                    Ok(chunk) => chunk,
                    Err(_) => break,
                };
                if chunk.is_empty() {
                    break;
                }
                buf.extend(chunk);
                loop {
                    match try_decode_request(&mut buf) {
                        Ok(Some(req)) => reader_session.handle_request(req).await,
                        Ok(None) => break,
                        Err(_) => {
                            buf.clear();
                            break;
                        }
                    }
                }
            }
            reader_session.force_close();
            let _ = socket.close().await;
            reader_server.sessions.lock().remove(&id);
        });

        session
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
