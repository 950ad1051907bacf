// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-client browse session (§4.6): request dispatch, stream bookkeeping,
//! and the stream-timeout debounce.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use edgeproxy_core::{ErrorCode, TimerId};
use edgeproxy_pal::fs::PalFs;
use edgeproxy_pal::scan::PalScan;
use edgeproxy_pal::sd::{PalSdBrowser, PalSdClient};
use edgeproxy_scheduler::{do_later, Scheduler};

use crate::server::BrowseServer;
use crate::types::{BrowseRequest, BrowseRequestType, BrowseResponse};

/// How often a resolve/service stream polls its `PalSdBrowser` for a new
/// result. The PAL's `poll` is itself non-blocking, so this is the
/// session's own cadence, not a PAL contract.
const SD_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Capability flags gating `dirpath`/`ipscan`/`portscan` (§7: surfaced as
/// `not_supported` when off).
#[derive(Debug, Clone, Copy)]
pub struct BrowseCaps {
    pub fs_enabled: bool,
    pub scan_enabled: bool,
}

struct Stream {
    task: Option<JoinHandle<()>>,
}

/// Dependencies a session needs to service requests. `server` is used only
/// for the sd-client lifecycle (lazy create / 30s retry, §4.6); the session
/// list and reset-scope walk stay on `BrowseServer`'s side.
pub struct SessionDeps {
    pub fs: Arc<dyn PalFs>,
    pub scan: Arc<dyn PalScan>,
    pub scheduler: Arc<Scheduler>,
    pub caps: BrowseCaps,
    pub server: Arc<BrowseServer>,
    /// The all-for-now debounce (§9(b): promoted from a hard-coded constant
    /// to daemon configuration). Defaults to [`crate::server::BrowseTimings::default`].
    pub stream_timeout: Duration,
}

pub struct BrowseSession {
    id: u64,
    deps: SessionDeps,
    outbound: mpsc::Sender<BrowseResponse>,
    streams: Mutex<HashMap<u128, Stream>>,
    sd_owner: Mutex<Option<Arc<dyn PalSdClient>>>,
    closed: AtomicBool,
}

impl BrowseSession {
    pub fn new(id: u64, deps: SessionDeps, outbound: mpsc::Sender<BrowseResponse>) -> Arc<Self> {
        Arc::new(BrowseSession {
            id,
            deps,
            outbound,
            streams: Mutex::new(HashMap::new()),
            sd_owner: Mutex::new(None),
            closed: AtomicBool::new(false),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// The sd-client this session is bound to, if it has ever used one.
    /// `None` means the session has never touched the sd-client ("null
    /// owner" in §8 property 8 — never force-closed by a reset).
    pub fn sd_owner(&self) -> Option<Arc<dyn PalSdClient>> {
        self.sd_owner.lock().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Aborts every live stream and the session's own timers. Idempotent.
    pub fn force_close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut streams = self.streams.lock();
        for (handle, mut stream) in streams.drain() {
            if let Some(task) = stream.task.take() {
                task.abort();
            }
            self.deps.scheduler.clear(TimerId::stream_timeout(handle));
        }
    }

    pub async fn handle_request(self: &Arc<Self>, req: BrowseRequest) {
        if self.is_closed() {
            return;
        }
        match req.r#type {
            BrowseRequestType::Cancel => self.cancel(req.handle),
            BrowseRequestType::Resolve => self.start_resolve(req.handle, &req.item).await,
            BrowseRequestType::Service => self.start_service(req.handle, &req.item).await,
            BrowseRequestType::Dirpath => self.start_dirpath(req.handle, req.item),
            BrowseRequestType::Ipscan => self.start_ipscan(req.handle, req.item),
            BrowseRequestType::Portscan => self.start_portscan(req.handle, req.item),
        }
    }

    fn cancel(&self, handle: u128) {
        if let Some(mut stream) = self.streams.lock().remove(&handle) {
            if let Some(task) = stream.task.take() {
                task.abort();
            }
        }
        self.deps.scheduler.clear(TimerId::stream_timeout(handle));
    }

    fn register(&self, handle: u128, task: JoinHandle<()>) {
        self.streams.lock().insert(handle, Stream { task: Some(task) });
    }

    fn is_live(&self, handle: u128) -> bool {
        self.streams.lock().contains_key(&handle)
    }

    fn arm_timeout(self: &Arc<Self>, handle: u128) {
        let session = self.clone();
        let outbound = self.outbound.clone();
        do_later(&self.deps.scheduler, TimerId::stream_timeout(handle), "browse-stream-timeout", self.deps.stream_timeout, move || {
            if !session.is_live(handle) {
                return;
            }
            let _ = outbound.try_send(BrowseResponse::all_for_now(handle));
        });
    }

    async fn send(&self, resp: BrowseResponse) {
        let _ = self.outbound.send(resp).await;
    }

    async fn start_resolve(self: &Arc<Self>, handle: u128, item: &str) {
        let Some((host, port)) = split_host_port(item) else {
            self.send(BrowseResponse::error(handle, ErrorCode::Arg)).await;
            return;
        };
        let (client, browser) = match self.deps.server.ensure_sd_browser().await {
            Ok(pair) => pair,
            Err(code) => {
                self.send(BrowseResponse::error(handle, code)).await;
                return;
            }
        };
        *self.sd_owner.lock() = Some(client.clone());
        if let Err(code) = browser.resolve(&host, port).await {
            self.deps.server.reset_sd_client(&client);
            self.send(BrowseResponse::error(handle, code)).await;
            return;
        }
        self.spawn_sd_poll_loop(handle, browser);
    }

    async fn start_service(self: &Arc<Self>, handle: u128, item: &str) {
        let Some((service_name, service_type, domain)) = split_service_path(item) else {
            self.send(BrowseResponse::error(handle, ErrorCode::Arg)).await;
            return;
        };
        let (client, browser) = match self.deps.server.ensure_sd_browser().await {
            Ok(pair) => pair,
            Err(code) => {
                self.send(BrowseResponse::error(handle, code)).await;
                return;
            }
        };
        *self.sd_owner.lock() = Some(client.clone());
        if let Err(code) = browser.browse(service_name.as_deref(), Some(&service_type), Some(&domain)).await {
            self.deps.server.reset_sd_client(&client);
            self.send(BrowseResponse::error(handle, code)).await;
            return;
        }
        self.spawn_sd_poll_loop(handle, browser);
    }

    fn spawn_sd_poll_loop(self: &Arc<Self>, handle: u128, browser: Box<dyn PalSdBrowser>) {
        self.arm_timeout(handle);
        let session = self.clone();
        let task = tokio::spawn(async move {
            loop {
                tokio::time::sleep(SD_POLL_INTERVAL).await;
                if !session.is_live(handle) {
                    return;
                }
                if let Some(result) = browser.poll().await {
                    session.arm_timeout(handle);
                    session.send(BrowseResponse::from_sd_result(handle, result)).await;
                }
            }
        });
        self.register(handle, task);
    }

    fn start_dirpath(self: &Arc<Self>, handle: u128, path: String) {
        if !self.deps.caps.fs_enabled {
            let session = self.clone();
            tokio::spawn(async move { session.send(BrowseResponse::error(handle, ErrorCode::NotSupported)).await });
            return;
        }
        self.arm_timeout(handle);
        let session = self.clone();
        let fs = self.deps.fs.clone();
        let task = tokio::spawn(async move {
            match fs.read_dir(&path).await {
                Ok(entries) => {
                    for entry in entries {
                        if !session.is_live(handle) {
                            return;
                        }
                        session.send(BrowseResponse { error_code: ErrorCode::Ok, item: entry.name, props: vec![("is_dir".into(), entry.is_dir.to_string())], flags: 0, handle }).await;
                    }
                    session.send(BrowseResponse::all_for_now(handle)).await;
                }
                Err(code) => session.send(BrowseResponse::error(handle, code)).await,
            }
            session.deps.scheduler.clear(TimerId::stream_timeout(handle));
            session.streams.lock().remove(&handle);
        });
        self.register(handle, task);
    }

    fn start_ipscan(self: &Arc<Self>, handle: u128, base: String) {
        if !self.deps.caps.scan_enabled {
            let session = self.clone();
            tokio::spawn(async move { session.send(BrowseResponse::error(handle, ErrorCode::NotSupported)).await });
            return;
        }
        let Ok(base_ip) = base.parse::<std::net::IpAddr>() else {
            let session = self.clone();
            tokio::spawn(async move { session.send(BrowseResponse::error(handle, ErrorCode::Arg)).await });
            return;
        };
        self.arm_timeout(handle);
        let session = self.clone();
        let scan = self.deps.scan.clone();
        let task = tokio::spawn(async move {
            match scan.scan_hosts(base_ip).await {
                Ok(hosts) => {
                    for host in hosts {
                        if !session.is_live(handle) {
                            return;
                        }
                        session.send(BrowseResponse { handle, error_code: ErrorCode::Ok, item: host.to_string(), props: Vec::new(), flags: 0 }).await;
                    }
                    session.send(BrowseResponse::all_for_now(handle)).await;
                }
                Err(code) => session.send(BrowseResponse::error(handle, code)).await,
            }
            session.deps.scheduler.clear(TimerId::stream_timeout(handle));
            session.streams.lock().remove(&handle);
        });
        self.register(handle, task);
    }

    fn start_portscan(self: &Arc<Self>, handle: u128, target: String) {
        if !self.deps.caps.scan_enabled {
            let session = self.clone();
            tokio::spawn(async move { session.send(BrowseResponse::error(handle, ErrorCode::NotSupported)).await });
            return;
        }
        let Some((host, ports)) = split_portscan_target(&target) else {
            let session = self.clone();
            tokio::spawn(async move { session.send(BrowseResponse::error(handle, ErrorCode::Arg)).await });
            return;
        };
        self.arm_timeout(handle);
        let session = self.clone();
        let scan = self.deps.scan.clone();
        let task = tokio::spawn(async move {
            match scan.scan_ports(host, &ports).await {
                Ok(open) => {
                    for port in open {
                        if !session.is_live(handle) {
                            return;
                        }
                        session.send(BrowseResponse { handle, error_code: ErrorCode::Ok, item: port.to_string(), props: Vec::new(), flags: 0 }).await;
                    }
                    session.send(BrowseResponse::all_for_now(handle)).await;
                }
                Err(code) => session.send(BrowseResponse::error(handle, code)).await,
            }
            session.deps.scheduler.clear(TimerId::stream_timeout(handle));
            session.streams.lock().remove(&handle);
        });
        self.register(handle, task);
    }
}

/// `"host:port"` → `(host, port)`.
fn split_host_port(item: &str) -> Option<(String, u16)> {
    let (host, port) = item.rsplit_once(':')?;
    Some((host.to_string(), port.parse().ok()?))
}

/// `"name.service.type.domain"` (name optional) → `(name, service_type, domain)`.
/// Mirrors the `service.type.domain` parse rule in §4.6's `service` row.
fn split_service_path(item: &str) -> Option<(Option<String>, String, String)> {
    let parts: Vec<&str> = item.split('.').collect();
    match parts.len() {
        0 | 1 => None,
        2 => Some((None, parts[0].to_string(), parts[1].to_string())),
        _ => Some((Some(parts[0].to_string()), parts[1].to_string(), parts[2..].join("."))),
    }
}

/// `"host:port1,port2,..."` → `(host, ports)`.
fn split_portscan_target(target: &str) -> Option<(std::net::IpAddr, Vec<u16>)> {
    let (host, ports) = target.split_once(':')?;
    let host = host.parse().ok()?;
    let ports = ports.split(',').map(|p| p.parse()).collect::<Result<Vec<u16>, _>>().ok()?;
    Some((host, ports))
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
