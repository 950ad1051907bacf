// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use edgeproxy_pal::fs::fake::FakeFs;
use edgeproxy_pal::fs::DirEntry;
use edgeproxy_pal::scan::fake::FakeScan;
use edgeproxy_pal::sd::fake::FakeSdClient;
use edgeproxy_pal::sd::SdResult;
use edgeproxy_pal::socket::fake::FakeSocket;

use super::*;
use crate::session::BrowseCaps;
use crate::types::{response_flags, BrowseRequest, BrowseRequestType};

fn caps() -> BrowseCaps {
    BrowseCaps { fs_enabled: true, scan_enabled: true }
}

fn frame(req: &BrowseRequest) -> Vec<u8> {
    let payload = rmp_serde::to_vec_named(req).unwrap();
    let mut framed = Vec::with_capacity(4 + payload.len());
    framed.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    framed.extend_from_slice(&payload);
    framed
}

/// Delegates every `PalSocket` call to a shared `FakeSocket`, so a test can
/// keep a concrete handle after the socket has been type-erased into the
/// server's `Box<dyn PalSocket>` accept path.
struct SharedSocket(Arc<FakeSocket>);

#[async_trait]
impl PalSocket for SharedSocket {
    async fn bind(&self, address: SocketAddr) -> Result<SocketAddr, ErrorCode> {
        self.0.bind(address).await
    }
    async fn listen(&self, backlog: u32) -> Result<(), ErrorCode> {
        self.0.listen(backlog).await
    }
    async fn connect(&self, address: SocketAddr) -> Result<(), ErrorCode> {
        self.0.connect(address).await
    }
    async fn accept(&self) -> Result<Box<dyn PalSocket>, ErrorCode> {
        self.0.accept().await
    }
    async fn recv(&self, max: usize) -> Result<Vec<u8>, ErrorCode> {
        self.0.recv(max).await
    }
    async fn send(&self, buffer: &[u8]) -> Result<usize, ErrorCode> {
        self.0.send(buffer).await
    }
    async fn close(&self) -> Result<(), ErrorCode> {
        self.0.close().await
    }
    fn peer_address(&self) -> Option<SocketAddr> {
        self.0.peer_address()
    }
}

/// A `PalSocket` standing in for the browse server's local listener: each
/// `accept()` pops the next scripted socket, then reports `closed` once the
/// queue is empty so `BrowseServer::run` exits cleanly.
struct QueueListener {
    queue: Mutex<VecDeque<Arc<FakeSocket>>>,
}

#[async_trait]
impl PalSocket for QueueListener {
    async fn bind(&self, address: SocketAddr) -> Result<SocketAddr, ErrorCode> {
        Ok(address)
    }
    async fn listen(&self, _backlog: u32) -> Result<(), ErrorCode> {
        Ok(())
    }
    async fn connect(&self, _address: SocketAddr) -> Result<(), ErrorCode> {
        Err(ErrorCode::NotSupported)
    }
    async fn accept(&self) -> Result<Box<dyn PalSocket>, ErrorCode> {
        match self.queue.lock().pop_front() {
            Some(socket) => Ok(Box::new(SharedSocket(socket))),
            None => Err(ErrorCode::Closed),
        }
    }
    async fn recv(&self, _max: usize) -> Result<Vec<u8>, ErrorCode> {
        Err(ErrorCode::NotSupported)
    }
    async fn send(&self, _buffer: &[u8]) -> Result<usize, ErrorCode> {
        Err(ErrorCode::NotSupported)
    }
    async fn close(&self) -> Result<(), ErrorCode> {
        Ok(())
    }
    fn peer_address(&self) -> Option<SocketAddr> {
        None
    }
}

fn fake_sd_factory(client: Arc<FakeSdClient>) -> SdClientFactory {
    Arc::new(move || Ok(client.clone() as Arc<dyn PalSdClient>))
}

#[tokio::test]
async fn accept_loop_drives_a_dirpath_request_end_to_end() {
    let fs = FakeFs::new().with_dir("/tmp", vec![DirEntry { name: "x".into(), is_dir: false }]);
    let scheduler = Scheduler::create(None);
    let server = BrowseServer::new(Arc::new(fs), Arc::new(FakeScan::new()), scheduler, caps(), BrowseTimings::default(), fake_sd_factory(FakeSdClient::new()));

    let socket = Arc::new(FakeSocket::new());
    socket.push_inbound(&frame(&BrowseRequest { handle: 9, r#type: BrowseRequestType::Dirpath, item: "/tmp".into(), flags: 0 }));
    let listener = Arc::new(QueueListener { queue: Mutex::new(VecDeque::from([socket.clone()])) });

    server.run(listener).await;
    // `run` only drives the accept loop; the per-session reader/writer/stream
    // tasks it spawns keep running independently, so give them a beat.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut out: std::collections::VecDeque<u8> = socket.take_outbound().into_iter().collect();
    let first = decode_one(&mut out);
    let second = decode_one(&mut out);
    assert_eq!(first.item, "x");
    assert_eq!(second.flags & response_flags::ALL_FOR_NOW, response_flags::ALL_FOR_NOW);
}

fn decode_one(buf: &mut std::collections::VecDeque<u8>) -> BrowseResponse {
    let len_bytes: Vec<u8> = buf.drain(..4).collect();
    let len = u32::from_be_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]]) as usize;
    let payload: Vec<u8> = buf.drain(..len).collect();
    rmp_serde::from_slice(&payload).unwrap()
}

#[tokio::test]
async fn sd_client_is_created_once_and_reused() {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls2 = calls.clone();
    let client = FakeSdClient::new();
    let factory: SdClientFactory = Arc::new(move || {
        calls2.fetch_add(1, Ordering::SeqCst);
        Ok(client.clone() as Arc<dyn PalSdClient>)
    });
    let scheduler = Scheduler::create(None);
    let server = BrowseServer::new(Arc::new(FakeFs::new()), Arc::new(FakeScan::new()), scheduler, caps(), BrowseTimings::default(), factory);

    let (a, _) = server.ensure_sd_browser().await.unwrap();
    let (b, _) = server.ensure_sd_browser().await.unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn sd_client_creation_failure_backs_off_without_retrying_the_factory() {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls2 = calls.clone();
    let factory: SdClientFactory = Arc::new(move || {
        calls2.fetch_add(1, Ordering::SeqCst);
        Err(ErrorCode::Comm)
    });
    let scheduler = Scheduler::create(None);
    let server = BrowseServer::new(Arc::new(FakeFs::new()), Arc::new(FakeScan::new()), scheduler, caps(), BrowseTimings::default(), factory);

    assert!(server.ensure_sd_browser().await.is_err());
    assert!(server.ensure_sd_browser().await.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn reset_closes_only_sessions_captured_against_the_reset_client() {
    let client = FakeSdClient::new();
    client.push_result(SdResult::Entry { host: "10.0.0.1".into(), port: 80, records: vec![] });
    let scheduler = Scheduler::create(None);
    let server = BrowseServer::new(Arc::new(FakeFs::new()), Arc::new(FakeScan::new()), scheduler, caps(), BrowseTimings::default(), fake_sd_factory(client.clone()));

    let (tx_a, _rx_a) = mpsc::channel(8);
    let deps_a = SessionDeps {
        fs: Arc::new(FakeFs::new()),
        scan: Arc::new(FakeScan::new()),
        scheduler: Scheduler::create(None),
        caps: caps(),
        server: server.clone(),
        stream_timeout: BrowseTimings::default().stream_timeout,
    };
    let session_bound = BrowseSession::new(1, deps_a, tx_a);
    session_bound.handle_request(BrowseRequest { handle: 1, r#type: BrowseRequestType::Resolve, item: "10.0.0.1:80".into(), flags: 0 }).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(session_bound.sd_owner().is_some());

    let (tx_b, _rx_b) = mpsc::channel(8);
    let deps_b = SessionDeps {
        fs: Arc::new(FakeFs::new()),
        scan: Arc::new(FakeScan::new()),
        scheduler: Scheduler::create(None),
        caps: caps(),
        server: server.clone(),
        stream_timeout: BrowseTimings::default().stream_timeout,
    };
    let session_untouched = BrowseSession::new(2, deps_b, tx_b);

    // Registering directly with the server's session map, the way
    // `spawn_session` does for a real accepted socket.
    server.sessions.lock().insert(1, session_bound.clone());
    server.sessions.lock().insert(2, session_untouched.clone());

    let live_client = client.clone() as Arc<dyn PalSdClient>;
    server.reset_sd_client(&live_client);

    assert!(session_bound.is_closed());
    assert!(!session_untouched.is_closed());
}
