// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The socket half of the platform abstraction layer.
//!
//! The link state machine (§4.5) never touches `tokio::net` directly; it
//! drives a `PalSocket` so the FSM's tests can run against a fake
//! implementation with full control over when `connect`/`recv`/`send`
//! complete.

use async_trait::async_trait;
use edgeproxy_core::ErrorCode;
use std::net::SocketAddr;

/// Socket family/type/protocol triple a `link-open` message carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketSpec {
    pub stream: bool,
}

/// One platform socket backing a connected link.
///
/// All operations are non-blocking at the call site: a real implementation
/// performs the I/O on the async runtime and returns once the operation
/// completes or fails, matching the spec's "foreign thread posts a
/// continuation" model via the runtime's own task scheduling rather than a
/// literal second OS thread.
#[async_trait]
pub trait PalSocket: Send + Sync {
    async fn bind(&self, address: SocketAddr) -> Result<SocketAddr, ErrorCode>;
    async fn listen(&self, backlog: u32) -> Result<(), ErrorCode>;
    async fn connect(&self, address: SocketAddr) -> Result<(), ErrorCode>;
    async fn accept(&self) -> Result<Box<dyn PalSocket>, ErrorCode>;
    /// Reads up to `max` bytes. An empty result means the peer closed its
    /// write half (not an error); `ErrorCode::Closed` means the socket is
    /// gone entirely.
    async fn recv(&self, max: usize) -> Result<Vec<u8>, ErrorCode>;
    async fn send(&self, buffer: &[u8]) -> Result<usize, ErrorCode>;
    async fn close(&self) -> Result<(), ErrorCode>;
    fn peer_address(&self) -> Option<SocketAddr>;
}

/// Creates [`PalSocket`] instances for a given spec. Kept separate from the
/// socket trait itself so link creation doesn't need an already-open
/// socket to ask for one.
#[async_trait]
pub trait PalSocketFactory: Send + Sync {
    async fn create(&self, spec: SocketSpec) -> Result<Box<dyn PalSocket>, ErrorCode>;
}

/// A real, Tokio-backed [`PalSocketFactory`]/[`PalSocket`] pair.
pub mod tokio_impl {
    use super::*;
    use parking_lot::Mutex;
    use tokio::net::{TcpListener, TcpStream};

    pub struct TokioSocketFactory;

    #[async_trait]
    impl PalSocketFactory for TokioSocketFactory {
        async fn create(&self, _spec: SocketSpec) -> Result<Box<dyn PalSocket>, ErrorCode> {
            Ok(Box::new(TokioSocket { inner: Mutex::new(State::Created) }))
        }
    }

    enum State {
        Created,
        Bound(TcpListener),
        Stream(TcpStream),
        Closed,
    }

    pub struct TokioSocket {
        inner: Mutex<State>,
    }

    impl TokioSocket {
        pub fn from_stream(stream: TcpStream) -> Self {
            TokioSocket { inner: Mutex::new(State::Stream(stream)) }
        }

        /// Takes the stream out of the shared state for the duration of an
        /// I/O call, so the lock is never held across an `.await` point.
        fn take_stream(&self) -> Result<TcpStream, ErrorCode> {
            let mut guard = self.inner.lock();
            match std::mem::replace(&mut *guard, State::Created) {
                State::Stream(stream) => Ok(stream),
                other => {
                    *guard = other;
                    Err(ErrorCode::BadState)
                }
            }
        }
    }

    #[async_trait]
    impl PalSocket for TokioSocket {
        async fn bind(&self, address: SocketAddr) -> Result<SocketAddr, ErrorCode> {
            let listener = TcpListener::bind(address).await.map_err(|_| ErrorCode::NoAddress)?;
            let local = listener.local_addr().map_err(|_| ErrorCode::Fault)?;
            *self.inner.lock() = State::Bound(listener);
            Ok(local)
        }

        async fn listen(&self, _backlog: u32) -> Result<(), ErrorCode> {
            match &*self.inner.lock() {
                State::Bound(_) => Ok(()),
                _ => Err(ErrorCode::BadState),
            }
        }

        async fn connect(&self, address: SocketAddr) -> Result<(), ErrorCode> {
            let stream = TcpStream::connect(address).await.map_err(|e| {
                tracing::warn!(%address, error = %e, "pal connect failed");
                ErrorCode::Refused
            })?;
            *self.inner.lock() = State::Stream(stream);
            Ok(())
        }

        async fn accept(&self) -> Result<Box<dyn PalSocket>, ErrorCode> {
            // The listener must be taken out of the mutex for the duration of
            // the (potentially long) accept await, then put back.
            let listener = {
                let mut guard = self.inner.lock();
                match std::mem::replace(&mut *guard, State::Created) {
                    State::Bound(listener) => listener,
                    other => {
                        *guard = other;
                        return Err(ErrorCode::BadState);
                    }
                }
            };
            let result = listener.accept().await;
            *self.inner.lock() = State::Bound(listener);
            let (stream, _peer) = result.map_err(|_| ErrorCode::Aborted)?;
            Ok(Box::new(TokioSocket::from_stream(stream)))
        }

        async fn recv(&self, max: usize) -> Result<Vec<u8>, ErrorCode> {
            use tokio::io::AsyncReadExt;
            let mut stream = self.take_stream()?;
            let mut buf = vec![0u8; max];
            let result = stream.read(&mut buf).await;
            *self.inner.lock() = State::Stream(stream);
            let n = result.map_err(|_| ErrorCode::Reading)?;
            Ok(buf[..n].to_vec())
        }

        async fn send(&self, buffer: &[u8]) -> Result<usize, ErrorCode> {
            use tokio::io::AsyncWriteExt;
            let mut stream = self.take_stream()?;
            let result = stream.write_all(buffer).await;
            *self.inner.lock() = State::Stream(stream);
            result.map_err(|_| ErrorCode::Writing)?;
            Ok(buffer.len())
        }

        async fn close(&self) -> Result<(), ErrorCode> {
            *self.inner.lock() = State::Closed;
            Ok(())
        }

        fn peer_address(&self) -> Option<SocketAddr> {
            match &*self.inner.lock() {
                State::Stream(stream) => stream.peer_addr().ok(),
                _ => None,
            }
        }
    }
}

/// A fully in-memory, deterministic `PalSocket` for link FSM tests:
/// `recv`/`send` operate over an in-process byte channel instead of a real
/// socket, and every operation's outcome is scripted by the test.
#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use std::collections::VecDeque;
    use parking_lot::Mutex;

    #[derive(Default)]
    pub struct FakeSocket {
        inbound: Mutex<VecDeque<u8>>,
        outbound: Mutex<Vec<u8>>,
        closed: Mutex<bool>,
    }

    impl FakeSocket {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_inbound(&self, data: &[u8]) {
            self.inbound.lock().extend(data);
        }

        pub fn take_outbound(&self) -> Vec<u8> {
            std::mem::take(&mut *self.outbound.lock())
        }
    }

    #[async_trait]
    impl PalSocket for FakeSocket {
        async fn bind(&self, address: SocketAddr) -> Result<SocketAddr, ErrorCode> {
            Ok(address)
        }
        async fn listen(&self, _backlog: u32) -> Result<(), ErrorCode> {
            Ok(())
        }
        async fn connect(&self, _address: SocketAddr) -> Result<(), ErrorCode> {
            if *self.closed.lock() {
                return Err(ErrorCode::Closed);
            }
            Ok(())
        }
        async fn accept(&self) -> Result<Box<dyn PalSocket>, ErrorCode> {
            Err(ErrorCode::NotSupported)
        }
        async fn recv(&self, max: usize) -> Result<Vec<u8>, ErrorCode> {
            if *self.closed.lock() {
                return Err(ErrorCode::Closed);
            }
            let mut inbound = self.inbound.lock();
            let n = max.min(inbound.len());
            Ok(inbound.drain(..n).collect())
        }
        async fn send(&self, buffer: &[u8]) -> Result<usize, ErrorCode> {
            if *self.closed.lock() {
                return Err(ErrorCode::Closed);
            }
            self.outbound.lock().extend_from_slice(buffer);
            Ok(buffer.len())
        }
        async fn close(&self) -> Result<(), ErrorCode> {
            *self.closed.lock() = true;
            Ok(())
        }
        fn peer_address(&self) -> Option<SocketAddr> {
            None
        }
    }
}

#[cfg(test)]
#[path = "socket_tests.rs"]
mod tests;
