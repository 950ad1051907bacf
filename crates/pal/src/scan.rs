// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ipscan`/`portscan` browse requests (§4.6) — the network-scan half of
//! the PAL.

use async_trait::async_trait;
use edgeproxy_core::ErrorCode;
use std::net::{IpAddr, SocketAddr};

#[async_trait]
pub trait PalScan: Send + Sync {
    /// Discovers reachable hosts on the subnet containing `base`, reporting
    /// each live address as it's found.
    async fn scan_hosts(&self, base: IpAddr) -> Result<Vec<IpAddr>, ErrorCode>;
    /// Probes `ports` on `host`, reporting each one that accepts a
    /// connection.
    async fn scan_ports(&self, host: IpAddr, ports: &[u16]) -> Result<Vec<u16>, ErrorCode>;
}

/// A real scanner: host discovery via a short-timeout TCP connect sweep
/// (no raw ICMP — this process doesn't run with the capability for it),
/// port scan via the same connect-probe approach.
pub struct TcpConnectScan {
    pub timeout: std::time::Duration,
}

impl Default for TcpConnectScan {
    fn default() -> Self {
        TcpConnectScan { timeout: std::time::Duration::from_millis(200) }
    }
}

#[async_trait]
impl PalScan for TcpConnectScan {
    async fn scan_hosts(&self, base: IpAddr) -> Result<Vec<IpAddr>, ErrorCode> {
        let IpAddr::V4(v4) = base else { return Err(ErrorCode::NotSupported) };
        let octets = v4.octets();
        let mut found = Vec::new();
        for last in 1u8..255 {
            let candidate = IpAddr::V4(std::net::Ipv4Addr::new(octets[0], octets[1], octets[2], last));
            if self.probe(SocketAddr::new(candidate, 7)).await {
                found.push(candidate);
            }
        }
        Ok(found)
    }

    async fn scan_ports(&self, host: IpAddr, ports: &[u16]) -> Result<Vec<u16>, ErrorCode> {
        let mut open = Vec::new();
        for &port in ports {
            if self.probe(SocketAddr::new(host, port)).await {
                open.push(port);
            }
        }
        Ok(open)
    }
}

impl TcpConnectScan {
    async fn probe(&self, addr: SocketAddr) -> bool {
        matches!(
            tokio::time::timeout(self.timeout, tokio::net::TcpStream::connect(addr)).await,
            Ok(Ok(_))
        )
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    pub struct FakeScan {
        pub hosts: Vec<IpAddr>,
        pub open_ports: HashMap<IpAddr, Vec<u16>>,
    }

    impl FakeScan {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl PalScan for FakeScan {
        async fn scan_hosts(&self, _base: IpAddr) -> Result<Vec<IpAddr>, ErrorCode> {
            Ok(self.hosts.clone())
        }
        async fn scan_ports(&self, host: IpAddr, ports: &[u16]) -> Result<Vec<u16>, ErrorCode> {
            let open = self.open_ports.get(&host).cloned().unwrap_or_default();
            Ok(ports.iter().copied().filter(|p| open.contains(p)).collect())
        }
    }
}

#[cfg(test)]
#[path = "scan_tests.rs"]
mod tests;
