// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::fake::FakeScan;
use super::*;

#[tokio::test]
async fn tcp_connect_scan_finds_a_listening_port() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("local_addr").port();
    tokio::spawn(async move {
        loop {
            if listener.accept().await.is_err() {
                break;
            }
        }
    });

    let scanner = TcpConnectScan { timeout: std::time::Duration::from_millis(500) };
    let open = scanner
        .scan_ports("127.0.0.1".parse().unwrap(), &[port, 1])
        .await
        .expect("scan_ports");
    assert!(open.contains(&port));
}

#[tokio::test]
async fn fake_scan_reports_scripted_hosts_and_ports() {
    let host: IpAddr = "10.0.0.5".parse().unwrap();
    let mut scan = FakeScan::new();
    scan.hosts.push(host);
    scan.open_ports.insert(host, vec![22, 443]);

    assert_eq!(scan.scan_hosts("10.0.0.1".parse().unwrap()).await.expect("hosts"), vec![host]);
    assert_eq!(scan.scan_ports(host, &[22, 80, 443]).await.expect("ports"), vec![22, 443]);
}
