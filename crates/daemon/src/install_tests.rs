// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use edgeproxy_browse::BrowseTimings;
use edgeproxy_storage::Registry;

use super::*;

fn config(local: &std::path::Path, hub: &std::path::Path) -> ProxyConfig {
    ProxyConfig {
        connection_string: "mqtts://hub.example.com".to_string(),
        name: "edge-1".to_string(),
        local_registry_path: local.to_path_buf(),
        hub_registry_path: hub.to_path_buf(),
        inflight_cap: edgeproxy_wire::DEFAULT_MAX_INFLIGHT,
        browse_timings: BrowseTimings::default(),
        browse_fs_enabled: true,
        scan_enabled: true,
        browse_listen_addr: "127.0.0.1:0".parse().unwrap(),
        heartbeat_interval: std::time::Duration::from_secs(10),
        telemetry_log_interval: std::time::Duration::from_secs(2),
    }
}

#[test]
fn install_records_the_proxy_in_both_registries() {
    let dir = tempfile::tempdir().unwrap();
    let local_path = dir.path().join("ns.local.json");
    let hub_path = dir.path().join("ns.hub.json");
    let cfg = config(&local_path, &hub_path);

    install(&cfg).unwrap();

    let local = Registry::load(&local_path).unwrap();
    let hub = Registry::load(&hub_path).unwrap();
    assert_eq!(local.len(), 1);
    assert_eq!(hub.len(), 1);
    assert_eq!(local.entries().next().unwrap().name, "edge-1");
}

#[test]
fn uninstall_removes_only_the_matching_entry() {
    let dir = tempfile::tempdir().unwrap();
    let local_path = dir.path().join("ns.local.json");
    let hub_path = dir.path().join("ns.hub.json");
    let cfg = config(&local_path, &hub_path);

    install(&cfg).unwrap();
    uninstall(&cfg).unwrap();

    let local = Registry::load(&local_path).unwrap();
    let hub = Registry::load(&hub_path).unwrap();
    assert!(local.is_empty());
    assert!(hub.is_empty());
}

#[test]
fn uninstall_on_an_unknown_name_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let local_path = dir.path().join("ns.local.json");
    let hub_path = dir.path().join("ns.hub.json");
    let cfg = config(&local_path, &hub_path);

    uninstall(&cfg).unwrap();

    let local = Registry::load(&local_path).unwrap();
    assert!(local.is_empty());
}
