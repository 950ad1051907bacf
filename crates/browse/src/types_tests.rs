// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn all_for_now_sets_both_bits() {
    let resp = BrowseResponse::all_for_now(42);
    assert_eq!(resp.flags & response_flags::EMPTY, response_flags::EMPTY);
    assert_eq!(resp.flags & response_flags::ALL_FOR_NOW, response_flags::ALL_FOR_NOW);
    assert_eq!(resp.handle, 42);
}

#[test]
fn service_result_carries_type_and_domain_as_props() {
    let resp = BrowseResponse::from_sd_result(
        1,
        SdResult::Service { name: "printer".into(), service_type: "_ipp._tcp".into(), domain: "local".into() },
    );
    assert_eq!(resp.item, "printer");
    assert!(resp.props.contains(&("type".to_string(), "_ipp._tcp".to_string())));
    assert!(resp.props.contains(&("domain".to_string(), "local".to_string())));
}

#[test]
fn entry_result_formats_host_port_as_the_item() {
    let resp = BrowseResponse::from_sd_result(
        2,
        SdResult::Entry { host: "10.0.0.5".into(), port: 443, records: vec![("txt".into(), "v=1".into())] },
    );
    assert_eq!(resp.item, "10.0.0.5:443");
    assert_eq!(resp.props, vec![("txt".to_string(), "v=1".to_string())]);
}
