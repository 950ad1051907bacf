// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::fake::FakeSdClient;
use super::*;

#[tokio::test]
async fn unavailable_client_reports_not_supported() {
    let client = UnavailableSdClient;
    let err = client.create_browser().await.unwrap_err();
    assert_eq!(err, ErrorCode::NotSupported);
}

#[tokio::test]
async fn fake_client_replays_scripted_results_in_order() {
    let client = FakeSdClient::new();
    client.push_result(SdResult::Domain("local".into()));
    client.push_result(SdResult::ServiceType("_http._tcp".into()));

    let browser = client.create_browser().await.expect("create_browser");
    browser.browse(None, None, None).await.expect("browse");

    assert_eq!(browser.poll().await, Some(SdResult::Domain("local".into())));
    assert_eq!(browser.poll().await, Some(SdResult::ServiceType("_http._tcp".into())));
    assert_eq!(browser.poll().await, None);
}

#[tokio::test]
async fn fake_client_can_be_scripted_to_fail_creation() {
    let client = FakeSdClient::new();
    client.set_fail_create(true);
    let err = client.create_browser().await.unwrap_err();
    assert_eq!(err, ErrorCode::Comm);
}
