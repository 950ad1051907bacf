// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use edgeproxy_core::Address;
use edgeproxy_wire::MessageBody;

#[tokio::test]
async fn send_on_one_side_is_received_on_the_other() {
    let (tx_a, _rx_a) = mpsc::channel(8);
    let (tx_b, mut rx_b) = mpsc::channel(8);
    let (a, _b) = LoopbackConnection::pair(tx_a, tx_b);

    let msg = Message::request(Address::random(), Address::random(), 1, MessageBody::Ping);
    a.send(msg.clone()).await.expect("send");

    match rx_b.recv().await {
        Some(ConnectionEvent::Received(received)) => assert_eq!(received, msg),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn close_is_idempotent_and_delivers_exactly_one_closed_event() {
    let (tx_a, mut rx_a) = mpsc::channel(8);
    let (tx_b, _rx_b) = mpsc::channel(8);
    let (a, _b) = LoopbackConnection::pair(tx_a, tx_b);

    a.close().await;
    a.close().await;

    assert!(matches!(rx_a.recv().await, Some(ConnectionEvent::Closed)));
    drop(a);
    assert!(rx_a.recv().await.is_none());
}

#[tokio::test]
async fn send_after_close_fails_without_a_completion_event() {
    let (tx_a, _rx_a) = mpsc::channel(8);
    let (tx_b, mut rx_b) = mpsc::channel(8);
    let (a, _b) = LoopbackConnection::pair(tx_a, tx_b);

    a.close().await;
    let msg = Message::request(Address::random(), Address::random(), 1, MessageBody::Ping);
    let err = a.send(msg).await.unwrap_err();
    assert_eq!(err, ErrorCode::Closed);

    drop(a);
    assert!(rx_b.recv().await.is_none());
}

#[tokio::test]
async fn inject_delivers_transport_raised_events_to_the_owner() {
    let (tx_a, mut rx_a) = mpsc::channel(8);
    let (tx_b, _rx_b) = mpsc::channel(8);
    let (a, _b) = LoopbackConnection::pair(tx_a, tx_b);

    a.inject(ConnectionEvent::Reconnecting(ErrorCode::Network)).await;
    assert!(matches!(rx_a.recv().await, Some(ConnectionEvent::Reconnecting(ErrorCode::Network))));
}
