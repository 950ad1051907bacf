// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::message::MessageBody;
use edgeproxy_core::Address;

#[test]
fn begin_request_allocates_increasing_ids() {
    let factory = MessageFactory::default();
    let (id1, _rx1) = factory.begin_request().expect("first");
    let (id2, _rx2) = factory.begin_request().expect("second");
    assert_ne!(id1, id2);
}

#[test]
fn cap_is_enforced() {
    let factory = MessageFactory::new(2);
    let (_id1, _rx1) = factory.begin_request().expect("first");
    let (_id2, _rx2) = factory.begin_request().expect("second");
    let err = factory.begin_request().unwrap_err();
    assert_eq!(err, ErrorCode::Retry);
}

#[tokio::test]
async fn complete_resolves_the_waiting_receiver() {
    let factory = MessageFactory::default();
    let (id, rx) = factory.begin_request().expect("begin");

    let response = Message::request(Address::random(), Address::random(), id, MessageBody::LinkAccept);
    assert!(factory.complete(response.clone()));

    let received = rx.await.expect("receiver resolved");
    assert_eq!(received, response);
}

#[test]
fn complete_with_unknown_correlation_id_is_a_no_op() {
    let factory = MessageFactory::default();
    let stray = Message::request(Address::random(), Address::random(), 999, MessageBody::Ping);
    assert!(!factory.complete(stray));
}

#[test]
fn cancel_frees_the_slot() {
    let factory = MessageFactory::new(1);
    let (id, _rx) = factory.begin_request().expect("first");
    assert_eq!(factory.inflight(), 1);

    factory.cancel(id);
    assert_eq!(factory.inflight(), 0);

    let (_id2, _rx2) = factory.begin_request().expect("slot freed after cancel");
}
