// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn request_echoes_addresses_and_defaults_ok() {
    let src = Address::random();
    let dst = Address::random();
    let msg = Message::request(src, dst, 7, MessageBody::Ping);

    assert_eq!(msg.source_address, src);
    assert_eq!(msg.proxy_address, dst);
    assert_eq!(msg.correlation_id, 7);
    assert_eq!(msg.error_code, ErrorCode::Ok);
    assert_eq!(msg.r#type, MessageType::Ping);
}

#[test]
fn respond_echoes_correlation_id_unchanged() {
    let req = Message::request(Address::random(), Address::random(), 99, MessageBody::LinkAccept);
    let resp = req.respond(ErrorCode::Ok, MessageBody::Empty);

    assert_eq!(resp.correlation_id, req.correlation_id);
    assert_eq!(resp.source_address, req.source_address);
    assert_eq!(resp.proxy_address, req.proxy_address);
}

#[test]
fn error_response_carries_code_and_empty_body() {
    let req = Message::request(Address::random(), Address::random(), 1, MessageBody::LinkOpen {
        family: AddressFamily::Inet,
        sock_type: SocketType::Stream,
        protocol: Protocol::Tcp,
        address: None,
    });
    let resp = req.error_response(ErrorCode::NotFound);

    assert_eq!(resp.error_code, ErrorCode::NotFound);
    assert_eq!(resp.body, MessageBody::Empty);
    assert_eq!(resp.correlation_id, 1);
}

#[test]
fn message_type_of_matches_every_body_variant() {
    let cases = vec![
        (MessageBody::Ping, MessageType::Ping),
        (MessageBody::Resolve { host: "h".into(), port: 1 }, MessageType::Resolve),
        (
            MessageBody::LinkOpen {
                family: AddressFamily::Inet6,
                sock_type: SocketType::Dgram,
                protocol: Protocol::Udp,
                address: None,
            },
            MessageType::LinkOpen,
        ),
        (
            MessageBody::LinkSetOpt { option: "nodelay".into(), value: OptionValue::Bool(true) },
            MessageType::LinkSetOpt,
        ),
        (MessageBody::LinkGetOpt { option: "nodelay".into() }, MessageType::LinkGetOpt),
        (
            MessageBody::LinkBind { address: SocketAddress::ip("0.0.0.0", 0) },
            MessageType::LinkBind,
        ),
        (MessageBody::LinkListen { backlog: 5 }, MessageType::LinkListen),
        (
            MessageBody::LinkConnect { address: SocketAddress::ip("10.0.0.1", 80) },
            MessageType::LinkConnect,
        ),
        (MessageBody::LinkAccept, MessageType::LinkAccept),
        (MessageBody::LinkClose, MessageType::LinkClose),
        (MessageBody::Data { buffer: vec![1, 2, 3] }, MessageType::Data),
        (MessageBody::Poll { timeout_ms: 10, max: 1 }, MessageType::Poll),
    ];

    for (body, expected) in cases {
        assert_eq!(MessageType::of(&body), expected);
    }
}

#[test]
fn socket_address_display() {
    let ip = SocketAddress::ip("192.168.1.1", 443);
    assert_eq!(ip.to_string(), "192.168.1.1:443");

    let unresolved = SocketAddress::Unresolved { host: "example.com".into(), port: 443 };
    assert_eq!(unresolved.to_string(), "example.com:443 (unresolved)");
}

#[test]
fn serde_round_trips_through_json() {
    let msg = Message::request(
        Address::random(),
        Address::random(),
        42,
        MessageBody::LinkConnect { address: SocketAddress::ip("127.0.0.1", 8080) },
    );
    let json = serde_json::to_string(&msg).expect("serialize");
    let back: Message = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(msg, back);
}
