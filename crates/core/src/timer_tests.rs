// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn timer_id_display() {
    let id = TimerId::from_string("test-timer");
    assert_eq!(id.to_string(), "test-timer");
}

#[test]
fn timer_id_equality() {
    let id1 = TimerId::from_string("timer-1");
    let id2 = TimerId::from_string("timer-1");
    let id3 = TimerId::from_string("timer-2");

    assert_eq!(id1, id2);
    assert_ne!(id1, id3);
}

#[test]
fn timer_id_serde() {
    let id = TimerId::from_string("my-timer");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"my-timer\"");

    let parsed: TimerId = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, id);
}

#[test]
fn factory_methods_format() {
    assert_eq!(TimerId::heartbeat("broker-1").as_str(), "heartbeat:broker-1");
    assert_eq!(TimerId::reconnect_backoff("broker-1").as_str(), "reconnect:broker-1");
    assert_eq!(TimerId::stream_timeout(42).as_str(), "stream-timeout:42");
    assert_eq!(TimerId::sdclient_retry().as_str(), "sdclient-retry");

    let addr = Address::ZERO;
    assert_eq!(
        TimerId::link_close_drain(addr).as_str(),
        format!("link-close-drain:{addr}")
    );
}

#[test]
fn kind_unknown_returns_none() {
    assert!(TimerId::from_string("other-timer").kind().is_none());
}

#[test]
fn timer_kind_parse_unknown_returns_none() {
    assert!(TimerKind::parse("other-timer").is_none());
    assert!(TimerKind::parse("").is_none());
    assert!(TimerKind::parse("unknown:foo").is_none());
}

#[test]
fn timer_kind_round_trip_all_factory_methods() {
    let addr = Address::random();
    let cases = vec![
        TimerId::heartbeat("entry-1"),
        TimerId::reconnect_backoff("entry-1"),
        TimerId::stream_timeout(7),
        TimerId::sdclient_retry(),
        TimerId::link_close_drain(addr),
    ];

    for timer_id in &cases {
        let kind = TimerKind::parse(timer_id.as_str())
            .unwrap_or_else(|| panic!("failed to parse: {}", timer_id));
        let round_tripped = kind.to_timer_id();
        assert_eq!(timer_id, &round_tripped, "round-trip failed for: {}", timer_id);
    }
}
