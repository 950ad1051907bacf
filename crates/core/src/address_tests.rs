// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::str::FromStr;

#[test]
fn random_addresses_are_distinct() {
    assert_ne!(Address::random(), Address::random());
}

#[test]
fn display_from_str_round_trip() {
    let a = Address::random();
    let s = a.to_string();
    assert_eq!(s.len(), 32);
    assert_eq!(Address::from_str(&s).unwrap(), a);
}

#[test]
fn zero_is_zero() {
    assert!(Address::ZERO.is_zero());
    assert!(Address::default().is_zero());
}

#[test]
fn from_str_rejects_wrong_length() {
    assert!(Address::from_str("deadbeef").is_err());
}

#[test]
fn from_str_rejects_non_hex() {
    assert!(Address::from_str(&"z".repeat(32)).is_err());
}

#[test]
fn serde_round_trip() {
    let a = Address::random();
    let json = serde_json::to_string(&a).unwrap();
    let back: Address = serde_json::from_str(&json).unwrap();
    assert_eq!(a, back);
}
