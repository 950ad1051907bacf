// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Length-delimited MessagePack framing for the browse session socket
//! (§4.6), the same 4-byte-length-prefix idiom `edgeproxy_wire::codec` uses
//! for the control-plane codec — kept local since it frames
//! `BrowseRequest`/`BrowseResponse` rather than `Message`.

use std::collections::VecDeque;

use edgeproxy_core::ErrorCode;

use crate::types::{BrowseRequest, BrowseResponse};

const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

pub fn encode_response(resp: &BrowseResponse) -> Result<Vec<u8>, ErrorCode> {
    let payload = rmp_serde::to_vec_named(resp).map_err(|_| ErrorCode::InvalidFormat)?;
    if payload.len() > MAX_FRAME_LEN {
        return Err(ErrorCode::InvalidFormat);
    }
    let mut framed = Vec::with_capacity(4 + payload.len());
    framed.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    framed.extend_from_slice(&payload);
    Ok(framed)
}

/// Pulls one complete frame off the front of `buf`, if any. `buf` holds
/// whatever bytes have arrived so far from the session socket.
pub fn try_decode_request(buf: &mut VecDeque<u8>) -> Result<Option<BrowseRequest>, ErrorCode> {
    if buf.len() < 4 {
        return Ok(None);
    }
    let len_bytes: Vec<u8> = buf.iter().take(4).copied().collect();
    let len = u32::from_be_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]]) as usize;
    if len > MAX_FRAME_LEN {
        return Err(ErrorCode::InvalidFormat);
    }
    if buf.len() < 4 + len {
        return Ok(None);
    }
    buf.drain(..4);
    let payload: Vec<u8> = buf.drain(..len).collect();
    rmp_serde::from_slice(&payload).map(Some).map_err(|_| ErrorCode::InvalidFormat)
}

#[cfg(test)]
#[path = "framing_tests.rs"]
mod tests;
