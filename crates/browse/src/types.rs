// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Browse request/response wire types (§4.6, §6). Out-of-band on a local
//! session socket, separate from the control-plane `Message` envelope in
//! `edgeproxy-wire`.

use edgeproxy_core::ErrorCode;
use edgeproxy_pal::SdResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrowseRequestType {
    Cancel,
    Resolve,
    Service,
    Dirpath,
    Ipscan,
    Portscan,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowseRequest {
    pub handle: u128,
    pub r#type: BrowseRequestType,
    pub item: String,
    pub flags: u32,
}

/// `flags` bits on a [`BrowseResponse`] (§6).
pub mod response_flags {
    pub const EMPTY: u32 = 1 << 0;
    pub const ALL_FOR_NOW: u32 = 1 << 1;
    pub const EOS: u32 = 1 << 2;
    pub const REMOVED: u32 = 1 << 3;
    pub const CACHE_ONLY: u32 = 1 << 4;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowseResponse {
    pub handle: u128,
    pub error_code: ErrorCode,
    pub item: String,
    pub props: Vec<(String, String)>,
    pub flags: u32,
}

impl BrowseResponse {
    pub fn all_for_now(handle: u128) -> Self {
        BrowseResponse {
            handle,
            error_code: ErrorCode::Ok,
            item: String::new(),
            props: Vec::new(),
            flags: response_flags::EMPTY | response_flags::ALL_FOR_NOW,
        }
    }

    pub fn error(handle: u128, error_code: ErrorCode) -> Self {
        BrowseResponse { handle, error_code, item: String::new(), props: Vec::new(), flags: response_flags::EMPTY }
    }

    pub fn from_sd_result(handle: u128, result: SdResult) -> Self {
        match result {
            SdResult::Domain(domain) => {
                BrowseResponse { handle, error_code: ErrorCode::Ok, item: domain, props: Vec::new(), flags: 0 }
            }
            SdResult::ServiceType(service_type) => {
                BrowseResponse { handle, error_code: ErrorCode::Ok, item: service_type, props: Vec::new(), flags: 0 }
            }
            SdResult::Service { name, service_type, domain } => BrowseResponse {
                handle,
                error_code: ErrorCode::Ok,
                item: name,
                props: vec![("type".into(), service_type), ("domain".into(), domain)],
                flags: 0,
            },
            SdResult::Entry { host, port, records } => {
                BrowseResponse { handle, error_code: ErrorCode::Ok, item: format!("{host}:{port}"), props: records, flags: 0 }
            }
        }
    }
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
