//! `access.request`/`access.request-ok` — a legacy AMQP 0-9-1 method some
//! brokers still negotiate; kept as a no-op synchronous request, matching how lapin's
//! `src/channel.rs` handles `on_access_request_ok_received` by doing
//! nothing but resolving the caller's deferred.

use super::MethodId;
use crate::types::ShortString;

pub const REQUEST: u16 = 10;
pub const REQUEST_OK: u16 = 11;

#[derive(Clone, Debug, PartialEq)]
pub enum Method {
    Request(Request),
    RequestOk(RequestOk),
}

impl MethodId for Method {
    fn method_id(&self) -> u16 {
        match self {
            Method::Request(_) => REQUEST,
            Method::RequestOk(_) => REQUEST_OK,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    pub realm: ShortString,
    pub exclusive: bool,
    pub passive: bool,
    pub active: bool,
    pub write: bool,
    pub read: bool,
}

impl Default for Request {
    fn default() -> Self {
        Request {
            realm: "/data".to_string(),
            exclusive: false,
            passive: true,
            active: true,
            write: true,
            read: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RequestOk {
    pub ticket: u16,
}
