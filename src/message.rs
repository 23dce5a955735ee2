//! Fully-assembled inbound messages.
//!
//! Grounded on lapin's `src/message.rs` (`Delivery`, `BasicGetMessage`,
//! `BasicReturnMessage`), trimmed to the fields this core actually
//! produces — no `acker` handle is threaded through, since acking is just
//! another `Channel` method call here rather than a capability bundled
//! with the delivery.

use crate::basic_properties::BasicProperties;

/// One message handed to a consumer via `basic.deliver`.
#[derive(Clone, Debug, PartialEq)]
pub struct Delivery {
    pub delivery_tag: u64,
    pub consumer_tag: String,
    pub exchange: String,
    pub routing_key: String,
    pub redelivered: bool,
    pub properties: BasicProperties,
    pub data: Vec<u8>,
}

/// The result of `basic.get` when the queue held a message.
#[derive(Clone, Debug, PartialEq)]
pub struct BasicGetMessage {
    pub delivery_tag: u64,
    pub exchange: String,
    pub routing_key: String,
    pub redelivered: bool,
    pub message_count: u32,
    pub properties: BasicProperties,
    pub data: Vec<u8>,
}

/// A message bounced back by the broker via `basic.return` (unroutable
/// mandatory/immediate publish).
#[derive(Clone, Debug, PartialEq)]
pub struct BasicReturnMessage {
    pub reply_code: u16,
    pub reply_text: String,
    pub exchange: String,
    pub routing_key: String,
    pub properties: BasicProperties,
    pub data: Vec<u8>,
}

/// The outcome of a publisher-confirm, delivered to the deferred installed
/// at publish time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Confirmation {
    Ack,
    Nack,
}
