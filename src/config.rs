//! Connection tuning: what the application asks for, and what the
//! handshake actually negotiates.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::auth::SASLMechanism;
use crate::types::FieldTable;

/// Client-supplied knobs, consulted once during the handshake.
#[derive(Clone, Debug, PartialEq)]
pub struct ConnectionProperties {
    pub channel_max: u16,
    pub frame_max: u32,
    pub heartbeat: u16,
    pub client_properties: FieldTable,
    pub mechanism: SASLMechanism,
    pub locale: String,
}

impl Default for ConnectionProperties {
    fn default() -> Self {
        ConnectionProperties {
            channel_max: 2047,
            frame_max: 131_072,
            heartbeat: 60,
            client_properties: default_client_properties(),
            mechanism: SASLMechanism::Plain,
            locale: "en_US".to_string(),
        }
    }
}

/// Advertises the client capability flags, the way every real AMQP
/// 0-9-1 client does in its `connection.start-ok`.
fn default_client_properties() -> FieldTable {
    use crate::types::AMQPValue;

    let mut capabilities = FieldTable::new();
    capabilities.insert("publisher_confirms".to_string(), AMQPValue::Boolean(true));
    capabilities.insert("basic.nack".to_string(), AMQPValue::Boolean(true));
    capabilities.insert(
        "consumer_cancel_notify".to_string(),
        AMQPValue::Boolean(true),
    );
    capabilities.insert(
        "exchange_exchange_bindings".to_string(),
        AMQPValue::Boolean(true),
    );
    capabilities.insert("connection.blocked".to_string(), AMQPValue::Boolean(true));
    capabilities.insert(
        "authentication_failure_close".to_string(),
        AMQPValue::Boolean(true),
    );

    let mut properties = FieldTable::new();
    properties.insert("product".to_string(), AMQPValue::from("hutch"));
    properties.insert("version".to_string(), AMQPValue::from(env!("CARGO_PKG_VERSION")));
    properties.insert("platform".to_string(), AMQPValue::from("rust"));
    properties.insert("capabilities".to_string(), AMQPValue::FieldTable(capabilities));
    properties
}

#[derive(Debug, Default)]
struct Inner {
    channel_max: u16,
    frame_max: u32,
    heartbeat: u16,
}

/// The values actually agreed on with the broker, shared between the
/// connection and every channel it owns (mirrors lapin's `Configuration`,
/// referenced as a `Channel` field in `src/channel.rs`).
#[derive(Clone, Debug, Default)]
pub struct Configuration(Arc<Mutex<Inner>>);

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_channel_max(&self, value: u16) {
        self.0.lock().channel_max = value;
    }

    pub fn channel_max(&self) -> u16 {
        self.0.lock().channel_max
    }

    pub fn set_frame_max(&self, value: u32) {
        self.0.lock().frame_max = value;
    }

    pub fn frame_max(&self) -> u32 {
        self.0.lock().frame_max
    }

    pub fn set_heartbeat(&self, value: u16) {
        self.0.lock().heartbeat = value;
    }

    pub fn heartbeat(&self) -> u16 {
        self.0.lock().heartbeat
    }
}
