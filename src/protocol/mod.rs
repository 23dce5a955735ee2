//! The closed method catalog: one `(class_id, method_id)` pair per AMQP
//! 0-9-1 method, with its argument schema.
//!
//! AMQP-CPP and the generated half of lapin (`amq-protocol-codegen`) both
//! derive this table mechanically from the protocol's XML spec at build
//! time. This crate has no codegen step, so the table is written out by
//! hand once, here, the way lapin's `src/channel.rs` consumes the
//! generated `protocol::{self, AMQPClass, AMQPError, AMQPHardError}` — the
//! shape callers see is the same, only the generator is gone.

pub mod access;
pub mod basic;
pub mod channel;
pub mod confirm;
pub mod connection;
pub mod exchange;
pub mod queue;
pub mod tx;

pub const CLASS_CONNECTION: u16 = 10;
pub const CLASS_CHANNEL: u16 = 20;
pub const CLASS_ACCESS: u16 = 30;
pub const CLASS_EXCHANGE: u16 = 40;
pub const CLASS_QUEUE: u16 = 50;
pub const CLASS_BASIC: u16 = 60;
pub const CLASS_TX: u16 = 90;
pub const CLASS_CONFIRM: u16 = 85;

/// One variant per AMQP class, each wrapping that class's method enum.
///
/// This is the Rust re-architecture the design notes
/// call for: one closed sum type over the method catalog rather than a
/// class hierarchy with one leaf type per method.
#[derive(Clone, Debug, PartialEq)]
pub enum AMQPClass {
    Connection(connection::Method),
    Channel(channel::Method),
    Access(access::Method),
    Exchange(exchange::Method),
    Queue(queue::Method),
    Basic(basic::Method),
    Tx(tx::Method),
    Confirm(confirm::Method),
}

impl AMQPClass {
    pub fn class_id(&self) -> u16 {
        match self {
            AMQPClass::Connection(_) => CLASS_CONNECTION,
            AMQPClass::Channel(_) => CLASS_CHANNEL,
            AMQPClass::Access(_) => CLASS_ACCESS,
            AMQPClass::Exchange(_) => CLASS_EXCHANGE,
            AMQPClass::Queue(_) => CLASS_QUEUE,
            AMQPClass::Basic(_) => CLASS_BASIC,
            AMQPClass::Tx(_) => CLASS_TX,
            AMQPClass::Confirm(_) => CLASS_CONFIRM,
        }
    }

    pub fn method_id(&self) -> u16 {
        match self {
            AMQPClass::Connection(m) => m.method_id(),
            AMQPClass::Channel(m) => m.method_id(),
            AMQPClass::Access(m) => m.method_id(),
            AMQPClass::Exchange(m) => m.method_id(),
            AMQPClass::Queue(m) => m.method_id(),
            AMQPClass::Basic(m) => m.method_id(),
            AMQPClass::Tx(m) => m.method_id(),
            AMQPClass::Confirm(m) => m.method_id(),
        }
    }

    /// Whether the broker sends back a matching reply that the channel
    /// engine's wait queue should expect, i.e.
    /// whether this is a *synchronous* request rather than an
    /// asynchronous one like `basic.publish`/`basic.ack`.
    pub fn is_synchronous_request(&self) -> bool {
        matches!(
            self,
            AMQPClass::Channel(channel::Method::Open(_))
                | AMQPClass::Channel(channel::Method::Close(_))
                | AMQPClass::Channel(channel::Method::Flow(_))
                | AMQPClass::Access(access::Method::Request(_))
                | AMQPClass::Exchange(exchange::Method::Declare(_))
                | AMQPClass::Exchange(exchange::Method::Delete(_))
                | AMQPClass::Exchange(exchange::Method::Bind(_))
                | AMQPClass::Exchange(exchange::Method::Unbind(_))
                | AMQPClass::Queue(queue::Method::Declare(_))
                | AMQPClass::Queue(queue::Method::Bind(_))
                | AMQPClass::Queue(queue::Method::Unbind(_))
                | AMQPClass::Queue(queue::Method::Purge(_))
                | AMQPClass::Queue(queue::Method::Delete(_))
                | AMQPClass::Basic(basic::Method::Qos(_))
                | AMQPClass::Basic(basic::Method::Consume(_))
                | AMQPClass::Basic(basic::Method::Cancel(_))
                | AMQPClass::Basic(basic::Method::Get(_))
                | AMQPClass::Basic(basic::Method::Recover(_))
                | AMQPClass::Tx(tx::Method::Select(_))
                | AMQPClass::Tx(tx::Method::Commit(_))
                | AMQPClass::Tx(tx::Method::Rollback(_))
                | AMQPClass::Confirm(confirm::Method::Select(_))
        )
    }
}

pub trait MethodId {
    fn method_id(&self) -> u16;
}
