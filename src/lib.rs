//! An embeddable, synchronous AMQP 0-9-1 client core.
//!
//! This crate owns the protocol: framing, the method/content-header/body
//! codec, handshake and channel state machines, request ordering, and
//! publisher-confirm/consumer bookkeeping. It does not own a socket, an
//! event loop, or a thread. The embedding application feeds inbound bytes
//! in through [`connection::Connection::feed`], receives outbound bytes
//! through an [`connection::IoHandler`] it supplies, and drives time
//! forward through [`connection::Connection::heartbeat_tick`]. Every other
//! operation is a direct, non-blocking method call that returns a
//! [`deferred::Deferred`] resolved once the broker replies.
//!
//! ```text
//! Connection::new(uri, properties, io)
//!   .start()                 // write the protocol header
//!   .feed(bytes)              // as bytes arrive from the transport
//!   .create_channel()        // open a Channel once connected
//! ```

pub mod auth;
pub mod basic_properties;
pub mod buffer;
pub mod channel;
pub mod codec;
pub mod config;
pub mod connection;
pub mod deferred;
pub mod error;
pub mod frame;
pub mod message;
pub mod protocol;
pub mod types;
pub mod uri;

pub use auth::{Credentials, SASLMechanism};
pub use basic_properties::BasicProperties;
pub use channel::{
    BasicConsumeOptions, BasicGetOptions, BasicPublishOptions, BasicQosOptions, Channel, ChannelState,
    ExchangeBindOptions, ExchangeDeclareOptions, ExchangeDeleteOptions, ExchangeKind, ExchangeUnbindOptions, Queue,
    QueueBindOptions, QueueDeclareOptions, QueueDeleteOptions, QueuePurgeOptions, QueueUnbindOptions,
};
pub use config::{Configuration, ConnectionProperties};
pub use connection::{Connection, ConnectionHandler, ConnectionState, IoHandler};
pub use deferred::Deferred;
pub use error::{AMQPError, AMQPHardError, Error, Result};
pub use message::{BasicGetMessage, BasicReturnMessage, Confirmation, Delivery};
pub use uri::{AMQPScheme, AMQPUri};
