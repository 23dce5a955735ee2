//! The `Frame` sum type.
//!
//! AMQP-CPP gives every method its own C++ class under a common frame
//! hierarchy (`src/receivedframe.h` et al.); lapin's generated
//! `AMQPFrame` already collapses this into one enum, so this module
//! follows that shape directly: one enum, four variants, dispatch by
//! matching instead of by virtual call.

use crate::basic_properties::BasicProperties;
use crate::protocol::AMQPClass;

pub const FRAME_END: u8 = 0xCE;

pub const TYPE_METHOD: u8 = 1;
pub const TYPE_HEADER: u8 = 2;
pub const TYPE_BODY: u8 = 3;
pub const TYPE_HEARTBEAT: u8 = 8;

pub const PROTOCOL_HEADER: &[u8] = b"AMQP\x00\x00\x09\x01";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AMQPFrameType {
    Method,
    Header,
    Body,
    Heartbeat,
}

impl AMQPFrameType {
    pub fn from_wire(byte: u8) -> Option<Self> {
        match byte {
            TYPE_METHOD => Some(AMQPFrameType::Method),
            TYPE_HEADER => Some(AMQPFrameType::Header),
            TYPE_BODY => Some(AMQPFrameType::Body),
            TYPE_HEARTBEAT => Some(AMQPFrameType::Heartbeat),
            _ => None,
        }
    }

    pub fn to_wire(self) -> u8 {
        match self {
            AMQPFrameType::Method => TYPE_METHOD,
            AMQPFrameType::Header => TYPE_HEADER,
            AMQPFrameType::Body => TYPE_BODY,
            AMQPFrameType::Heartbeat => TYPE_HEARTBEAT,
        }
    }
}

/// Content-header frame payload: class id, weight (always 0, unused by
/// AMQP 0-9-1), total body size, and the property set.
#[derive(Clone, Debug, PartialEq)]
pub struct AMQPContentHeader {
    pub class_id: u16,
    pub weight: u16,
    pub body_size: u64,
    pub properties: BasicProperties,
}

#[derive(Clone, Debug, PartialEq)]
pub enum AMQPFrame {
    Method(u16, AMQPClass),
    Header(u16, u16, Box<AMQPContentHeader>),
    Body(u16, Vec<u8>),
    Heartbeat,
}

impl AMQPFrame {
    pub fn channel_id(&self) -> u16 {
        match self {
            AMQPFrame::Method(ch, _) => *ch,
            AMQPFrame::Header(ch, _, _) => *ch,
            AMQPFrame::Body(ch, _) => *ch,
            AMQPFrame::Heartbeat => 0,
        }
    }

    pub fn frame_type(&self) -> AMQPFrameType {
        match self {
            AMQPFrame::Method(..) => AMQPFrameType::Method,
            AMQPFrame::Header(..) => AMQPFrameType::Header,
            AMQPFrame::Body(..) => AMQPFrameType::Body,
            AMQPFrame::Heartbeat => AMQPFrameType::Heartbeat,
        }
    }
}
