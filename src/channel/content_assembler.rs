//! Content assembly state machine: `method_seen -> header_seen -> body_accumulating ->
//! complete`.
//!
//! Grounded on lapin's content-length tracking in `src/channel.rs`
//! (`status.set_content_length` / `status.receive`), generalized here
//! into a standalone state machine parameterized over which method
//! started the sequence, since all three content-bearing methods
//! (`basic.deliver`, `basic.return`, `basic.get-ok`) share the same
//! header-then-body shape.

use crate::basic_properties::BasicProperties;
use crate::protocol::basic;
use crate::{Error, Result};

#[derive(Clone, Debug, PartialEq)]
pub enum PendingMethod {
    Deliver(basic::Deliver),
    Return(basic::Return),
    GetOk(basic::GetOk),
}

/// A started-but-not-yet-complete content delivery.
#[derive(Clone, Debug, PartialEq)]
pub struct AssembledContent {
    pub method: PendingMethod,
    pub properties: BasicProperties,
    pub body: Vec<u8>,
}

enum State {
    Idle,
    MethodSeen(PendingMethod),
    HeaderSeen {
        method: PendingMethod,
        properties: BasicProperties,
        body_size: u64,
        body: Vec<u8>,
    },
}

pub struct ContentAssembler {
    state: State,
}

impl Default for ContentAssembler {
    fn default() -> Self {
        ContentAssembler { state: State::Idle }
    }
}

impl ContentAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, method: PendingMethod) -> Result<()> {
        match &self.state {
            State::Idle => {
                self.state = State::MethodSeen(method);
                Ok(())
            }
            _ => Err(Error::protocol(
                crate::error::AMQPHardError::UnexpectedFrame,
                "content-bearing method received while another delivery is in progress",
            )),
        }
    }

    /// Handles a content-header frame. Returns the assembled content
    /// immediately when `body_size` is zero (no body frames will follow).
    pub fn header(
        &mut self,
        class_id: u16,
        body_size: u64,
        properties: BasicProperties,
    ) -> Result<Option<AssembledContent>> {
        let _ = class_id;
        match std::mem::replace(&mut self.state, State::Idle) {
            State::MethodSeen(method) => {
                if body_size == 0 {
                    Ok(Some(AssembledContent {
                        method,
                        properties,
                        body: Vec::new(),
                    }))
                } else {
                    self.state = State::HeaderSeen {
                        method,
                        properties,
                        body_size,
                        body: Vec::new(),
                    };
                    Ok(None)
                }
            }
            other => {
                self.state = other;
                Err(Error::protocol(
                    crate::error::AMQPHardError::UnexpectedFrame,
                    "content header received without a preceding method",
                ))
            }
        }
    }

    /// Feeds one body frame. Returns the fully assembled content once the
    /// accumulated body reaches the declared size.
    pub fn body(&mut self, chunk: Vec<u8>) -> Result<Option<AssembledContent>> {
        match std::mem::replace(&mut self.state, State::Idle) {
            State::HeaderSeen {
                method,
                properties,
                body_size,
                mut body,
            } => {
                body.extend_from_slice(&chunk);
                if body.len() as u64 > body_size {
                    return Err(Error::protocol(
                        crate::error::AMQPHardError::FrameError,
                        "body frames exceed declared content-header body size",
                    ));
                }
                if body.len() as u64 == body_size {
                    self.state = State::Idle;
                    Ok(Some(AssembledContent {
                        method,
                        properties,
                        body,
                    }))
                } else {
                    self.state = State::HeaderSeen {
                        method,
                        properties,
                        body_size,
                        body,
                    };
                    Ok(None)
                }
            }
            other => {
                self.state = other;
                Err(Error::protocol(
                    crate::error::AMQPHardError::UnexpectedFrame,
                    "content body frame received outside an active delivery",
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deliver_method() -> PendingMethod {
        PendingMethod::Deliver(basic::Deliver {
            consumer_tag: "ct".to_string(),
            delivery_tag: 7,
            redelivered: false,
            exchange: String::new(),
            routing_key: "q".to_string(),
        })
    }

    #[test]
    fn assembles_body_split_across_two_frames() {
        let mut assembler = ContentAssembler::new();
        assembler.start(deliver_method()).unwrap();
        let result = assembler
            .header(60, 5000, BasicProperties::new())
            .unwrap();
        assert!(result.is_none());
        assert!(assembler.body(vec![0u8; 4000]).unwrap().is_none());
        let content = assembler.body(vec![0u8; 1000]).unwrap().unwrap();
        assert_eq!(content.body.len(), 5000);
        assert_eq!(content.method, deliver_method());
    }

    #[test]
    fn zero_length_body_completes_on_header() {
        let mut assembler = ContentAssembler::new();
        assembler.start(deliver_method()).unwrap();
        let content = assembler.header(60, 0, BasicProperties::new()).unwrap();
        assert!(content.unwrap().body.is_empty());
    }

    #[test]
    fn body_overrunning_declared_size_is_a_protocol_error() {
        let mut assembler = ContentAssembler::new();
        assembler.start(deliver_method()).unwrap();
        assembler.header(60, 10, BasicProperties::new()).unwrap();
        assert!(assembler.body(vec![0u8; 20]).is_err());
    }

    #[test]
    fn header_without_method_is_rejected() {
        let mut assembler = ContentAssembler::new();
        assert!(assembler.header(60, 10, BasicProperties::new()).is_err());
    }
}
