//! Outbound synchronous-request ordering.
//!
//! Old lapin-async's `Answer` enum (`async/src/api.rs`) gives every RPC call
//! site its own variant, several carrying call-specific extra fields
//! (`AwaitingQueueBindOk(RequestId, String, String)` etc). Here the frame
//! hierarchy collapses into one sum type dispatched by a lookup table
//! instead: one `PendingRequest`
//! entry type keyed by `(class_id, method_id)`, with a generic
//! `Deferred<AMQPClass>` whose `on_success` callback (installed by the
//! typed `Channel` method that created it) does the call-specific
//! destructuring lapin's bespoke `Answer` variants used to carry inline.

use std::collections::VecDeque;

use crate::deferred::Deferred;
use crate::error::AMQPError;
use crate::frame::AMQPFrame;
use crate::protocol::AMQPClass;
use crate::{Error, Result};

pub struct PendingRequest {
    pub class_id: u16,
    /// Acceptable reply method ids. Usually a single id (e.g. `declare-ok`
    /// for `declare`), but `basic.get` replies with either `get-ok` or
    /// `get-empty`, so this is a list rather than a single value.
    pub method_ids: Vec<u16>,
    pub frame: AMQPFrame,
    pub deferred: Deferred<AMQPClass>,
}

impl PendingRequest {
    pub fn new(class_id: u16, method_id: u16, frame: AMQPFrame, deferred: Deferred<AMQPClass>) -> Self {
        PendingRequest {
            class_id,
            method_ids: vec![method_id],
            frame,
            deferred,
        }
    }
}

/// Abstracts "the connection that can dispatch an `AMQPFrame`" so the
/// channel engine doesn't need to depend on the connection engine's
/// concrete type (and so it can be exercised against a test double).
pub trait FrameSink: Send + Sync {
    fn send_frame(&self, frame: AMQPFrame) -> Result<()>;
}

/// One outstanding synchronous request in flight per channel, plus
/// everything queued behind it.
#[derive(Default)]
pub struct RequestQueue {
    in_flight: Option<PendingRequest>,
    waiting: VecDeque<PendingRequest>,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues a synchronous request, sending it immediately if nothing
    /// else is in flight.
    pub fn enqueue(&mut self, request: PendingRequest, sink: &dyn FrameSink) -> Result<()> {
        if self.in_flight.is_some() {
            self.waiting.push_back(request);
            Ok(())
        } else {
            sink.send_frame(request.frame.clone())?;
            self.in_flight = Some(request);
            Ok(())
        }
    }

    /// Matches an inbound method reply against the in-flight request.
    /// Resolves its deferred and advances the queue on a match; returns a
    /// protocol error (caller should fault the channel) on mismatch.
    pub fn complete(&mut self, class_id: u16, method_id: u16, reply: AMQPClass, sink: &dyn FrameSink) -> Result<()> {
        match self.in_flight.take() {
            Some(request) if request.class_id == class_id && request.method_ids.contains(&method_id) => {
                request.deferred.resolve(reply);
                self.advance(sink)
            }
            Some(request) => {
                let message = format!(
                    "expected reply for ({}, {:?}) but received ({}, {})",
                    request.class_id, request.method_ids, class_id, method_id
                );
                request.deferred.reject(AMQPError::new(505, message.clone()));
                Err(Error::protocol(crate::error::AMQPHardError::UnexpectedFrame, message))
            }
            None => Err(Error::protocol(
                crate::error::AMQPHardError::UnexpectedFrame,
                "method reply received with no synchronous request outstanding",
            )),
        }
    }

    fn advance(&mut self, sink: &dyn FrameSink) -> Result<()> {
        if let Some(next) = self.waiting.pop_front() {
            sink.send_frame(next.frame.clone())?;
            self.in_flight = Some(next);
        }
        Ok(())
    }

    /// Fails every outstanding and queued request, e.g. on channel close.
    pub fn fail_all(&mut self, error: AMQPError) {
        if let Some(request) = self.in_flight.take() {
            request.deferred.reject(error.clone());
        }
        for request in self.waiting.drain(..) {
            request.deferred.reject(error.clone());
        }
    }

    pub fn has_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn waiting_count(&self) -> usize {
        self.waiting.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{channel, AMQPClass};
    use std::sync::{Arc, Mutex};

    struct RecordingSink {
        sent: Arc<Mutex<Vec<AMQPFrame>>>,
    }

    impl FrameSink for RecordingSink {
        fn send_frame(&self, frame: AMQPFrame) -> Result<()> {
            self.sent.lock().unwrap().push(frame);
            Ok(())
        }
    }

    fn open_ok_request(sent: &Arc<Mutex<Vec<AMQPFrame>>>) -> (PendingRequest, RecordingSink) {
        let frame = AMQPFrame::Method(1, AMQPClass::Channel(channel::Method::Open(channel::Open::default())));
        let request = PendingRequest::new(crate::protocol::CLASS_CHANNEL, channel::OPEN, frame, Deferred::new());
        (request, RecordingSink { sent: sent.clone() })
    }

    #[test]
    fn second_request_waits_behind_the_first() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let mut queue = RequestQueue::new();
        let (r1, sink) = open_ok_request(&sent);
        let (r2, _) = open_ok_request(&sent);
        queue.enqueue(r1, &sink).unwrap();
        queue.enqueue(r2, &sink).unwrap();
        assert_eq!(sent.lock().unwrap().len(), 1);
        assert_eq!(queue.waiting_count(), 1);
    }

    #[test]
    fn completing_the_head_sends_the_next_request() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let mut queue = RequestQueue::new();
        let (r1, sink) = open_ok_request(&sent);
        let (r2, _) = open_ok_request(&sent);
        queue.enqueue(r1, &sink).unwrap();
        queue.enqueue(r2, &sink).unwrap();
        let reply = AMQPClass::Channel(channel::Method::OpenOk(channel::OpenOk));
        queue
            .complete(crate::protocol::CLASS_CHANNEL, channel::OPEN, reply, &sink)
            .unwrap();
        assert_eq!(sent.lock().unwrap().len(), 2);
        assert_eq!(queue.waiting_count(), 0);
        assert!(queue.has_in_flight());
    }

    #[test]
    fn mismatched_reply_is_a_protocol_error() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let mut queue = RequestQueue::new();
        let (r1, sink) = open_ok_request(&sent);
        queue.enqueue(r1, &sink).unwrap();
        let wrong_reply = AMQPClass::Channel(channel::Method::CloseOk(channel::CloseOk));
        assert!(queue
            .complete(crate::protocol::CLASS_CHANNEL, channel::CLOSE_OK, wrong_reply, &sink)
            .is_err());
    }

    #[test]
    fn fail_all_rejects_in_flight_and_waiting() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let mut queue = RequestQueue::new();
        let (r1, sink) = open_ok_request(&sent);
        let (r2, _) = open_ok_request(&sent);
        let errored = Arc::new(Mutex::new(0));
        let e1 = errored.clone();
        let r1 = PendingRequest {
            deferred: r1.deferred.on_error(move |_| *e1.lock().unwrap() += 1),
            ..r1
        };
        let e2 = errored.clone();
        let r2 = PendingRequest {
            deferred: r2.deferred.on_error(move |_| *e2.lock().unwrap() += 1),
            ..r2
        };
        queue.enqueue(r1, &sink).unwrap();
        queue.enqueue(r2, &sink).unwrap();
        queue.fail_all(AMQPError::new(320, "connection closed"));
        assert_eq!(*errored.lock().unwrap(), 2);
    }
}
