//! C2: receive buffer & frame assembler.
//!
//! The core never owns a socket; the
//! transport collaborator hands it raw bytes as they arrive and this type
//! turns them into whole `AMQPFrame`s, the way `fbs-amqp::connection`
//! reads a 7-byte header then the declared payload length off its socket
//! (`src/connection.rs::read_frame`) — except here the socket read is
//! replaced by "wait for more bytes to be fed in", since the core has no
//! socket to await.

use crate::codec::decode::decode_frame;
use crate::frame::AMQPFrame;
use crate::{Error, Result};

/// Accumulates bytes fed in from the transport and peels off complete
/// frames one at a time.
///
/// `frame_max` starts unset (no limit enforced) because the limit itself
/// is only known after `connection.tune` completes the handshake; the
/// connection engine calls `set_frame_max` once negotiation finishes.
#[derive(Debug, Default)]
pub struct ReceiveBuffer {
    data: Vec<u8>,
    frame_max: Option<u32>,
}

impl ReceiveBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_frame_max(&mut self, frame_max: u32) {
        self.frame_max = Some(frame_max);
    }

    /// Appends newly-received bytes to the tail of the buffer.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Checks the frame's declared length against `frame_max` as soon as
    /// the 7-byte header is available, so a truncated but oversized frame
    /// is rejected without waiting for the rest of it to arrive.
    fn check_declared_length(&self) -> Result<()> {
        if self.data.len() < 7 {
            return Ok(());
        }
        let declared = u32::from_be_bytes([self.data[3], self.data[4], self.data[5], self.data[6]]);
        if let Some(max) = self.frame_max {
            if declared > max {
                return Err(Error::FrameSizeExceeded(declared as usize, max));
            }
        }
        Ok(())
    }

    /// Peels one complete frame off the front of the buffer, if one is
    /// fully present. Returns `Ok(None)` when more bytes are needed.
    pub fn poll_frame(&mut self) -> Result<Option<AMQPFrame>> {
        self.check_declared_length()?;
        match decode_frame(&self.data)? {
            Some((consumed, frame)) => {
                self.data.drain(..consumed);
                Ok(Some(frame))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode::encode_frame;

    #[test]
    fn assembles_frame_split_across_two_feeds() {
        let bytes = encode_frame(&AMQPFrame::Heartbeat);
        let mut buf = ReceiveBuffer::new();
        buf.feed(&bytes[..3]);
        assert!(buf.poll_frame().unwrap().is_none());
        buf.feed(&bytes[3..]);
        assert_eq!(buf.poll_frame().unwrap(), Some(AMQPFrame::Heartbeat));
        assert!(buf.is_empty());
    }

    #[test]
    fn assembles_two_frames_fed_together() {
        let mut bytes = encode_frame(&AMQPFrame::Heartbeat);
        bytes.extend(encode_frame(&AMQPFrame::Heartbeat));
        let mut buf = ReceiveBuffer::new();
        buf.feed(&bytes);
        assert_eq!(buf.poll_frame().unwrap(), Some(AMQPFrame::Heartbeat));
        assert_eq!(buf.poll_frame().unwrap(), Some(AMQPFrame::Heartbeat));
        assert_eq!(buf.poll_frame().unwrap(), None);
    }

    #[test]
    fn rejects_frame_exceeding_frame_max_before_full_frame_arrives() {
        let mut buf = ReceiveBuffer::new();
        buf.set_frame_max(16);
        // header declaring a 1000-byte payload, no payload bytes yet
        buf.feed(&[1, 0, 0, 0, 0, 3, 0xE8]);
        let err = buf.poll_frame().unwrap_err();
        assert!(matches!(err, Error::FrameSizeExceeded(1000, 16)));
    }
}
