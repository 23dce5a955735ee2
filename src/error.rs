use crate::channel::status::ChannelState;
use crate::connection::status::ConnectionState;
use std::{fmt, io};

/// A reply code + text pair as carried by `connection.close`/`channel.close`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AMQPError {
    pub reply_code: u16,
    pub reply_text: String,
}

impl AMQPError {
    pub fn new(reply_code: u16, reply_text: impl Into<String>) -> Self {
        Self {
            reply_code,
            reply_text: reply_text.into(),
        }
    }
}

impl fmt::Display for AMQPError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.reply_text, self.reply_code)
    }
}

/// Hard errors defined by the AMQP 0-9-1 spec, used to build protocol-level
/// `AMQPError`s when the core itself (not the broker) detects the violation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AMQPHardError {
    UnexpectedFrame,
    FrameError,
    CommandInvalid,
    ChannelError,
    NotAllowed,
    NotImplemented,
    InternalError,
}

impl AMQPHardError {
    pub fn code(self) -> u16 {
        match self {
            AMQPHardError::UnexpectedFrame => 505,
            AMQPHardError::FrameError => 501,
            AMQPHardError::CommandInvalid => 503,
            AMQPHardError::ChannelError => 504,
            AMQPHardError::NotAllowed => 530,
            AMQPHardError::NotImplemented => 540,
            AMQPHardError::InternalError => 541,
        }
    }
}

/// The single error type returned by every fallible operation in this crate.
///
/// Decode and protocol errors fault the whole connection; broker-signaled
/// channel errors fault only the originating channel.
#[derive(Clone, Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed frame: {0}")]
    Decode(String),

    #[error("frame payload ({0} bytes) exceeds negotiated max frame size ({1} bytes)")]
    FrameSizeExceeded(usize, u32),

    #[error("frame is missing its 0xCE end marker")]
    BadEndMarker,

    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error("broker closed the connection: {0}")]
    ConnectionClosed(AMQPError),

    #[error("broker closed the channel: {0}")]
    ChannelClosed(AMQPError),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("heartbeat timeout: no bytes received for {0} seconds")]
    HeartbeatTimeout(u16),

    #[error("invalid connection state for this operation: {0:?}")]
    InvalidConnectionState(ConnectionState),

    #[error("invalid channel state for this operation: {0:?}")]
    InvalidChannelState(ChannelState),

    #[error("invalid amqp address: {0}")]
    InvalidUri(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl Error {
    pub fn protocol(err: AMQPHardError, message: impl Into<String>) -> Self {
        Error::Protocol(format!("{} (reply_code={})", message.into(), err.code()))
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
