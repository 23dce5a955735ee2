//! C1: the wire codec. Hand-rolled rather than generated or built on a
//! parser-combinator crate, in the style of `fbs-amqp/src/buffer.rs` — the
//! protocol is a fixed binary grammar, not something that benefits from
//! `nom`'s backtracking.

pub mod decode;
pub mod encode;

pub use decode::{decode_content_header, decode_frame, decode_method, Reader};
pub use encode::{encode_content_header, encode_frame, encode_method, Writer};
