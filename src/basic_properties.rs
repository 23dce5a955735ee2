//! `basic`-class content header properties (the AMQP 0-9-1 "envelope").
//!
//! Each field is individually present-or-absent; presence is recorded in a
//! 16-bit flags word (with an extension bit for future revisions). We model
//! presence with `Option<T>` rather than a separate
//! bitset so the codec can derive the flags word from which fields are
//! `Some`, the way lapin's generated `BasicProperties` does.

use crate::types::{FieldTable, LongLongUInt, ShortString};

pub const FLAG_CONTENT_TYPE: u16 = 1 << 15;
pub const FLAG_CONTENT_ENCODING: u16 = 1 << 14;
pub const FLAG_HEADERS: u16 = 1 << 13;
pub const FLAG_DELIVERY_MODE: u16 = 1 << 12;
pub const FLAG_PRIORITY: u16 = 1 << 11;
pub const FLAG_CORRELATION_ID: u16 = 1 << 10;
pub const FLAG_REPLY_TO: u16 = 1 << 9;
pub const FLAG_EXPIRATION: u16 = 1 << 8;
pub const FLAG_MESSAGE_ID: u16 = 1 << 7;
pub const FLAG_TIMESTAMP: u16 = 1 << 6;
pub const FLAG_TYPE: u16 = 1 << 5;
pub const FLAG_USER_ID: u16 = 1 << 4;
pub const FLAG_APP_ID: u16 = 1 << 3;
pub const FLAG_CLUSTER_ID: u16 = 1 << 2;
/// Bit 0 of each flags word: when set, another flags word follows.
pub const FLAG_EXTENSION: u16 = 1 << 0;

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BasicProperties {
    pub content_type: Option<ShortString>,
    pub content_encoding: Option<ShortString>,
    pub headers: Option<FieldTable>,
    pub delivery_mode: Option<u8>,
    pub priority: Option<u8>,
    pub correlation_id: Option<ShortString>,
    pub reply_to: Option<ShortString>,
    pub expiration: Option<ShortString>,
    pub message_id: Option<ShortString>,
    pub timestamp: Option<LongLongUInt>,
    pub kind: Option<ShortString>,
    pub user_id: Option<ShortString>,
    pub app_id: Option<ShortString>,
    pub cluster_id: Option<ShortString>,
}

macro_rules! with_field {
    ($name:ident, $ty:ty) => {
        pub fn $name(mut self, value: $ty) -> Self {
            self.$name = Some(value);
            self
        }
    };
}

impl BasicProperties {
    pub fn new() -> Self {
        Self::default()
    }

    with_field!(content_type, ShortString);
    with_field!(content_encoding, ShortString);
    with_field!(headers, FieldTable);
    with_field!(delivery_mode, u8);
    with_field!(priority, u8);
    with_field!(correlation_id, ShortString);
    with_field!(reply_to, ShortString);
    with_field!(expiration, ShortString);
    with_field!(message_id, ShortString);
    with_field!(timestamp, LongLongUInt);
    with_field!(kind, ShortString);
    with_field!(user_id, ShortString);
    with_field!(app_id, ShortString);
    with_field!(cluster_id, ShortString);

    /// The value of the first (and, for this crate, only) flags word.
    /// No property of `basic` needs a second word, so the extension bit
    /// is always 0 on encode; the decoder still honours it on input.
    pub fn flags(&self) -> u16 {
        let mut flags = 0u16;
        if self.content_type.is_some() {
            flags |= FLAG_CONTENT_TYPE;
        }
        if self.content_encoding.is_some() {
            flags |= FLAG_CONTENT_ENCODING;
        }
        if self.headers.is_some() {
            flags |= FLAG_HEADERS;
        }
        if self.delivery_mode.is_some() {
            flags |= FLAG_DELIVERY_MODE;
        }
        if self.priority.is_some() {
            flags |= FLAG_PRIORITY;
        }
        if self.correlation_id.is_some() {
            flags |= FLAG_CORRELATION_ID;
        }
        if self.reply_to.is_some() {
            flags |= FLAG_REPLY_TO;
        }
        if self.expiration.is_some() {
            flags |= FLAG_EXPIRATION;
        }
        if self.message_id.is_some() {
            flags |= FLAG_MESSAGE_ID;
        }
        if self.timestamp.is_some() {
            flags |= FLAG_TIMESTAMP;
        }
        if self.kind.is_some() {
            flags |= FLAG_TYPE;
        }
        if self.user_id.is_some() {
            flags |= FLAG_USER_ID;
        }
        if self.app_id.is_some() {
            flags |= FLAG_APP_ID;
        }
        if self.cluster_id.is_some() {
            flags |= FLAG_CLUSTER_ID;
        }
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_reflect_presence_only() {
        let props = BasicProperties::new()
            .content_type("text/plain".to_string())
            .delivery_mode(2);
        assert_eq!(props.flags(), FLAG_CONTENT_TYPE | FLAG_DELIVERY_MODE);
    }

    #[test]
    fn empty_properties_have_zero_flags() {
        assert_eq!(BasicProperties::new().flags(), 0);
    }
}
