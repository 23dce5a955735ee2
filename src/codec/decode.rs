//! Decoding half of the frame codec (C1).
//!
//! Grounded on the cursor style of `fbs-amqp/src/buffer.rs`'s `ReadBuffer`
//! (a hand-rolled big-endian byte reader, no parser-combinator dependency)
//! generalized to cover the full AMQP 0-9-1 field-value grammar and the
//! closed method catalog in `crate::protocol`, the way `amq-protocol`'s
//! `frame-parsing.rs` (other_examples) dispatches `parse_frame` on
//! `(frame_type, class_id, method_id)`.

use crate::basic_properties::{self, BasicProperties};
use crate::frame::{AMQPContentHeader, AMQPFrame, AMQPFrameType, FRAME_END, PROTOCOL_HEADER};
use crate::protocol::{self, access, basic, channel, confirm, connection, exchange, queue, tx, AMQPClass};
use crate::types::{AMQPValue, Decimal, FieldArray, FieldTable};

#[derive(Debug)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

fn err(msg: impl Into<String>) -> crate::Error {
    crate::Error::Decode(msg.into())
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Reader { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    fn take(&mut self, n: usize) -> crate::Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(err(format!(
                "expected {} more bytes, got {}",
                n,
                self.remaining()
            )));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> crate::Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_bool(&mut self) -> crate::Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_i8(&mut self) -> crate::Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16(&mut self) -> crate::Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn read_i16(&mut self) -> crate::Result<i16> {
        Ok(self.read_u16()? as i16)
    }

    pub fn read_u32(&mut self) -> crate::Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_i32(&mut self) -> crate::Result<i32> {
        Ok(self.read_u32()? as i32)
    }

    pub fn read_u64(&mut self) -> crate::Result<u64> {
        let b = self.take(8)?;
        Ok(u64::from_be_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    pub fn read_i64(&mut self) -> crate::Result<i64> {
        Ok(self.read_u64()? as i64)
    }

    pub fn read_f32(&mut self) -> crate::Result<f32> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    pub fn read_f64(&mut self) -> crate::Result<f64> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    pub fn read_short_string(&mut self) -> crate::Result<String> {
        let len = self.read_u8()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|e| err(format!("invalid utf8 in short string: {}", e)))
    }

    pub fn read_long_string(&mut self) -> crate::Result<Vec<u8>> {
        let len = self.read_u32()? as usize;
        Ok(self.take(len)?.to_vec())
    }

    pub fn read_decimal(&mut self) -> crate::Result<Decimal> {
        let scale = self.read_u8()?;
        let value = self.read_i32()?;
        Ok(Decimal { scale, value })
    }

    /// A bit-packed run of `count` consecutive boolean method arguments,
    /// LSB-first within each byte.
    pub fn read_bits(&mut self, count: usize) -> crate::Result<Vec<bool>> {
        let mut out = Vec::with_capacity(count);
        let mut remaining = count;
        while remaining > 0 {
            let byte = self.read_u8()?;
            let n = remaining.min(8);
            for bit in 0..n {
                out.push((byte >> bit) & 1 == 1);
            }
            remaining -= n;
        }
        Ok(out)
    }

    pub fn read_field_value(&mut self) -> crate::Result<AMQPValue> {
        let tag = self.read_u8()?;
        self.read_field_value_for_tag(tag)
    }

    fn read_field_value_for_tag(&mut self, tag: u8) -> crate::Result<AMQPValue> {
        use crate::types::tag::*;
        Ok(match tag {
            BOOLEAN => AMQPValue::Boolean(self.read_bool()?),
            SHORT_SHORT_INT => AMQPValue::ShortShortInt(self.read_i8()?),
            SHORT_SHORT_UINT => AMQPValue::ShortShortUInt(self.read_u8()?),
            SHORT_INT => AMQPValue::ShortInt(self.read_i16()?),
            SHORT_UINT => AMQPValue::ShortUInt(self.read_u16()?),
            LONG_INT => AMQPValue::LongInt(self.read_i32()?),
            LONG_UINT => AMQPValue::LongUInt(self.read_u32()?),
            LONG_LONG_INT => AMQPValue::LongLongInt(self.read_i64()?),
            LONG_LONG_UINT => AMQPValue::LongLongUInt(self.read_u64()?),
            FLOAT => AMQPValue::Float(self.read_f32()?),
            DOUBLE => AMQPValue::Double(self.read_f64()?),
            DECIMAL => AMQPValue::Decimal(self.read_decimal()?),
            // Legacy short-string field tag: rarely used on the wire but
            // must be accepted on decode.
            SHORT_STRING => AMQPValue::LongString(self.read_short_string()?.into_bytes()),
            LONG_STRING => AMQPValue::LongString(self.read_long_string()?),
            FIELD_ARRAY => AMQPValue::FieldArray(self.read_field_array()?),
            TIMESTAMP => AMQPValue::Timestamp(self.read_u64()?),
            FIELD_TABLE => AMQPValue::FieldTable(self.read_field_table()?),
            VOID => AMQPValue::Void,
            other => return Err(err(format!("unknown field value tag: {:#x}", other))),
        })
    }

    pub fn read_field_table(&mut self) -> crate::Result<FieldTable> {
        let len = self.read_u32()? as usize;
        let end = self.pos + len;
        if end > self.data.len() {
            return Err(err("field table length exceeds remaining buffer"));
        }
        let mut table = FieldTable::new();
        while self.pos < end {
            let key = self.read_short_string()?;
            let value = self.read_field_value()?;
            table.insert(key, value);
        }
        if self.pos != end {
            return Err(err("field table body size mismatch"));
        }
        Ok(table)
    }

    pub fn read_field_array(&mut self) -> crate::Result<FieldArray> {
        let len = self.read_u32()? as usize;
        let end = self.pos + len;
        if end > self.data.len() {
            return Err(err("field array length exceeds remaining buffer"));
        }
        let mut array = FieldArray::new();
        while self.pos < end {
            let value = self.read_field_value()?;
            array.push(value);
        }
        if self.pos != end {
            return Err(err("field array body size mismatch"));
        }
        Ok(array)
    }
}

/// Decodes the content-header properties, following the flags-word
/// extension scheme: a word is read, and if its bit 0
/// is set another word follows before the properties themselves.
pub fn read_properties(reader: &mut Reader) -> crate::Result<BasicProperties> {
    let mut flags = reader.read_u16()? as u32;
    let mut shift = 16;
    while flags & 1 != 0 {
        let next = reader.read_u16()?;
        flags |= (next as u32) << shift;
        shift += 16;
        if shift > 48 {
            return Err(err("content header flags extension chain too long"));
        }
    }

    let mut props = BasicProperties::new();
    if flags & (basic_properties::FLAG_CONTENT_TYPE as u32) != 0 {
        props.content_type = Some(reader.read_short_string()?);
    }
    if flags & (basic_properties::FLAG_CONTENT_ENCODING as u32) != 0 {
        props.content_encoding = Some(reader.read_short_string()?);
    }
    if flags & (basic_properties::FLAG_HEADERS as u32) != 0 {
        props.headers = Some(reader.read_field_table()?);
    }
    if flags & (basic_properties::FLAG_DELIVERY_MODE as u32) != 0 {
        props.delivery_mode = Some(reader.read_u8()?);
    }
    if flags & (basic_properties::FLAG_PRIORITY as u32) != 0 {
        props.priority = Some(reader.read_u8()?);
    }
    if flags & (basic_properties::FLAG_CORRELATION_ID as u32) != 0 {
        props.correlation_id = Some(reader.read_short_string()?);
    }
    if flags & (basic_properties::FLAG_REPLY_TO as u32) != 0 {
        props.reply_to = Some(reader.read_short_string()?);
    }
    if flags & (basic_properties::FLAG_EXPIRATION as u32) != 0 {
        props.expiration = Some(reader.read_short_string()?);
    }
    if flags & (basic_properties::FLAG_MESSAGE_ID as u32) != 0 {
        props.message_id = Some(reader.read_short_string()?);
    }
    if flags & (basic_properties::FLAG_TIMESTAMP as u32) != 0 {
        props.timestamp = Some(reader.read_u64()?);
    }
    if flags & (basic_properties::FLAG_TYPE as u32) != 0 {
        props.kind = Some(reader.read_short_string()?);
    }
    if flags & (basic_properties::FLAG_USER_ID as u32) != 0 {
        props.user_id = Some(reader.read_short_string()?);
    }
    if flags & (basic_properties::FLAG_APP_ID as u32) != 0 {
        props.app_id = Some(reader.read_short_string()?);
    }
    if flags & (basic_properties::FLAG_CLUSTER_ID as u32) != 0 {
        props.cluster_id = Some(reader.read_short_string()?);
    }
    Ok(props)
}

pub fn decode_content_header(payload: &[u8]) -> crate::Result<AMQPContentHeader> {
    let mut reader = Reader::new(payload);
    let class_id = reader.read_u16()?;
    let weight = reader.read_u16()?;
    let body_size = reader.read_u64()?;
    let properties = read_properties(&mut reader)?;
    Ok(AMQPContentHeader {
        class_id,
        weight,
        body_size,
        properties,
    })
}

pub fn decode_method(payload: &[u8]) -> crate::Result<AMQPClass> {
    let mut reader = Reader::new(payload);
    let class_id = reader.read_u16()?;
    let method_id = reader.read_u16()?;
    let class = match class_id {
        protocol::CLASS_CONNECTION => AMQPClass::Connection(decode_connection(method_id, &mut reader)?),
        protocol::CLASS_CHANNEL => AMQPClass::Channel(decode_channel(method_id, &mut reader)?),
        protocol::CLASS_ACCESS => AMQPClass::Access(decode_access(method_id, &mut reader)?),
        protocol::CLASS_EXCHANGE => AMQPClass::Exchange(decode_exchange(method_id, &mut reader)?),
        protocol::CLASS_QUEUE => AMQPClass::Queue(decode_queue(method_id, &mut reader)?),
        protocol::CLASS_BASIC => AMQPClass::Basic(decode_basic(method_id, &mut reader)?),
        protocol::CLASS_TX => AMQPClass::Tx(decode_tx(method_id, &mut reader)?),
        protocol::CLASS_CONFIRM => AMQPClass::Confirm(decode_confirm(method_id, &mut reader)?),
        other => return Err(err(format!("unknown class id: {}", other))),
    };
    Ok(class)
}

fn decode_connection(method_id: u16, r: &mut Reader) -> crate::Result<connection::Method> {
    use connection::*;
    Ok(match method_id {
        START => Method::Start(Start {
            version_major: r.read_u8()?,
            version_minor: r.read_u8()?,
            server_properties: r.read_field_table()?,
            mechanisms: String::from_utf8_lossy(&r.read_long_string()?).into_owned(),
            locales: String::from_utf8_lossy(&r.read_long_string()?).into_owned(),
        }),
        START_OK => Method::StartOk(StartOk {
            client_properties: r.read_field_table()?,
            mechanism: r.read_short_string()?,
            response: r.read_long_string()?,
            locale: r.read_short_string()?,
        }),
        SECURE => Method::Secure(Secure {
            challenge: r.read_long_string()?,
        }),
        SECURE_OK => Method::SecureOk(SecureOk {
            response: r.read_long_string()?,
        }),
        TUNE => Method::Tune(Tune {
            channel_max: r.read_u16()?,
            frame_max: r.read_u32()?,
            heartbeat: r.read_u16()?,
        }),
        TUNE_OK => Method::TuneOk(TuneOk {
            channel_max: r.read_u16()?,
            frame_max: r.read_u32()?,
            heartbeat: r.read_u16()?,
        }),
        OPEN => {
            let virtual_host = r.read_short_string()?;
            let _capabilities = r.read_short_string()?;
            let _bits = r.read_bits(1)?;
            Method::Open(Open { virtual_host })
        }
        OPEN_OK => {
            let _known_hosts = r.read_short_string()?;
            Method::OpenOk(OpenOk)
        }
        CLOSE => Method::Close(Close {
            reply_code: r.read_u16()?,
            reply_text: r.read_short_string()?,
            class_id: r.read_u16()?,
            method_id: r.read_u16()?,
        }),
        CLOSE_OK => Method::CloseOk(CloseOk),
        BLOCKED => Method::Blocked(Blocked {
            reason: r.read_short_string()?,
        }),
        UNBLOCKED => Method::Unblocked(Unblocked),
        other => return Err(err(format!("unknown connection method id: {}", other))),
    })
}

fn decode_channel(method_id: u16, r: &mut Reader) -> crate::Result<channel::Method> {
    use channel::*;
    Ok(match method_id {
        OPEN => Method::Open(Open {
            out_of_band: r.read_short_string()?,
        }),
        OPEN_OK => {
            let _reserved = r.read_long_string()?;
            Method::OpenOk(OpenOk)
        }
        FLOW => Method::Flow(Flow {
            active: r.read_bits(1)?[0],
        }),
        FLOW_OK => Method::FlowOk(FlowOk {
            active: r.read_bits(1)?[0],
        }),
        CLOSE => Method::Close(Close {
            reply_code: r.read_u16()?,
            reply_text: r.read_short_string()?,
            class_id: r.read_u16()?,
            method_id: r.read_u16()?,
        }),
        CLOSE_OK => Method::CloseOk(CloseOk),
        other => return Err(err(format!("unknown channel method id: {}", other))),
    })
}

fn decode_access(method_id: u16, r: &mut Reader) -> crate::Result<access::Method> {
    use access::*;
    Ok(match method_id {
        REQUEST => {
            let realm = r.read_short_string()?;
            let bits = r.read_bits(5)?;
            Method::Request(Request {
                realm,
                exclusive: bits[0],
                passive: bits[1],
                active: bits[2],
                write: bits[3],
                read: bits[4],
            })
        }
        REQUEST_OK => Method::RequestOk(RequestOk {
            ticket: r.read_u16()?,
        }),
        other => return Err(err(format!("unknown access method id: {}", other))),
    })
}

fn decode_exchange(method_id: u16, r: &mut Reader) -> crate::Result<exchange::Method> {
    use exchange::*;
    Ok(match method_id {
        DECLARE => {
            let _ticket = r.read_u16()?;
            let exchange = r.read_short_string()?;
            let kind = r.read_short_string()?;
            let bits = r.read_bits(5)?;
            Method::Declare(Declare {
                exchange,
                kind,
                passive: bits[0],
                durable: bits[1],
                auto_delete: bits[2],
                internal: bits[3],
                nowait: bits[4],
                arguments: r.read_field_table()?,
            })
        }
        DECLARE_OK => Method::DeclareOk(DeclareOk),
        DELETE => {
            let _ticket = r.read_u16()?;
            let exchange = r.read_short_string()?;
            let bits = r.read_bits(2)?;
            Method::Delete(Delete {
                exchange,
                if_unused: bits[0],
                nowait: bits[1],
            })
        }
        DELETE_OK => Method::DeleteOk(DeleteOk),
        BIND => {
            let _ticket = r.read_u16()?;
            let destination = r.read_short_string()?;
            let source = r.read_short_string()?;
            let routing_key = r.read_short_string()?;
            let bits = r.read_bits(1)?;
            Method::Bind(Bind {
                destination,
                source,
                routing_key,
                nowait: bits[0],
                arguments: r.read_field_table()?,
            })
        }
        BIND_OK => Method::BindOk(BindOk),
        UNBIND => {
            let _ticket = r.read_u16()?;
            let destination = r.read_short_string()?;
            let source = r.read_short_string()?;
            let routing_key = r.read_short_string()?;
            let bits = r.read_bits(1)?;
            Method::Unbind(Unbind {
                destination,
                source,
                routing_key,
                nowait: bits[0],
                arguments: r.read_field_table()?,
            })
        }
        UNBIND_OK => Method::UnbindOk(UnbindOk),
        other => return Err(err(format!("unknown exchange method id: {}", other))),
    })
}

fn decode_queue(method_id: u16, r: &mut Reader) -> crate::Result<queue::Method> {
    use queue::*;
    Ok(match method_id {
        DECLARE => {
            let _ticket = r.read_u16()?;
            let queue = r.read_short_string()?;
            let bits = r.read_bits(5)?;
            Method::Declare(Declare {
                queue,
                passive: bits[0],
                durable: bits[1],
                exclusive: bits[2],
                auto_delete: bits[3],
                nowait: bits[4],
                arguments: r.read_field_table()?,
            })
        }
        DECLARE_OK => Method::DeclareOk(DeclareOk {
            queue: r.read_short_string()?,
            message_count: r.read_u32()?,
            consumer_count: r.read_u32()?,
        }),
        BIND => {
            let _ticket = r.read_u16()?;
            let queue = r.read_short_string()?;
            let exchange = r.read_short_string()?;
            let routing_key = r.read_short_string()?;
            let bits = r.read_bits(1)?;
            Method::Bind(Bind {
                queue,
                exchange,
                routing_key,
                nowait: bits[0],
                arguments: r.read_field_table()?,
            })
        }
        BIND_OK => Method::BindOk(BindOk),
        PURGE => {
            let _ticket = r.read_u16()?;
            let queue = r.read_short_string()?;
            let bits = r.read_bits(1)?;
            Method::Purge(Purge {
                queue,
                nowait: bits[0],
            })
        }
        PURGE_OK => Method::PurgeOk(PurgeOk {
            message_count: r.read_u32()?,
        }),
        DELETE => {
            let _ticket = r.read_u16()?;
            let queue = r.read_short_string()?;
            let bits = r.read_bits(3)?;
            Method::Delete(Delete {
                queue,
                if_unused: bits[0],
                if_empty: bits[1],
                nowait: bits[2],
            })
        }
        DELETE_OK => Method::DeleteOk(DeleteOk {
            message_count: r.read_u32()?,
        }),
        UNBIND => {
            let _ticket = r.read_u16()?;
            let queue = r.read_short_string()?;
            let exchange = r.read_short_string()?;
            let routing_key = r.read_short_string()?;
            Method::Unbind(Unbind {
                queue,
                exchange,
                routing_key,
                arguments: r.read_field_table()?,
            })
        }
        UNBIND_OK => Method::UnbindOk(UnbindOk),
        other => return Err(err(format!("unknown queue method id: {}", other))),
    })
}

fn decode_basic(method_id: u16, r: &mut Reader) -> crate::Result<basic::Method> {
    use basic::*;
    Ok(match method_id {
        QOS => {
            let prefetch_size = r.read_u32()?;
            let prefetch_count = r.read_u16()?;
            let bits = r.read_bits(1)?;
            Method::Qos(Qos {
                prefetch_size,
                prefetch_count,
                global: bits[0],
            })
        }
        QOS_OK => Method::QosOk(QosOk),
        CONSUME => {
            let _ticket = r.read_u16()?;
            let queue = r.read_short_string()?;
            let consumer_tag = r.read_short_string()?;
            let bits = r.read_bits(4)?;
            Method::Consume(Consume {
                queue,
                consumer_tag,
                no_local: bits[0],
                no_ack: bits[1],
                exclusive: bits[2],
                nowait: bits[3],
                arguments: r.read_field_table()?,
            })
        }
        CONSUME_OK => Method::ConsumeOk(ConsumeOk {
            consumer_tag: r.read_short_string()?,
        }),
        CANCEL => {
            let consumer_tag = r.read_short_string()?;
            let bits = r.read_bits(1)?;
            Method::Cancel(Cancel {
                consumer_tag,
                nowait: bits[0],
            })
        }
        CANCEL_OK => Method::CancelOk(CancelOk {
            consumer_tag: r.read_short_string()?,
        }),
        PUBLISH => {
            let _ticket = r.read_u16()?;
            let exchange = r.read_short_string()?;
            let routing_key = r.read_short_string()?;
            let bits = r.read_bits(2)?;
            Method::Publish(Publish {
                exchange,
                routing_key,
                mandatory: bits[0],
                immediate: bits[1],
            })
        }
        RETURN => Method::Return(Return {
            reply_code: r.read_u16()?,
            reply_text: r.read_short_string()?,
            exchange: r.read_short_string()?,
            routing_key: r.read_short_string()?,
        }),
        DELIVER => {
            let consumer_tag = r.read_short_string()?;
            let delivery_tag = r.read_u64()?;
            let bits = r.read_bits(1)?;
            Method::Deliver(Deliver {
                consumer_tag,
                delivery_tag,
                redelivered: bits[0],
                exchange: r.read_short_string()?,
                routing_key: r.read_short_string()?,
            })
        }
        GET => {
            let _ticket = r.read_u16()?;
            let queue = r.read_short_string()?;
            let bits = r.read_bits(1)?;
            Method::Get(Get {
                queue,
                no_ack: bits[0],
            })
        }
        GET_OK => {
            let delivery_tag = r.read_u64()?;
            let bits = r.read_bits(1)?;
            Method::GetOk(GetOk {
                delivery_tag,
                redelivered: bits[0],
                exchange: r.read_short_string()?,
                routing_key: r.read_short_string()?,
                message_count: r.read_u32()?,
            })
        }
        GET_EMPTY => {
            let _reserved = r.read_short_string()?;
            Method::GetEmpty(GetEmpty)
        }
        ACK => {
            let delivery_tag = r.read_u64()?;
            let bits = r.read_bits(1)?;
            Method::Ack(Ack {
                delivery_tag,
                multiple: bits[0],
            })
        }
        REJECT => {
            let delivery_tag = r.read_u64()?;
            let bits = r.read_bits(1)?;
            Method::Reject(Reject {
                delivery_tag,
                requeue: bits[0],
            })
        }
        RECOVER_ASYNC => Method::RecoverAsync(RecoverAsync {
            requeue: r.read_bits(1)?[0],
        }),
        RECOVER => Method::Recover(Recover {
            requeue: r.read_bits(1)?[0],
        }),
        RECOVER_OK => Method::RecoverOk(RecoverOk),
        NACK => {
            let delivery_tag = r.read_u64()?;
            let bits = r.read_bits(2)?;
            Method::Nack(Nack {
                delivery_tag,
                multiple: bits[0],
                requeue: bits[1],
            })
        }
        other => return Err(err(format!("unknown basic method id: {}", other))),
    })
}

fn decode_tx(method_id: u16, _r: &mut Reader) -> crate::Result<tx::Method> {
    use tx::*;
    Ok(match method_id {
        SELECT => Method::Select(Select),
        SELECT_OK => Method::SelectOk(SelectOk),
        COMMIT => Method::Commit(Commit),
        COMMIT_OK => Method::CommitOk(CommitOk),
        ROLLBACK => Method::Rollback(Rollback),
        ROLLBACK_OK => Method::RollbackOk(RollbackOk),
        other => return Err(err(format!("unknown tx method id: {}", other))),
    })
}

fn decode_confirm(method_id: u16, r: &mut Reader) -> crate::Result<confirm::Method> {
    use confirm::*;
    Ok(match method_id {
        SELECT => Method::Select(Select {
            nowait: r.read_bits(1)?[0],
        }),
        SELECT_OK => Method::SelectOk(SelectOk),
        other => return Err(err(format!("unknown confirm method id: {}", other))),
    })
}

/// Decodes one complete wire frame starting at the front of `data`.
///
/// Returns `Ok(None)` rather than erroring when `data` holds fewer bytes
/// than a full frame, so the caller (the frame assembler, C2) can
/// distinguish "not enough data yet" from a genuine decode failure.
pub fn decode_frame(data: &[u8]) -> crate::Result<Option<(usize, AMQPFrame)>> {
    if data.len() >= PROTOCOL_HEADER.len() && data.starts_with(b"AMQP") {
        // Only ever seen server-side in this crate's tests; real brokers
        // never send the header back, but decoding it cleanly (instead of
        // erroring) keeps loopback tests simple.
    }

    if data.len() < 7 {
        return Ok(None);
    }
    let frame_type = match AMQPFrameType::from_wire(data[0]) {
        Some(t) => t,
        None => return Err(err(format!("unknown frame type: {}", data[0]))),
    };
    let channel_id = u16::from_be_bytes([data[1], data[2]]);
    let length = u32::from_be_bytes([data[3], data[4], data[5], data[6]]) as usize;
    let total_len = 7 + length + 1;
    if data.len() < total_len {
        return Ok(None);
    }
    let payload = &data[7..7 + length];
    if data[7 + length] != FRAME_END {
        return Err(crate::Error::BadEndMarker);
    }

    let frame = match frame_type {
        AMQPFrameType::Method => AMQPFrame::Method(channel_id, decode_method(payload)?),
        AMQPFrameType::Header => {
            let header = decode_content_header(payload)?;
            AMQPFrame::Header(channel_id, header.class_id, Box::new(header))
        }
        AMQPFrameType::Body => AMQPFrame::Body(channel_id, payload.to_vec()),
        AMQPFrameType::Heartbeat => AMQPFrame::Heartbeat,
    };
    Ok(Some((total_len, frame)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_heartbeat() {
        let bytes = [8u8, 0, 0, 0, 0, 0, 0, 0xCE];
        let (consumed, frame) = decode_frame(&bytes).unwrap().unwrap();
        assert_eq!(consumed, bytes.len());
        assert_eq!(frame, AMQPFrame::Heartbeat);
    }

    #[test]
    fn decode_incomplete_frame_returns_none() {
        let bytes = [1u8, 0, 0, 0, 0, 0, 10];
        assert!(decode_frame(&bytes).unwrap().is_none());
    }

    #[test]
    fn decode_bad_end_marker_errors() {
        let bytes = [8u8, 0, 0, 0, 0, 0, 0, 0x00];
        assert!(matches!(
            decode_frame(&bytes),
            Err(crate::Error::BadEndMarker)
        ));
    }
}
