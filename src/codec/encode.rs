//! Encoding half of the frame codec (C1).
//!
//! Mirrors `decode.rs`'s cursor: a plain `Vec<u8>` sink with primitive
//! writers, built up the way `fbs-amqp/src/buffer.rs` builds its reader,
//! generalized to the full value/table/array grammar and closed method
//! catalog.

use crate::basic_properties::{self, BasicProperties};
use crate::frame::{AMQPContentHeader, AMQPFrame, FRAME_END};
use crate::protocol::{access, basic, channel, confirm, connection, exchange, queue, tx, AMQPClass};
use crate::types::{AMQPValue, Decimal, FieldArray, FieldTable};

#[derive(Debug, Default)]
pub struct Writer(Vec<u8>);

impl Writer {
    pub fn new() -> Self {
        Writer(Vec::new())
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn write_u8(&mut self, v: u8) {
        self.0.push(v);
    }

    pub fn write_bool(&mut self, v: bool) {
        self.write_u8(v as u8);
    }

    pub fn write_i8(&mut self, v: i8) {
        self.write_u8(v as u8);
    }

    pub fn write_u16(&mut self, v: u16) {
        self.0.extend_from_slice(&v.to_be_bytes());
    }

    pub fn write_i16(&mut self, v: i16) {
        self.write_u16(v as u16);
    }

    pub fn write_u32(&mut self, v: u32) {
        self.0.extend_from_slice(&v.to_be_bytes());
    }

    pub fn write_i32(&mut self, v: i32) {
        self.write_u32(v as u32);
    }

    pub fn write_u64(&mut self, v: u64) {
        self.0.extend_from_slice(&v.to_be_bytes());
    }

    pub fn write_i64(&mut self, v: i64) {
        self.write_u64(v as u64);
    }

    pub fn write_f32(&mut self, v: f32) {
        self.write_u32(v.to_bits());
    }

    pub fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    pub fn write_short_string(&mut self, s: &str) {
        debug_assert!(s.len() <= u8::MAX as usize, "short string over 255 bytes");
        self.write_u8(s.len() as u8);
        self.0.extend_from_slice(s.as_bytes());
    }

    pub fn write_long_string(&mut self, bytes: &[u8]) {
        self.write_u32(bytes.len() as u32);
        self.0.extend_from_slice(bytes);
    }

    pub fn write_decimal(&mut self, d: &Decimal) {
        self.write_u8(d.scale);
        self.write_i32(d.value);
    }

    /// Packs `bits` LSB-first into as few bytes as needed, mirroring
    /// `Reader::read_bits`.
    pub fn write_bits(&mut self, bits: &[bool]) {
        for chunk in bits.chunks(8) {
            let mut byte = 0u8;
            for (i, b) in chunk.iter().enumerate() {
                if *b {
                    byte |= 1 << i;
                }
            }
            self.write_u8(byte);
        }
    }

    pub fn write_field_value(&mut self, value: &AMQPValue) {
        self.write_u8(value.get_type());
        match value {
            AMQPValue::Boolean(b) => self.write_bool(*b),
            AMQPValue::ShortShortInt(v) => self.write_i8(*v),
            AMQPValue::ShortShortUInt(v) => self.write_u8(*v),
            AMQPValue::ShortInt(v) => self.write_i16(*v),
            AMQPValue::ShortUInt(v) => self.write_u16(*v),
            AMQPValue::LongInt(v) => self.write_i32(*v),
            AMQPValue::LongUInt(v) => self.write_u32(*v),
            AMQPValue::LongLongInt(v) => self.write_i64(*v),
            AMQPValue::LongLongUInt(v) => self.write_u64(*v),
            AMQPValue::Float(v) => self.write_f32(*v),
            AMQPValue::Double(v) => self.write_f64(*v),
            AMQPValue::Decimal(d) => self.write_decimal(d),
            AMQPValue::ShortString(s) => self.write_long_string(s.as_bytes()),
            AMQPValue::LongString(s) => self.write_long_string(s),
            AMQPValue::FieldArray(a) => self.write_field_array(a),
            AMQPValue::Timestamp(v) => self.write_u64(*v),
            AMQPValue::FieldTable(t) => self.write_field_table(t),
            AMQPValue::Void => {}
        }
    }

    pub fn write_field_table(&mut self, table: &FieldTable) {
        let mut body = Writer::new();
        for (key, value) in table {
            body.write_short_string(key);
            body.write_field_value(value);
        }
        let bytes = body.into_bytes();
        self.write_u32(bytes.len() as u32);
        self.0.extend_from_slice(&bytes);
    }

    pub fn write_field_array(&mut self, array: &FieldArray) {
        let mut body = Writer::new();
        for value in array.iter() {
            body.write_field_value(value);
        }
        let bytes = body.into_bytes();
        self.write_u32(bytes.len() as u32);
        self.0.extend_from_slice(&bytes);
    }
}

/// Writes the content-header properties and returns the number of bytes
/// written, following the same single-word flags layout `decode::read_properties`
/// accepts (this crate never needs the extension bit on encode: `basic`'s
/// fourteen properties all fit in one 16-bit word).
pub fn write_properties(w: &mut Writer, props: &BasicProperties) {
    w.write_u16(props.flags());
    if let Some(v) = &props.content_type {
        w.write_short_string(v);
    }
    if let Some(v) = &props.content_encoding {
        w.write_short_string(v);
    }
    if let Some(v) = &props.headers {
        w.write_field_table(v);
    }
    if let Some(v) = props.delivery_mode {
        w.write_u8(v);
    }
    if let Some(v) = props.priority {
        w.write_u8(v);
    }
    if let Some(v) = &props.correlation_id {
        w.write_short_string(v);
    }
    if let Some(v) = &props.reply_to {
        w.write_short_string(v);
    }
    if let Some(v) = &props.expiration {
        w.write_short_string(v);
    }
    if let Some(v) = &props.message_id {
        w.write_short_string(v);
    }
    if let Some(v) = props.timestamp {
        w.write_u64(v);
    }
    if let Some(v) = &props.kind {
        w.write_short_string(v);
    }
    if let Some(v) = &props.user_id {
        w.write_short_string(v);
    }
    if let Some(v) = &props.app_id {
        w.write_short_string(v);
    }
    if let Some(v) = &props.cluster_id {
        w.write_short_string(v);
    }
    let _ = basic_properties::FLAG_EXTENSION;
}

pub fn encode_content_header(header: &AMQPContentHeader) -> Vec<u8> {
    let mut w = Writer::new();
    w.write_u16(header.class_id);
    w.write_u16(header.weight);
    w.write_u64(header.body_size);
    write_properties(&mut w, &header.properties);
    w.into_bytes()
}

pub fn encode_method(class: &AMQPClass) -> Vec<u8> {
    let mut w = Writer::new();
    w.write_u16(class.class_id());
    w.write_u16(class.method_id());
    match class {
        AMQPClass::Connection(m) => encode_connection(m, &mut w),
        AMQPClass::Channel(m) => encode_channel(m, &mut w),
        AMQPClass::Access(m) => encode_access(m, &mut w),
        AMQPClass::Exchange(m) => encode_exchange(m, &mut w),
        AMQPClass::Queue(m) => encode_queue(m, &mut w),
        AMQPClass::Basic(m) => encode_basic(m, &mut w),
        AMQPClass::Tx(m) => encode_tx(m, &mut w),
        AMQPClass::Confirm(m) => encode_confirm(m, &mut w),
    }
    w.into_bytes()
}

fn encode_connection(m: &connection::Method, w: &mut Writer) {
    use connection::Method::*;
    match m {
        Start(s) => {
            w.write_u8(s.version_major);
            w.write_u8(s.version_minor);
            w.write_field_table(&s.server_properties);
            w.write_long_string(s.mechanisms.as_bytes());
            w.write_long_string(s.locales.as_bytes());
        }
        StartOk(s) => {
            w.write_field_table(&s.client_properties);
            w.write_short_string(&s.mechanism);
            w.write_long_string(&s.response);
            w.write_short_string(&s.locale);
        }
        Secure(s) => w.write_long_string(&s.challenge),
        SecureOk(s) => w.write_long_string(&s.response),
        Tune(t) => {
            w.write_u16(t.channel_max);
            w.write_u32(t.frame_max);
            w.write_u16(t.heartbeat);
        }
        TuneOk(t) => {
            w.write_u16(t.channel_max);
            w.write_u32(t.frame_max);
            w.write_u16(t.heartbeat);
        }
        Open(o) => {
            w.write_short_string(&o.virtual_host);
            w.write_short_string("");
            w.write_bits(&[false]);
        }
        OpenOk(_) => w.write_short_string(""),
        Close(c) => {
            w.write_u16(c.reply_code);
            w.write_short_string(&c.reply_text);
            w.write_u16(c.class_id);
            w.write_u16(c.method_id);
        }
        CloseOk(_) => {}
        Blocked(b) => w.write_short_string(&b.reason),
        Unblocked(_) => {}
    }
}

fn encode_channel(m: &channel::Method, w: &mut Writer) {
    use channel::Method::*;
    match m {
        Open(o) => w.write_short_string(&o.out_of_band),
        OpenOk(_) => w.write_long_string(&[]),
        Flow(f) => w.write_bits(&[f.active]),
        FlowOk(f) => w.write_bits(&[f.active]),
        Close(c) => {
            w.write_u16(c.reply_code);
            w.write_short_string(&c.reply_text);
            w.write_u16(c.class_id);
            w.write_u16(c.method_id);
        }
        CloseOk(_) => {}
    }
}

fn encode_access(m: &access::Method, w: &mut Writer) {
    use access::Method::*;
    match m {
        Request(r) => {
            w.write_short_string(&r.realm);
            w.write_bits(&[r.exclusive, r.passive, r.active, r.write, r.read]);
        }
        RequestOk(r) => w.write_u16(r.ticket),
    }
}

fn encode_exchange(m: &exchange::Method, w: &mut Writer) {
    use exchange::Method::*;
    match m {
        Declare(d) => {
            w.write_u16(0);
            w.write_short_string(&d.exchange);
            w.write_short_string(&d.kind);
            w.write_bits(&[d.passive, d.durable, d.auto_delete, d.internal, d.nowait]);
            w.write_field_table(&d.arguments);
        }
        DeclareOk(_) => {}
        Delete(d) => {
            w.write_u16(0);
            w.write_short_string(&d.exchange);
            w.write_bits(&[d.if_unused, d.nowait]);
        }
        DeleteOk(_) => {}
        Bind(b) => {
            w.write_u16(0);
            w.write_short_string(&b.destination);
            w.write_short_string(&b.source);
            w.write_short_string(&b.routing_key);
            w.write_bits(&[b.nowait]);
            w.write_field_table(&b.arguments);
        }
        BindOk(_) => {}
        Unbind(u) => {
            w.write_u16(0);
            w.write_short_string(&u.destination);
            w.write_short_string(&u.source);
            w.write_short_string(&u.routing_key);
            w.write_bits(&[u.nowait]);
            w.write_field_table(&u.arguments);
        }
        UnbindOk(_) => {}
    }
}

fn encode_queue(m: &queue::Method, w: &mut Writer) {
    use queue::Method::*;
    match m {
        Declare(d) => {
            w.write_u16(0);
            w.write_short_string(&d.queue);
            w.write_bits(&[d.passive, d.durable, d.exclusive, d.auto_delete, d.nowait]);
            w.write_field_table(&d.arguments);
        }
        DeclareOk(d) => {
            w.write_short_string(&d.queue);
            w.write_u32(d.message_count);
            w.write_u32(d.consumer_count);
        }
        Bind(b) => {
            w.write_u16(0);
            w.write_short_string(&b.queue);
            w.write_short_string(&b.exchange);
            w.write_short_string(&b.routing_key);
            w.write_bits(&[b.nowait]);
            w.write_field_table(&b.arguments);
        }
        BindOk(_) => {}
        Purge(p) => {
            w.write_u16(0);
            w.write_short_string(&p.queue);
            w.write_bits(&[p.nowait]);
        }
        PurgeOk(p) => w.write_u32(p.message_count),
        Delete(d) => {
            w.write_u16(0);
            w.write_short_string(&d.queue);
            w.write_bits(&[d.if_unused, d.if_empty, d.nowait]);
        }
        DeleteOk(d) => w.write_u32(d.message_count),
        Unbind(u) => {
            w.write_u16(0);
            w.write_short_string(&u.queue);
            w.write_short_string(&u.exchange);
            w.write_short_string(&u.routing_key);
            w.write_field_table(&u.arguments);
        }
        UnbindOk(_) => {}
    }
}

fn encode_basic(m: &basic::Method, w: &mut Writer) {
    use basic::Method::*;
    match m {
        Qos(q) => {
            w.write_u32(q.prefetch_size);
            w.write_u16(q.prefetch_count);
            w.write_bits(&[q.global]);
        }
        QosOk(_) => {}
        Consume(c) => {
            w.write_u16(0);
            w.write_short_string(&c.queue);
            w.write_short_string(&c.consumer_tag);
            w.write_bits(&[c.no_local, c.no_ack, c.exclusive, c.nowait]);
            w.write_field_table(&c.arguments);
        }
        ConsumeOk(c) => w.write_short_string(&c.consumer_tag),
        Cancel(c) => {
            w.write_short_string(&c.consumer_tag);
            w.write_bits(&[c.nowait]);
        }
        CancelOk(c) => w.write_short_string(&c.consumer_tag),
        Publish(p) => {
            w.write_u16(0);
            w.write_short_string(&p.exchange);
            w.write_short_string(&p.routing_key);
            w.write_bits(&[p.mandatory, p.immediate]);
        }
        Return(r) => {
            w.write_u16(r.reply_code);
            w.write_short_string(&r.reply_text);
            w.write_short_string(&r.exchange);
            w.write_short_string(&r.routing_key);
        }
        Deliver(d) => {
            w.write_short_string(&d.consumer_tag);
            w.write_u64(d.delivery_tag);
            w.write_bits(&[d.redelivered]);
            w.write_short_string(&d.exchange);
            w.write_short_string(&d.routing_key);
        }
        Get(g) => {
            w.write_u16(0);
            w.write_short_string(&g.queue);
            w.write_bits(&[g.no_ack]);
        }
        GetOk(g) => {
            w.write_u64(g.delivery_tag);
            w.write_bits(&[g.redelivered]);
            w.write_short_string(&g.exchange);
            w.write_short_string(&g.routing_key);
            w.write_u32(g.message_count);
        }
        GetEmpty(_) => w.write_short_string(""),
        Ack(a) => {
            w.write_u64(a.delivery_tag);
            w.write_bits(&[a.multiple]);
        }
        Reject(r) => {
            w.write_u64(r.delivery_tag);
            w.write_bits(&[r.requeue]);
        }
        RecoverAsync(r) => w.write_bits(&[r.requeue]),
        Recover(r) => w.write_bits(&[r.requeue]),
        RecoverOk(_) => {}
        Nack(n) => {
            w.write_u64(n.delivery_tag);
            w.write_bits(&[n.multiple, n.requeue]);
        }
    }
}

fn encode_tx(m: &tx::Method, _w: &mut Writer) {
    use tx::Method::*;
    match m {
        Select(_) | SelectOk(_) | Commit(_) | CommitOk(_) | Rollback(_) | RollbackOk(_) => {}
    }
}

fn encode_confirm(m: &confirm::Method, w: &mut Writer) {
    use confirm::Method::*;
    match m {
        Select(s) => w.write_bits(&[s.nowait]),
        SelectOk(_) => {}
    }
}

fn wrap_frame(frame_type: u8, channel_id: u16, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(7 + payload.len() + 1);
    out.push(frame_type);
    out.extend_from_slice(&channel_id.to_be_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(payload);
    out.push(FRAME_END);
    out
}

/// Serializes a single logical frame to its on-wire bytes.
///
/// Body frames are written whole; splitting an outgoing message body into
/// frame-max-sized chunks is the channel engine's job, since only it knows the negotiated `frame_max`.
pub fn encode_frame(frame: &AMQPFrame) -> Vec<u8> {
    match frame {
        AMQPFrame::Method(channel_id, class) => {
            wrap_frame(crate::frame::TYPE_METHOD, *channel_id, &encode_method(class))
        }
        AMQPFrame::Header(channel_id, _, header) => wrap_frame(
            crate::frame::TYPE_HEADER,
            *channel_id,
            &encode_content_header(header),
        ),
        AMQPFrame::Body(channel_id, body) => {
            wrap_frame(crate::frame::TYPE_BODY, *channel_id, body)
        }
        AMQPFrame::Heartbeat => wrap_frame(crate::frame::TYPE_HEARTBEAT, 0, &[]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode::decode_frame;

    #[test]
    fn heartbeat_round_trips() {
        let bytes = encode_frame(&AMQPFrame::Heartbeat);
        let (consumed, frame) = decode_frame(&bytes).unwrap().unwrap();
        assert_eq!(consumed, bytes.len());
        assert_eq!(frame, AMQPFrame::Heartbeat);
    }

    #[test]
    fn connection_open_round_trips() {
        let class = AMQPClass::Connection(connection::Method::Open(connection::Open {
            virtual_host: "/".to_string(),
        }));
        let frame = AMQPFrame::Method(0, class.clone());
        let bytes = encode_frame(&frame);
        let (_, decoded) = decode_frame(&bytes).unwrap().unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn field_table_round_trips() {
        let mut table = FieldTable::new();
        table.insert("answer".to_string(), AMQPValue::LongInt(42));
        table.insert("ok".to_string(), AMQPValue::Boolean(true));
        let mut w = Writer::new();
        w.write_field_table(&table);
        let bytes = w.into_bytes();
        let mut r = crate::codec::decode::Reader::new(&bytes);
        let decoded = r.read_field_table().unwrap();
        assert_eq!(decoded, table);
    }
}
