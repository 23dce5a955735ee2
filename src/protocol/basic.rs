use super::MethodId;
use crate::basic_properties::BasicProperties;
use crate::types::{LongLongUInt, LongUInt, ShortString};

pub const QOS: u16 = 10;
pub const QOS_OK: u16 = 11;
pub const CONSUME: u16 = 20;
pub const CONSUME_OK: u16 = 21;
pub const CANCEL: u16 = 30;
pub const CANCEL_OK: u16 = 31;
pub const PUBLISH: u16 = 40;
pub const RETURN: u16 = 50;
pub const DELIVER: u16 = 60;
pub const GET: u16 = 70;
pub const GET_OK: u16 = 71;
pub const GET_EMPTY: u16 = 72;
pub const ACK: u16 = 80;
pub const REJECT: u16 = 90;
pub const RECOVER_ASYNC: u16 = 100;
pub const RECOVER: u16 = 110;
pub const RECOVER_OK: u16 = 111;
pub const NACK: u16 = 120;

#[derive(Clone, Debug, PartialEq)]
pub enum Method {
    Qos(Qos),
    QosOk(QosOk),
    Consume(Consume),
    ConsumeOk(ConsumeOk),
    Cancel(Cancel),
    CancelOk(CancelOk),
    Publish(Publish),
    Return(Return),
    Deliver(Deliver),
    Get(Get),
    GetOk(GetOk),
    GetEmpty(GetEmpty),
    Ack(Ack),
    Reject(Reject),
    RecoverAsync(RecoverAsync),
    Recover(Recover),
    RecoverOk(RecoverOk),
    Nack(Nack),
}

impl MethodId for Method {
    fn method_id(&self) -> u16 {
        match self {
            Method::Qos(_) => QOS,
            Method::QosOk(_) => QOS_OK,
            Method::Consume(_) => CONSUME,
            Method::ConsumeOk(_) => CONSUME_OK,
            Method::Cancel(_) => CANCEL,
            Method::CancelOk(_) => CANCEL_OK,
            Method::Publish(_) => PUBLISH,
            Method::Return(_) => RETURN,
            Method::Deliver(_) => DELIVER,
            Method::Get(_) => GET,
            Method::GetOk(_) => GET_OK,
            Method::GetEmpty(_) => GET_EMPTY,
            Method::Ack(_) => ACK,
            Method::Reject(_) => REJECT,
            Method::RecoverAsync(_) => RECOVER_ASYNC,
            Method::Recover(_) => RECOVER,
            Method::RecoverOk(_) => RECOVER_OK,
            Method::Nack(_) => NACK,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Qos {
    pub prefetch_size: LongUInt,
    pub prefetch_count: u16,
    pub global: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct QosOk;

#[derive(Clone, Debug, PartialEq)]
pub struct Consume {
    pub queue: ShortString,
    pub consumer_tag: ShortString,
    pub no_local: bool,
    pub no_ack: bool,
    pub exclusive: bool,
    pub nowait: bool,
    pub arguments: crate::types::FieldTable,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConsumeOk {
    pub consumer_tag: ShortString,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Cancel {
    pub consumer_tag: ShortString,
    pub nowait: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CancelOk {
    pub consumer_tag: ShortString,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Publish {
    pub exchange: ShortString,
    pub routing_key: ShortString,
    pub mandatory: bool,
    pub immediate: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Return {
    pub reply_code: u16,
    pub reply_text: ShortString,
    pub exchange: ShortString,
    pub routing_key: ShortString,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Deliver {
    pub consumer_tag: ShortString,
    pub delivery_tag: LongLongUInt,
    pub redelivered: bool,
    pub exchange: ShortString,
    pub routing_key: ShortString,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Get {
    pub queue: ShortString,
    pub no_ack: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GetOk {
    pub delivery_tag: LongLongUInt,
    pub redelivered: bool,
    pub exchange: ShortString,
    pub routing_key: ShortString,
    pub message_count: LongUInt,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GetEmpty;

#[derive(Clone, Debug, PartialEq)]
pub struct Ack {
    pub delivery_tag: LongLongUInt,
    pub multiple: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Reject {
    pub delivery_tag: LongLongUInt,
    pub requeue: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecoverAsync {
    pub requeue: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Recover {
    pub requeue: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecoverOk;

#[derive(Clone, Debug, PartialEq)]
pub struct Nack {
    pub delivery_tag: LongLongUInt,
    pub multiple: bool,
    pub requeue: bool,
}

/// Content carried alongside `basic.publish`/`basic.deliver`/`basic.return`/
/// `basic.get-ok`: not a method argument but the pair of frames the channel
/// engine's content assembler stitches together.
#[derive(Clone, Debug, PartialEq)]
pub struct Content {
    pub properties: BasicProperties,
    pub body: Vec<u8>,
}
