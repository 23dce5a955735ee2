//! C4: the channel engine.
//!
//! Grounded on lapin's `Channel` (`src/channel.rs`): a cheap `Clone`
//! facade over `Arc`-shared state (`status`, `acknowledgements`, ...) so a
//! temporarily-dropped handle never ends the underlying session. The
//! difference from lapin is the request-ordering mechanism: instead
//! of `Frames`/`ExpectedReply` tied to a `Promise`/`PromiseResolver` pair,
//! this crate routes every synchronous request through `requests::RequestQueue`,
//! a single generic `PendingRequest<Deferred<AMQPClass>>` queue (see that
//! module's doc comment for why).

pub mod acknowledgements;
pub mod consumers;
pub mod content_assembler;
pub mod exchange_kind;
pub mod options;
pub mod queue;
pub mod requests;
pub mod status;

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::basic_properties::BasicProperties;
use crate::config::Configuration;
use crate::deferred::Deferred;
use crate::error::{AMQPError, Error};
use crate::frame::{AMQPContentHeader, AMQPFrame};
use crate::message::{BasicGetMessage, BasicReturnMessage, Confirmation, Delivery};
use crate::protocol::{access, basic, channel, confirm, exchange, queue as amqp_queue, tx, AMQPClass};
use crate::types::FieldTable;
use crate::Result;

pub use exchange_kind::ExchangeKind;
pub use options::{
    BasicConsumeOptions, BasicGetOptions, BasicPublishOptions, BasicQosOptions, ExchangeBindOptions,
    ExchangeDeclareOptions, ExchangeDeleteOptions, ExchangeUnbindOptions, QueueBindOptions, QueueDeclareOptions,
    QueueDeleteOptions, QueuePurgeOptions, QueueUnbindOptions,
};
pub use queue::Queue;

use self::acknowledgements::Acknowledgements;
use self::consumers::ConsumerRegistry;
use self::content_assembler::{AssembledContent, ContentAssembler, PendingMethod};
pub use self::requests::FrameSink;
use self::requests::{PendingRequest, RequestQueue};
pub use self::status::ChannelState;
use self::status::ChannelStatus;

type ReturnCallback = Box<dyn FnMut(BasicReturnMessage) + Send>;

/// A lightweight, independently addressed session multiplexed over one
/// connection. Every clone shares the same underlying state.
#[derive(Clone)]
pub struct Channel {
    id: u16,
    configuration: Configuration,
    status: ChannelStatus,
    acknowledgements: Arc<Mutex<Acknowledgements>>,
    consumers: Arc<Mutex<ConsumerRegistry>>,
    content_assembler: Arc<Mutex<ContentAssembler>>,
    requests: Arc<Mutex<RequestQueue>>,
    returned: Arc<Mutex<Option<ReturnCallback>>>,
    pending_get: Arc<Mutex<Option<Deferred<Option<BasicGetMessage>>>>>,
    transactional: Arc<Mutex<bool>>,
    sink: Arc<dyn FrameSink>,
}

impl PartialEq for Channel {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("id", &self.id)
            .field("status", &self.status.get())
            .finish()
    }
}

impl Channel {
    pub(crate) fn new(id: u16, configuration: Configuration, sink: Arc<dyn FrameSink>) -> Channel {
        Channel {
            id,
            configuration,
            status: ChannelStatus::new(),
            acknowledgements: Arc::new(Mutex::new(Acknowledgements::new())),
            consumers: Arc::new(Mutex::new(ConsumerRegistry::new())),
            content_assembler: Arc::new(Mutex::new(ContentAssembler::new())),
            requests: Arc::new(Mutex::new(RequestQueue::new())),
            returned: Arc::new(Mutex::new(None)),
            pending_get: Arc::new(Mutex::new(None)),
            transactional: Arc::new(Mutex::new(false)),
            sink,
        }
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn status(&self) -> ChannelState {
        self.status.get()
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Consumer tags currently registered on this channel, e.g. for an
    /// application that needs to re-issue `basic_consume` for all of them
    /// after a reconnect.
    pub fn consumer_tags(&self) -> Vec<String> {
        self.consumers.lock().tags()
    }

    /// Installs the callback invoked for every `basic.return` (unroutable
    /// mandatory/immediate publish) on this channel.
    pub fn on_return(&self, callback: impl FnMut(BasicReturnMessage) + Send + 'static) {
        *self.returned.lock() = Some(Box::new(callback));
    }

    // -- handshake -----------------------------------------------------

    pub(crate) fn open(&self) -> Result<Deferred<()>> {
        self.status.set(ChannelState::Opening);
        tracing::debug!(channel = self.id, "opening");
        let status = self.status.clone();
        self.sync_request(
            AMQPClass::Channel(channel::Method::Open(channel::Open::default())),
            vec![channel::OPEN_OK],
            move |_| status.set(ChannelState::Connected),
        )
    }

    pub fn close(&self, reply_code: u16, reply_text: &str) -> Result<Deferred<()>> {
        tracing::debug!(channel = self.id, reply_code, "closing");
        self.status.set(ChannelState::Closing);
        let status = self.status.clone();
        let deferred = self.sync_request(
            AMQPClass::Channel(channel::Method::Close(channel::Close {
                reply_code,
                reply_text: reply_text.to_string(),
                class_id: 0,
                method_id: 0,
            })),
            vec![channel::CLOSE_OK],
            |_| (),
        )?;
        deferred.chain_next(move || status.set(ChannelState::Closed));
        Ok(deferred)
    }

    // -- exchange --------------------------------------------------------

    pub fn exchange_declare(
        &self,
        exchange: &str,
        kind: ExchangeKind,
        options: ExchangeDeclareOptions,
        arguments: FieldTable,
    ) -> Result<Deferred<()>> {
        self.sync_request(
            AMQPClass::Exchange(exchange::Method::Declare(exchange::Declare {
                exchange: exchange.to_string(),
                kind: kind.kind().to_string(),
                passive: options.passive,
                durable: options.durable,
                auto_delete: options.auto_delete,
                internal: options.internal,
                nowait: options.nowait,
                arguments,
            })),
            vec![exchange::DECLARE_OK],
            |_| (),
        )
    }

    pub fn exchange_delete(&self, exchange: &str, options: ExchangeDeleteOptions) -> Result<Deferred<()>> {
        self.sync_request(
            AMQPClass::Exchange(exchange::Method::Delete(exchange::Delete {
                exchange: exchange.to_string(),
                if_unused: options.if_unused,
                nowait: options.nowait,
            })),
            vec![exchange::DELETE_OK],
            |_| (),
        )
    }

    pub fn exchange_bind(
        &self,
        destination: &str,
        source: &str,
        routing_key: &str,
        options: ExchangeBindOptions,
        arguments: FieldTable,
    ) -> Result<Deferred<()>> {
        self.sync_request(
            AMQPClass::Exchange(exchange::Method::Bind(exchange::Bind {
                destination: destination.to_string(),
                source: source.to_string(),
                routing_key: routing_key.to_string(),
                nowait: options.nowait,
                arguments,
            })),
            vec![exchange::BIND_OK],
            |_| (),
        )
    }

    pub fn exchange_unbind(
        &self,
        destination: &str,
        source: &str,
        routing_key: &str,
        options: ExchangeUnbindOptions,
        arguments: FieldTable,
    ) -> Result<Deferred<()>> {
        self.sync_request(
            AMQPClass::Exchange(exchange::Method::Unbind(exchange::Unbind {
                destination: destination.to_string(),
                source: source.to_string(),
                routing_key: routing_key.to_string(),
                nowait: options.nowait,
                arguments,
            })),
            vec![exchange::UNBIND_OK],
            |_| (),
        )
    }

    // -- queue -------------------------------------------------------

    pub fn queue_declare(
        &self,
        queue: &str,
        options: QueueDeclareOptions,
        arguments: FieldTable,
    ) -> Result<Deferred<Queue>> {
        self.sync_request(
            AMQPClass::Queue(amqp_queue::Method::Declare(amqp_queue::Declare {
                queue: queue.to_string(),
                passive: options.passive,
                durable: options.durable,
                exclusive: options.exclusive,
                auto_delete: options.auto_delete,
                nowait: options.nowait,
                arguments,
            })),
            vec![amqp_queue::DECLARE_OK],
            |reply| match reply {
                AMQPClass::Queue(amqp_queue::Method::DeclareOk(ok)) => {
                    Queue::new(ok.queue, ok.message_count, ok.consumer_count)
                }
                _ => unreachable!("wired to queue.declare-ok"),
            },
        )
    }

    pub fn queue_bind(
        &self,
        queue: &str,
        exchange: &str,
        routing_key: &str,
        options: QueueBindOptions,
        arguments: FieldTable,
    ) -> Result<Deferred<()>> {
        self.sync_request(
            AMQPClass::Queue(amqp_queue::Method::Bind(amqp_queue::Bind {
                queue: queue.to_string(),
                exchange: exchange.to_string(),
                routing_key: routing_key.to_string(),
                nowait: options.nowait,
                arguments,
            })),
            vec![amqp_queue::BIND_OK],
            |_| (),
        )
    }

    pub fn queue_unbind(
        &self,
        queue: &str,
        exchange: &str,
        routing_key: &str,
        arguments: FieldTable,
    ) -> Result<Deferred<()>> {
        self.sync_request(
            AMQPClass::Queue(amqp_queue::Method::Unbind(amqp_queue::Unbind {
                queue: queue.to_string(),
                exchange: exchange.to_string(),
                routing_key: routing_key.to_string(),
                arguments,
            })),
            vec![amqp_queue::UNBIND_OK],
            |_| (),
        )
    }

    pub fn queue_purge(&self, queue: &str, options: QueuePurgeOptions) -> Result<Deferred<u32>> {
        self.sync_request(
            AMQPClass::Queue(amqp_queue::Method::Purge(amqp_queue::Purge {
                queue: queue.to_string(),
                nowait: options.nowait,
            })),
            vec![amqp_queue::PURGE_OK],
            |reply| match reply {
                AMQPClass::Queue(amqp_queue::Method::PurgeOk(ok)) => ok.message_count,
                _ => unreachable!("wired to queue.purge-ok"),
            },
        )
    }

    pub fn queue_delete(&self, queue: &str, options: QueueDeleteOptions) -> Result<Deferred<u32>> {
        self.sync_request(
            AMQPClass::Queue(amqp_queue::Method::Delete(amqp_queue::Delete {
                queue: queue.to_string(),
                if_unused: options.if_unused,
                if_empty: options.if_empty,
                nowait: options.nowait,
            })),
            vec![amqp_queue::DELETE_OK],
            |reply| match reply {
                AMQPClass::Queue(amqp_queue::Method::DeleteOk(ok)) => ok.message_count,
                _ => unreachable!("wired to queue.delete-ok"),
            },
        )
    }

    // -- basic ---------------------------------------------------------

    pub fn basic_qos(&self, prefetch_count: u16, options: BasicQosOptions) -> Result<Deferred<()>> {
        self.sync_request(
            AMQPClass::Basic(basic::Method::Qos(basic::Qos {
                prefetch_size: 0,
                prefetch_count,
                global: options.global,
            })),
            vec![basic::QOS_OK],
            |_| (),
        )
    }

    pub fn basic_consume(
        &self,
        queue: &str,
        consumer_tag: &str,
        options: BasicConsumeOptions,
        arguments: FieldTable,
        callback: impl FnMut(Delivery) + Send + 'static,
    ) -> Result<Deferred<String>> {
        let request = AMQPClass::Basic(basic::Method::Consume(basic::Consume {
            queue: queue.to_string(),
            consumer_tag: consumer_tag.to_string(),
            no_local: options.no_local,
            no_ack: options.no_ack,
            exclusive: options.exclusive,
            nowait: options.nowait,
            arguments,
        }));
        if !self.status.is_connected() {
            return Err(Error::InvalidChannelState(self.status.get()));
        }
        let class_id = request.class_id();
        let frame = AMQPFrame::Method(self.id, request);
        let public = Deferred::new();
        let public_ok = public.clone();
        let public_err = public.clone();
        let consumers = self.consumers.clone();
        let mut callback = Some(Box::new(callback) as Box<dyn FnMut(Delivery) + Send>);
        let internal = Deferred::new()
            .on_success(move |reply| {
                if let AMQPClass::Basic(basic::Method::ConsumeOk(ok)) = reply {
                    if let Some(cb) = callback.take() {
                        consumers.lock().register(ok.consumer_tag.clone(), cb);
                    }
                    public_ok.resolve(ok.consumer_tag);
                }
            })
            .on_error(move |e| public_err.reject(e));
        let pending = PendingRequest::new(class_id, basic::CONSUME_OK, frame, internal);
        self.requests.lock().enqueue(pending, self.sink.as_ref())?;
        Ok(public)
    }

    pub fn basic_cancel(&self, consumer_tag: &str, nowait: bool) -> Result<Deferred<()>> {
        let consumers = self.consumers.clone();
        let tag = consumer_tag.to_string();
        self.sync_request(
            AMQPClass::Basic(basic::Method::Cancel(basic::Cancel {
                consumer_tag: tag.clone(),
                nowait,
            })),
            vec![basic::CANCEL_OK],
            move |_| {
                consumers.lock().remove(&tag);
            },
        )
    }

    /// Publishes a message. Returns the publisher-confirm deferred when
    /// confirms are enabled on this channel, `None` otherwise.
    pub fn basic_publish(
        &self,
        exchange: &str,
        routing_key: &str,
        options: BasicPublishOptions,
        data: &[u8],
        properties: BasicProperties,
    ) -> Result<Option<Deferred<Confirmation>>> {
        if !self.status.is_connected() {
            return Err(Error::InvalidChannelState(self.status.get()));
        }
        self.sink.send_frame(AMQPFrame::Method(
            self.id,
            AMQPClass::Basic(basic::Method::Publish(basic::Publish {
                exchange: exchange.to_string(),
                routing_key: routing_key.to_string(),
                mandatory: options.mandatory,
                immediate: options.immediate,
            })),
        ))?;
        self.sink.send_frame(AMQPFrame::Header(
            self.id,
            crate::protocol::CLASS_BASIC,
            Box::new(AMQPContentHeader {
                class_id: crate::protocol::CLASS_BASIC,
                weight: 0,
                body_size: data.len() as u64,
                properties,
            }),
        ))?;
        let max_payload = (self.configuration.frame_max() as usize).saturating_sub(8).max(1);
        for chunk in data.chunks(max_payload) {
            self.sink.send_frame(AMQPFrame::Body(self.id, chunk.to_vec()))?;
        }
        let mut acks = self.acknowledgements.lock();
        if acks.is_enabled() {
            let (_, deferred) = acks.next_publish();
            Ok(Some(deferred))
        } else {
            Ok(None)
        }
    }

    pub fn basic_ack(&self, delivery_tag: u64, multiple: bool) -> Result<()> {
        self.sink.send_frame(AMQPFrame::Method(
            self.id,
            AMQPClass::Basic(basic::Method::Ack(basic::Ack { delivery_tag, multiple })),
        ))
    }

    pub fn basic_nack(&self, delivery_tag: u64, multiple: bool, requeue: bool) -> Result<()> {
        self.sink.send_frame(AMQPFrame::Method(
            self.id,
            AMQPClass::Basic(basic::Method::Nack(basic::Nack {
                delivery_tag,
                multiple,
                requeue,
            })),
        ))
    }

    pub fn basic_reject(&self, delivery_tag: u64, requeue: bool) -> Result<()> {
        self.sink.send_frame(AMQPFrame::Method(
            self.id,
            AMQPClass::Basic(basic::Method::Reject(basic::Reject { delivery_tag, requeue })),
        ))
    }

    pub fn basic_get(&self, queue: &str, options: BasicGetOptions) -> Result<Deferred<Option<BasicGetMessage>>> {
        if !self.status.is_connected() {
            return Err(Error::InvalidChannelState(self.status.get()));
        }
        let request = AMQPClass::Basic(basic::Method::Get(basic::Get {
            queue: queue.to_string(),
            no_ack: options.no_ack,
        }));
        let frame = AMQPFrame::Method(self.id, request);
        let public = Deferred::new();
        *self.pending_get.lock() = Some(public.clone());
        let mut pending = PendingRequest::new(crate::protocol::CLASS_BASIC, basic::GET_OK, frame, Deferred::new());
        pending.method_ids.push(basic::GET_EMPTY);
        self.requests.lock().enqueue(pending, self.sink.as_ref())?;
        Ok(public)
    }

    pub fn basic_recover(&self, requeue: bool) -> Result<Deferred<()>> {
        self.sync_request(
            AMQPClass::Basic(basic::Method::Recover(basic::Recover { requeue })),
            vec![basic::RECOVER_OK],
            |_| (),
        )
    }

    pub fn basic_recover_async(&self, requeue: bool) -> Result<()> {
        self.sink.send_frame(AMQPFrame::Method(
            self.id,
            AMQPClass::Basic(basic::Method::RecoverAsync(basic::RecoverAsync { requeue })),
        ))
    }

    // -- confirm / transactions -----------------------------------------

    pub fn confirm_select(&self) -> Result<Deferred<()>> {
        if *self.transactional.lock() {
            return Err(Error::Protocol(
                "cannot select confirm mode on a transactional channel".to_string(),
            ));
        }
        let acknowledgements = self.acknowledgements.clone();
        self.sync_request(
            AMQPClass::Confirm(confirm::Method::Select(confirm::Select { nowait: false })),
            vec![confirm::SELECT_OK],
            move |_| acknowledgements.lock().enable(),
        )
    }

    pub fn tx_select(&self) -> Result<Deferred<()>> {
        if self.acknowledgements.lock().is_enabled() {
            return Err(Error::Protocol(
                "cannot select transactional mode on a confirm channel".to_string(),
            ));
        }
        *self.transactional.lock() = true;
        self.sync_request(
            AMQPClass::Tx(tx::Method::Select(tx::Select)),
            vec![tx::SELECT_OK],
            |_| (),
        )
    }

    pub fn tx_commit(&self) -> Result<Deferred<()>> {
        self.sync_request(
            AMQPClass::Tx(tx::Method::Commit(tx::Commit)),
            vec![tx::COMMIT_OK],
            |_| (),
        )
    }

    pub fn tx_rollback(&self) -> Result<Deferred<()>> {
        self.sync_request(
            AMQPClass::Tx(tx::Method::Rollback(tx::Rollback)),
            vec![tx::ROLLBACK_OK],
            |_| (),
        )
    }

    /// Legacy no-op ticket request, matching lapin's own
    /// `on_access_request_ok_received` handling.
    pub fn access_request(&self) -> Result<Deferred<()>> {
        self.sync_request(
            AMQPClass::Access(access::Method::Request(access::Request::default())),
            vec![access::REQUEST_OK],
            |_| (),
        )
    }

    // -- inbound dispatch -------------------------------------------------

    pub(crate) fn handle_frame(&self, frame: AMQPFrame) -> Result<()> {
        match frame {
            AMQPFrame::Method(_, class) => self.handle_method(class),
            AMQPFrame::Header(_, class_id, header) => self.handle_header(class_id, *header),
            AMQPFrame::Body(_, body) => self.handle_body(body),
            AMQPFrame::Heartbeat => Ok(()),
        }
    }

    fn handle_method(&self, class: AMQPClass) -> Result<()> {
        match &class {
            AMQPClass::Basic(basic::Method::Deliver(m)) => {
                self.content_assembler.lock().start(PendingMethod::Deliver(m.clone()))
            }
            AMQPClass::Basic(basic::Method::Return(m)) => {
                self.content_assembler.lock().start(PendingMethod::Return(m.clone()))
            }
            AMQPClass::Basic(basic::Method::GetOk(m)) => {
                self.requests
                    .lock()
                    .complete(crate::protocol::CLASS_BASIC, basic::GET_OK, class.clone(), self.sink.as_ref())?;
                self.content_assembler.lock().start(PendingMethod::GetOk(m.clone()))
            }
            AMQPClass::Basic(basic::Method::GetEmpty(_)) => {
                self.requests.lock().complete(
                    crate::protocol::CLASS_BASIC,
                    basic::GET_EMPTY,
                    class.clone(),
                    self.sink.as_ref(),
                )?;
                if let Some(deferred) = self.pending_get.lock().take() {
                    deferred.resolve(None);
                }
                Ok(())
            }
            AMQPClass::Basic(basic::Method::Ack(m)) => {
                self.acknowledgements.lock().resolve(m.delivery_tag, m.multiple, Confirmation::Ack);
                Ok(())
            }
            AMQPClass::Basic(basic::Method::Nack(m)) => {
                self.acknowledgements.lock().resolve(m.delivery_tag, m.multiple, Confirmation::Nack);
                Ok(())
            }
            AMQPClass::Basic(basic::Method::Cancel(m)) => {
                self.consumers.lock().remove(&m.consumer_tag);
                Ok(())
            }
            AMQPClass::Channel(channel::Method::Close(close)) => self.handle_broker_close(close.clone()),
            AMQPClass::Channel(channel::Method::Flow(flow)) => self.sink.send_frame(AMQPFrame::Method(
                self.id,
                AMQPClass::Channel(channel::Method::FlowOk(channel::FlowOk { active: flow.active })),
            )),
            _ => {
                let class_id = class.class_id();
                let method_id = class.method_id();
                self.requests.lock().complete(class_id, method_id, class.clone(), self.sink.as_ref())
            }
        }
    }

    fn handle_header(&self, class_id: u16, header: AMQPContentHeader) -> Result<()> {
        let assembled = self
            .content_assembler
            .lock()
            .header(class_id, header.body_size, header.properties)?;
        if let Some(content) = assembled {
            self.deliver_content(content);
        }
        Ok(())
    }

    fn handle_body(&self, chunk: Vec<u8>) -> Result<()> {
        let assembled = self.content_assembler.lock().body(chunk)?;
        if let Some(content) = assembled {
            self.deliver_content(content);
        }
        Ok(())
    }

    fn deliver_content(&self, content: AssembledContent) {
        match content.method {
            PendingMethod::Deliver(m) => {
                let delivery = Delivery {
                    delivery_tag: m.delivery_tag,
                    consumer_tag: m.consumer_tag,
                    exchange: m.exchange,
                    routing_key: m.routing_key,
                    redelivered: m.redelivered,
                    properties: content.properties,
                    data: content.body,
                };
                self.consumers.lock().deliver(delivery);
            }
            PendingMethod::Return(m) => {
                let message = BasicReturnMessage {
                    reply_code: m.reply_code,
                    reply_text: m.reply_text,
                    exchange: m.exchange,
                    routing_key: m.routing_key,
                    properties: content.properties,
                    data: content.body,
                };
                if let Some(callback) = self.returned.lock().as_mut() {
                    callback(message);
                }
            }
            PendingMethod::GetOk(m) => {
                let message = BasicGetMessage {
                    delivery_tag: m.delivery_tag,
                    exchange: m.exchange,
                    routing_key: m.routing_key,
                    redelivered: m.redelivered,
                    message_count: m.message_count,
                    properties: content.properties,
                    data: content.body,
                };
                if let Some(deferred) = self.pending_get.lock().take() {
                    deferred.resolve(Some(message));
                }
            }
        }
    }

    fn handle_broker_close(&self, close: channel::Close) -> Result<()> {
        let error = AMQPError::new(close.reply_code, close.reply_text.clone());
        tracing::error!(channel = self.id, reply_code = close.reply_code, reply_text = %close.reply_text, "broker closed channel");
        self.requests.lock().fail_all(error.clone());
        self.acknowledgements.lock().fail_all(error);
        self.consumers.lock().clear();
        self.status.set(ChannelState::Closed);
        self.sink.send_frame(AMQPFrame::Method(
            self.id,
            AMQPClass::Channel(channel::Method::CloseOk(channel::CloseOk)),
        ))
    }

    /// Fails every pending deferred on this channel, e.g. because the
    /// owning connection is closing.
    pub(crate) fn fail(&self, error: AMQPError) {
        self.requests.lock().fail_all(error.clone());
        self.acknowledgements.lock().fail_all(error);
        self.consumers.lock().clear();
        self.status.set(ChannelState::Error);
    }

    fn sync_request<T: 'static + Send>(
        &self,
        request: AMQPClass,
        expected_method_ids: Vec<u16>,
        translate: impl FnOnce(AMQPClass) -> T + Send + 'static,
    ) -> Result<Deferred<T>> {
        debug_assert!(
            request.is_synchronous_request(),
            "sync_request called with a method that doesn't expect a reply: {:?}",
            request
        );
        let is_open = matches!(request, AMQPClass::Channel(channel::Method::Open(_)));
        if !is_open && !self.status.is_connected() {
            return Err(Error::InvalidChannelState(self.status.get()));
        }
        let class_id = request.class_id();
        let frame = AMQPFrame::Method(self.id, request);
        let public = Deferred::new();
        let public_ok = public.clone();
        let public_err = public.clone();
        let internal = Deferred::new()
            .on_success(move |reply| public_ok.resolve(translate(reply)))
            .on_error(move |e| public_err.reject(e));
        let pending = PendingRequest {
            class_id,
            method_ids: expected_method_ids,
            frame,
            deferred: internal,
        };
        tracing::trace!(channel = self.id, class_id, "enqueueing synchronous request");
        self.requests.lock().enqueue(pending, self.sink.as_ref())?;
        Ok(public)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    struct RecordingSink {
        sent: Arc<StdMutex<Vec<AMQPFrame>>>,
    }

    impl FrameSink for RecordingSink {
        fn send_frame(&self, frame: AMQPFrame) -> Result<()> {
            self.sent.lock().unwrap().push(frame);
            Ok(())
        }
    }

    fn open_channel() -> (Channel, Arc<StdMutex<Vec<AMQPFrame>>>) {
        let sent = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::new(RecordingSink { sent: sent.clone() });
        let channel = Channel::new(1, Configuration::new(), sink);
        let _opened = channel.open().unwrap();
        channel
            .handle_frame(AMQPFrame::Method(
                1,
                AMQPClass::Channel(channel::Method::OpenOk(channel::OpenOk)),
            ))
            .unwrap();
        (channel, sent)
    }

    #[test]
    fn open_transitions_to_connected_on_open_ok() {
        let (channel, _sent) = open_channel();
        assert_eq!(channel.status(), ChannelState::Connected);
    }

    #[test]
    fn queue_declare_resolves_with_broker_assigned_name() {
        let (channel, sent) = open_channel();
        let deferred = channel
            .queue_declare("", QueueDeclareOptions { exclusive: true, ..Default::default() }, FieldTable::new())
            .unwrap();
        let resolved = Arc::new(StdMutex::new(None));
        let r = resolved.clone();
        let _deferred = deferred.on_success(move |queue: Queue| *r.lock().unwrap() = Some(queue));
        channel
            .handle_frame(AMQPFrame::Method(
                1,
                AMQPClass::Queue(amqp_queue::Method::DeclareOk(amqp_queue::DeclareOk {
                    queue: "amq.gen-xxx".to_string(),
                    message_count: 0,
                    consumer_count: 0,
                })),
            ))
            .unwrap();
        let queue = resolved.lock().unwrap().take().unwrap();
        assert_eq!(queue.name(), "amq.gen-xxx");
        assert_eq!(sent.lock().unwrap().len(), 2);
    }

    #[test]
    fn publish_in_confirm_mode_resolves_in_ack_order() {
        let (channel, _sent) = open_channel();
        let select = channel.confirm_select().unwrap();
        channel
            .handle_frame(AMQPFrame::Method(
                1,
                AMQPClass::Confirm(confirm::Method::SelectOk(confirm::SelectOk)),
            ))
            .unwrap();
        drop(select);
        let order = Arc::new(StdMutex::new(Vec::new()));
        for i in 1..=3u64 {
            let deferred = channel
                .basic_publish("", "q", BasicPublishOptions::default(), &[0u8], BasicProperties::new())
                .unwrap()
                .unwrap();
            let o = order.clone();
            deferred.on_success(move |c| o.lock().unwrap().push((i, c)));
        }
        channel
            .handle_frame(AMQPFrame::Method(
                1,
                AMQPClass::Basic(basic::Method::Ack(basic::Ack {
                    delivery_tag: 3,
                    multiple: true,
                })),
            ))
            .unwrap();
        let resolved = order.lock().unwrap();
        assert_eq!(resolved.len(), 3);
        assert_eq!(resolved[0].0, 1);
        assert_eq!(resolved[2].0, 3);
    }

    #[test]
    fn consume_then_deliver_invokes_registered_callback() {
        let (channel, _sent) = open_channel();
        let received = Arc::new(StdMutex::new(None));
        let r = received.clone();
        let consumed = channel
            .basic_consume(
                "q",
                "",
                BasicConsumeOptions::default(),
                FieldTable::new(),
                move |delivery| *r.lock().unwrap() = Some(delivery),
            )
            .unwrap();
        channel
            .handle_frame(AMQPFrame::Method(
                1,
                AMQPClass::Basic(basic::Method::ConsumeOk(basic::ConsumeOk {
                    consumer_tag: "ct".to_string(),
                })),
            ))
            .unwrap();
        let tag = Arc::new(StdMutex::new(None));
        let t = tag.clone();
        consumed.on_success(move |consumer_tag| *t.lock().unwrap() = Some(consumer_tag));
        assert_eq!(tag.lock().unwrap().as_deref(), Some("ct"));
        assert_eq!(channel.consumer_tags(), vec!["ct".to_string()]);

        channel
            .handle_frame(AMQPFrame::Method(
                1,
                AMQPClass::Basic(basic::Method::Deliver(basic::Deliver {
                    consumer_tag: "ct".to_string(),
                    delivery_tag: 7,
                    redelivered: false,
                    exchange: String::new(),
                    routing_key: "q".to_string(),
                })),
            ))
            .unwrap();
        channel
            .handle_frame(AMQPFrame::Header(
                1,
                crate::protocol::CLASS_BASIC,
                Box::new(AMQPContentHeader {
                    class_id: crate::protocol::CLASS_BASIC,
                    weight: 0,
                    body_size: 3,
                    properties: BasicProperties::new(),
                }),
            ))
            .unwrap();
        channel
            .handle_frame(AMQPFrame::Body(1, vec![1, 2, 3]))
            .unwrap();

        let delivery = received.lock().unwrap().take().unwrap();
        assert_eq!(delivery.data, vec![1, 2, 3]);
        assert_eq!(delivery.delivery_tag, 7);
    }

    #[test]
    fn unroutable_publish_invokes_registered_return_callback() {
        let (channel, _sent) = open_channel();
        let returned: Arc<StdMutex<Option<BasicReturnMessage>>> = Arc::new(StdMutex::new(None));
        let r = returned.clone();
        channel.on_return(move |message| *r.lock().unwrap() = Some(message));

        channel
            .handle_frame(AMQPFrame::Method(
                1,
                AMQPClass::Basic(basic::Method::Return(basic::Return {
                    reply_code: 312,
                    reply_text: "NO_ROUTE".to_string(),
                    exchange: "x".to_string(),
                    routing_key: "unroutable".to_string(),
                })),
            ))
            .unwrap();
        channel
            .handle_frame(AMQPFrame::Header(
                1,
                crate::protocol::CLASS_BASIC,
                Box::new(AMQPContentHeader {
                    class_id: crate::protocol::CLASS_BASIC,
                    weight: 0,
                    body_size: 4,
                    properties: BasicProperties::new(),
                }),
            ))
            .unwrap();
        channel
            .handle_frame(AMQPFrame::Body(1, vec![9, 9, 9, 9]))
            .unwrap();

        let message = returned.lock().unwrap().take().unwrap();
        assert_eq!(message.reply_code, 312);
        assert_eq!(message.reply_text, "NO_ROUTE");
        assert_eq!(message.exchange, "x");
        assert_eq!(message.routing_key, "unroutable");
        assert_eq!(message.data, vec![9, 9, 9, 9]);
    }

    #[test]
    fn broker_close_fails_pending_declare_and_closes_channel() {
        let (channel, sent) = open_channel();
        let deferred = channel
            .queue_declare("q", QueueDeclareOptions::default(), FieldTable::new())
            .unwrap();
        let error_text = Arc::new(StdMutex::new(None));
        let e = error_text.clone();
        deferred.on_error(move |err| *e.lock().unwrap() = Some(err.reply_text));
        channel
            .handle_frame(AMQPFrame::Method(
                1,
                AMQPClass::Channel(channel::Method::Close(channel::Close {
                    reply_code: 406,
                    reply_text: "PRECONDITION_FAILED".to_string(),
                    class_id: 50,
                    method_id: 10,
                })),
            ))
            .unwrap();
        assert_eq!(error_text.lock().unwrap().as_deref(), Some("PRECONDITION_FAILED"));
        assert_eq!(channel.status(), ChannelState::Closed);
        assert!(matches!(sent.lock().unwrap().last(), Some(AMQPFrame::Method(1, AMQPClass::Channel(channel::Method::CloseOk(_))))));
    }
}
