//! Ergonomic option bundles for `Channel` methods, one struct per
//! AMQP method that otherwise takes more than a couple of bare bools.
//!
//! Grounded on lapin's `XxxOptions` convention (named directly in
//! `src/channel.rs`, e.g. `exchange_declare(exchange, kind, options, ...)`);
//! the defining types live in lapin's `options.rs`, which this retrieval did
//! not carry, so the bundles below are written fresh but follow the same
//! one-struct-per-method, `Default`-derived shape.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExchangeDeclareOptions {
    pub passive: bool,
    pub durable: bool,
    pub auto_delete: bool,
    pub internal: bool,
    pub nowait: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExchangeDeleteOptions {
    pub if_unused: bool,
    pub nowait: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExchangeBindOptions {
    pub nowait: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExchangeUnbindOptions {
    pub nowait: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueDeclareOptions {
    pub passive: bool,
    pub durable: bool,
    pub exclusive: bool,
    pub auto_delete: bool,
    pub nowait: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueBindOptions {
    pub nowait: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueUnbindOptions;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueuePurgeOptions {
    pub nowait: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueDeleteOptions {
    pub if_unused: bool,
    pub if_empty: bool,
    pub nowait: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BasicConsumeOptions {
    pub no_local: bool,
    pub no_ack: bool,
    pub exclusive: bool,
    pub nowait: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BasicPublishOptions {
    pub mandatory: bool,
    pub immediate: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BasicGetOptions {
    pub no_ack: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BasicQosOptions {
    pub global: bool,
}
