//! Consumer tag registry.
//!
//! Grounded on lapin's `Queues`/consumer-tag bookkeeping in
//! `src/channel.rs`, narrowed to just the tag -> callback mapping this
//! core needs; queue bookkeeping beyond that belongs to the application.

use std::collections::HashMap;

use crate::message::Delivery;

type DeliveryCallback = Box<dyn FnMut(Delivery) + Send>;

#[derive(Default)]
pub struct ConsumerRegistry {
    consumers: HashMap<String, DeliveryCallback>,
}

impl ConsumerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, consumer_tag: String, callback: DeliveryCallback) {
        self.consumers.insert(consumer_tag, callback);
    }

    pub fn remove(&mut self, consumer_tag: &str) -> bool {
        self.consumers.remove(consumer_tag).is_some()
    }

    pub fn contains(&self, consumer_tag: &str) -> bool {
        self.consumers.contains_key(consumer_tag)
    }

    /// Invokes the registered callback for `delivery`'s consumer tag.
    /// Returns `false` if no consumer is registered under that tag, which
    /// the caller should treat as a protocol violation — the broker
    /// should never deliver to a tag it hasn't acknowledged via
    /// `basic.consume-ok`.
    pub fn deliver(&mut self, delivery: Delivery) -> bool {
        match self.consumers.get_mut(&delivery.consumer_tag) {
            Some(callback) => {
                callback(delivery);
                true
            }
            None => false,
        }
    }

    pub fn tags(&self) -> Vec<String> {
        self.consumers.keys().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.consumers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic_properties::BasicProperties;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn delivery(tag: &str) -> Delivery {
        Delivery {
            delivery_tag: 1,
            consumer_tag: tag.to_string(),
            exchange: String::new(),
            routing_key: "q".to_string(),
            redelivered: false,
            properties: BasicProperties::new(),
            data: vec![1, 2, 3],
        }
    }

    #[test]
    fn delivers_to_registered_tag() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let mut registry = ConsumerRegistry::new();
        registry.register(
            "ct".to_string(),
            Box::new(move |_| {
                c.fetch_add(1, Ordering::SeqCst);
            }),
        );
        assert!(registry.deliver(delivery("ct")));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unknown_tag_reports_false() {
        let mut registry = ConsumerRegistry::new();
        assert!(!registry.deliver(delivery("unknown")));
    }

    #[test]
    fn remove_stops_future_delivery() {
        let mut registry = ConsumerRegistry::new();
        registry.register("ct".to_string(), Box::new(|_| {}));
        assert!(registry.remove("ct"));
        assert!(!registry.deliver(delivery("ct")));
    }
}
