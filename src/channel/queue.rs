//! The result of a successful `queue.declare`. Grounded on lapin's `Queue` type, named as the return value of
//! `Channel::queue_declare` in lapin's own doc comments.

#[derive(Clone, Debug, PartialEq)]
pub struct Queue {
    name: String,
    message_count: u32,
    consumer_count: u32,
}

impl Queue {
    pub fn new(name: String, message_count: u32, consumer_count: u32) -> Self {
        Queue {
            name,
            message_count,
            consumer_count,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn message_count(&self) -> u32 {
        self.message_count
    }

    pub fn consumer_count(&self) -> u32 {
        self.consumer_count
    }
}
