//! Publisher-confirm tracking.
//!
//! Grounded on lapin's `Acknowledgements` (`src/channel.rs` field
//! `acknowledgements`), reworked around the synchronous `Deferred` rather
//! than a `PromiseResolver`. Outstanding confirms are a prefix-contiguous
//! run keyed by delivery tag, per its own description — a
//! `VecDeque` ordered by ascending tag is therefore enough; no need for a
//! `BTreeMap` since tags are assigned and acknowledged monotonically.

use std::collections::VecDeque;

use crate::deferred::Deferred;
use crate::message::Confirmation;

struct Outstanding {
    tag: u64,
    deferred: Deferred<Confirmation>,
}

#[derive(Default)]
pub struct Acknowledgements {
    enabled: bool,
    next_tag: u64,
    outstanding: VecDeque<Outstanding>,
}

impl Acknowledgements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable(&mut self) {
        self.enabled = true;
        self.next_tag = 1;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Called once per `basic.publish` while confirms are enabled;
    /// returns the deferred the caller should hand back to the
    /// application, and the tag assigned to this publish.
    pub fn next_publish(&mut self) -> (u64, Deferred<Confirmation>) {
        let tag = self.next_tag;
        self.next_tag += 1;
        let deferred = Deferred::new();
        self.outstanding.push_back(Outstanding {
            tag,
            deferred: deferred.clone(),
        });
        (tag, deferred)
    }

    /// Resolves tag `delivery_tag` (and, if `multiple`, every outstanding
    /// tag up to and including it) with `outcome`.
    pub fn resolve(&mut self, delivery_tag: u64, multiple: bool, outcome: Confirmation) {
        if multiple {
            while let Some(front) = self.outstanding.front() {
                if front.tag > delivery_tag {
                    break;
                }
                let entry = self.outstanding.pop_front().unwrap();
                entry.deferred.resolve(outcome.clone());
            }
        } else if let Some(pos) = self
            .outstanding
            .iter()
            .position(|entry| entry.tag == delivery_tag)
        {
            let entry = self.outstanding.remove(pos).unwrap();
            entry.deferred.resolve(outcome);
        }
    }

    /// Fails every outstanding confirm, e.g. because the channel closed.
    pub fn fail_all(&mut self, error: crate::error::AMQPError) {
        for entry in self.outstanding.drain(..) {
            entry.deferred.reject(error.clone());
        }
    }

    pub fn outstanding_count(&self) -> usize {
        self.outstanding.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn multiple_ack_resolves_prefix_and_keeps_suffix() {
        let mut acks = Acknowledgements::new();
        acks.enable();
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut deferreds = Vec::new();
        for _ in 0..4 {
            let (tag, deferred) = acks.next_publish();
            let o = order.clone();
            let deferred = deferred.on_success(move |c| o.lock().unwrap().push((tag, c)));
            deferreds.push(deferred);
        }
        acks.resolve(3, true, Confirmation::Ack);
        assert_eq!(acks.outstanding_count(), 1);
        let resolved = order.lock().unwrap();
        assert_eq!(resolved.len(), 3);
        assert_eq!(resolved[0].0, 1);
        assert_eq!(resolved[2].0, 3);
    }

    #[test]
    fn single_nack_resolves_only_that_tag() {
        let mut acks = Acknowledgements::new();
        acks.enable();
        let outcomes = Arc::new(std::sync::Mutex::new(Vec::new()));
        let (_, d1) = acks.next_publish();
        let (tag2, d2) = acks.next_publish();
        let o = outcomes.clone();
        let _d1 = d1.on_success(move |c| o.lock().unwrap().push(c));
        let o = outcomes.clone();
        let _d2 = d2.on_success(move |c| o.lock().unwrap().push(c));
        acks.resolve(tag2, false, Confirmation::Nack);
        assert_eq!(acks.outstanding_count(), 1);
        assert_eq!(*outcomes.lock().unwrap(), vec![Confirmation::Nack]);
    }
}
