//! Dispatch counters.
//!
//! Drops and skips are steady-state behavior, so they are counted rather
//! than reported as errors.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) events: AtomicU64,
    pub(crate) deliveries: AtomicU64,
    pub(crate) skipped: AtomicU64,
    pub(crate) unrecognized: AtomicU64,
    pub(crate) dropped: AtomicU64,
    pub(crate) panicked: AtomicU64,
    pub(crate) decode_misses: AtomicU64,
    pub(crate) contact_updates: AtomicU64,
    pub(crate) contact_failures: AtomicU64,
    pub(crate) ignored_nodes: AtomicU64,
}

impl Counters {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add(counter: &AtomicU64, n: u64) {
        if n > 0 {
            counter.fetch_add(n, Ordering::Relaxed);
        }
    }

    pub(crate) fn snapshot(&self) -> DispatchStats {
        let get = |c: &AtomicU64| c.load(Ordering::Relaxed);
        DispatchStats {
            events: get(&self.events),
            deliveries: get(&self.deliveries),
            skipped: get(&self.skipped),
            unrecognized: get(&self.unrecognized),
            dropped: get(&self.dropped),
            panicked: get(&self.panicked),
            decode_misses: get(&self.decode_misses),
            contact_updates: get(&self.contact_updates),
            contact_failures: get(&self.contact_failures),
            ignored_nodes: get(&self.ignored_nodes),
        }
    }
}

/// Point-in-time copy of the dispatch counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DispatchStats {
    /// Events handed to the fan-out dispatcher.
    pub events: u64,
    /// Delivery tasks submitted to the pool.
    pub deliveries: u64,
    /// (observer, event) pairs skipped for lack of a capability.
    pub skipped: u64,
    /// Inbound values with an unrecognized shape.
    pub unrecognized: u64,
    /// Deliveries dropped because the queue was full or closed.
    pub dropped: u64,
    /// Deliveries whose observer panicked.
    pub panicked: u64,
    /// Envelopes without a typed representation.
    pub decode_misses: u64,
    /// Contact-store updates that succeeded.
    pub contact_updates: u64,
    /// Contact-store updates that failed.
    pub contact_failures: u64,
    /// Nodes that matched no route.
    pub ignored_nodes: u64,
}
