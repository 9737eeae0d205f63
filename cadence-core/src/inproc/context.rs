//! Inproc context: the per-process endpoint registry and readiness signal.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use dashmap::DashMap;
use flume::{Receiver, Sender, TrySendError};
use parking_lot::{Condvar, Mutex};
use tracing::{trace, warn};

use crate::error::Result;
use crate::options::{SocketOptions, MSG_MULTIPLE_PUBLISHERS};
use crate::transport::Context;

/// Identifier of one subscriber slot within an endpoint.
pub(crate) type SlotId = u64;

/// Delivery queue of one connected subscriber.
#[derive(Debug)]
struct Slot {
    id: SlotId,
    tx: Sender<Bytes>,
    /// Receiver clone used to evict the stale frame of a conflating slot.
    evict: Option<Receiver<Bytes>>,
}

impl Slot {
    /// Queue `frame`. Returns false once the subscriber is gone.
    fn deliver(&self, endpoint: &str, frame: &Bytes) -> bool {
        let mut frame = frame.clone();
        loop {
            match self.tx.try_send(frame) {
                Ok(()) => return true,
                Err(TrySendError::Full(back)) => match &self.evict {
                    Some(rx) => {
                        let _ = rx.try_recv();
                        frame = back;
                    }
                    None => {
                        warn!(
                            "[PUB] Subscriber {} on '{}' at high water mark, dropping frame",
                            self.id, endpoint
                        );
                        return true;
                    }
                },
                Err(TrySendError::Disconnected(_)) => return false,
            }
        }
    }
}

/// Generation counter bumped on every publish.
///
/// Pollers snapshot the generation, scan their queues, and sleep until it moves.
#[derive(Debug, Default)]
pub(crate) struct Signal {
    generation: Mutex<u64>,
    cond: Condvar,
}

impl Signal {
    pub(crate) fn generation(&self) -> u64 {
        *self.generation.lock()
    }

    pub(crate) fn notify(&self) {
        let mut generation = self.generation.lock();
        *generation = generation.wrapping_add(1);
        self.cond.notify_all();
    }

    /// Sleep until the generation differs from `seen` or `deadline` passes.
    ///
    /// Returns true if the generation moved.
    pub(crate) fn wait_change(&self, seen: u64, deadline: Option<Instant>) -> bool {
        let mut generation = self.generation.lock();
        while *generation == seen {
            match deadline {
                Some(deadline) => {
                    if self.cond.wait_until(&mut generation, deadline).timed_out() {
                        return *generation != seen;
                    }
                }
                None => self.cond.wait(&mut generation),
            }
        }
        true
    }
}

#[derive(Debug, Default)]
struct Shared {
    topics: DashMap<String, Vec<Slot>>,
    signal: Signal,
    next_slot: AtomicU64,
}

/// Process-local context for the inproc backend.
///
/// Owns the endpoint registry. Every socket keeps a clone, so the registry
/// lives until the last socket and the caller's handle are dropped.
#[derive(Debug, Clone, Default)]
pub struct InprocContext {
    shared: Arc<Shared>,
}

impl Context for InprocContext {
    fn create() -> Result<Self> {
        Ok(Self::default())
    }
}

impl InprocContext {
    /// Number of subscribers currently attached to `endpoint`.
    #[must_use]
    pub fn subscriber_count(&self, endpoint: &str) -> usize {
        self.shared.topics.get(endpoint).map_or(0, |slots| slots.len())
    }

    /// Number of live handles to this context (caller plus sockets).
    #[must_use]
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.shared)
    }

    /// Check if both handles refer to the same context.
    #[must_use]
    pub fn same_context(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    pub(crate) fn signal(&self) -> &Signal {
        &self.shared.signal
    }

    /// Register a subscriber queue for `endpoint`.
    pub(crate) fn attach(&self, endpoint: &str, options: &SocketOptions) -> (SlotId, Receiver<Bytes>) {
        let (tx, rx) = flume::bounded(options.queue_depth());
        let id = self.shared.next_slot.fetch_add(1, Ordering::Relaxed);
        let slot = Slot {
            id,
            tx,
            evict: options.conflate.then(|| rx.clone()),
        };
        self.shared
            .topics
            .entry(endpoint.to_string())
            .or_insert_with(|| Vec::with_capacity(MSG_MULTIPLE_PUBLISHERS))
            .push(slot);
        (id, rx)
    }

    pub(crate) fn detach(&self, endpoint: &str, id: SlotId) {
        if let Some(mut slots) = self.shared.topics.get_mut(endpoint) {
            slots.retain(|slot| slot.id != id);
        }
    }

    /// Fan `frame` out to every subscriber of `endpoint`.
    ///
    /// Returns the number of subscribers reached.
    pub(crate) fn publish(&self, endpoint: &str, frame: &Bytes) -> usize {
        let delivered = match self.shared.topics.get_mut(endpoint) {
            Some(mut slots) => {
                slots.retain(|slot| slot.deliver(endpoint, frame));
                slots.len()
            }
            None => 0,
        };
        trace!(
            "[PUB] '{}' frame of {} bytes to {} subscribers",
            endpoint,
            frame.len(),
            delivered
        );
        if delivered > 0 {
            self.shared.signal.notify();
        }
        delivered
    }
}
