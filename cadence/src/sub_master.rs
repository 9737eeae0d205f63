//! Multiplexed subscriber with per-topic freshness, liveness and validity.

use std::fmt;
use std::ops::Index;
use std::sync::Arc;
use std::time::Duration;

use hashbrown::HashMap;
use tracing::{debug, trace, warn};

use cadence_core::clock::MonoClock;
use cadence_core::error::{CadenceError, Result};
use cadence_core::inproc::InprocTransport;
use cadence_core::transport::{Poller, SocketId, SubSocket, Transport};

use crate::config::SubMasterConfig;
use crate::framing::{Event, MessageReader};
use crate::liveness::{LivenessInput, LivenessPolicy};

/// State of one subscribed topic.
#[derive(Debug)]
struct TopicState {
    name: String,
    socket: SocketId,
    reader: MessageReader,
    frequency_hz: Option<f64>,
    ignore_alive: bool,
    received: bool,
    updated: bool,
    alive: bool,
    rcv_time: u64,
    rcv_frame: u64,
}

impl TopicState {
    fn valid(&self) -> bool {
        self.received && self.reader.event().valid()
    }
}

/// Subscribes to a fixed set of topics and tracks each one per update cycle.
///
/// Each call to [`update`](Self::update) is one cycle: it waits for any topic to
/// receive, keeps the newest frame of every ready topic, and recomputes which
/// topics are fresh (`updated`), keeping up with their cadence (`alive`), and
/// asserted valid by their producer (`valid`).
///
/// # Examples
///
/// ```
/// use cadence::prelude::*;
///
/// # fn main() -> cadence::Result<()> {
/// let ctx = InprocContext::create()?;
/// let mut sm: SubMaster = SubMaster::new(&ctx, ["carState", "radarState"])?;
/// let mut pm: PubMaster = PubMaster::new(&ctx, ["carState"])?;
///
/// let mut msg = MessageBuilder::new();
/// msg.init_event(true);
/// pm.send("carState", &mut msg)?;
///
/// sm.update(100)?;
/// assert!(sm.updated("carState")?);
/// assert!(!sm.updated("radarState")?);
/// assert!(sm["carState"].event().valid());
/// # Ok(())
/// # }
/// ```
pub struct SubMaster<T: Transport = InprocTransport> {
    poller: T::Poller,
    topics: Vec<TopicState>,
    by_name: HashMap<String, usize>,
    // Topic index per `SocketId`, indexed by the id's slot.
    by_socket: Vec<Option<usize>>,
    frame: u64,
    liveness: Arc<dyn LivenessPolicy>,
    clock: Arc<dyn MonoClock>,
}

impl<T: Transport> SubMaster<T> {
    /// Subscribe to `topics` on the local host with the default configuration.
    ///
    /// # Errors
    ///
    /// Fails if any topic cannot be connected; no partially connected
    /// `SubMaster` is ever returned.
    pub fn new<I, S>(context: &T::Context, topics: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::with_config(context, topics, SubMasterConfig::default())
    }

    /// Subscribe to `topics` with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CadenceError::InvalidConfig`] for duplicate topics or
    /// ignore-alive names that are not subscribed, and the connect error of
    /// the first topic that fails to connect.
    pub fn with_config<I, S>(context: &T::Context, topics: I, config: SubMasterConfig) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut poller = <T::Poller as Poller>::new();
        let mut states = Vec::new();
        let mut by_name = HashMap::new();
        let mut by_socket = Vec::new();

        for name in topics {
            let name = name.as_ref();
            if by_name.contains_key(name) {
                return Err(CadenceError::invalid_config(format!(
                    "topic '{name}' is listed twice"
                )));
            }
            let socket =
                <T::SubSocket as SubSocket>::connect(context, name, &config.address, config.conflate)?;
            let id = poller.register_socket(socket);
            if by_socket.len() <= id.0 {
                by_socket.resize(id.0 + 1, None);
            }
            by_socket[id.0] = Some(states.len());
            by_name.insert(name.to_string(), states.len());
            states.push(TopicState {
                name: name.to_string(),
                socket: id,
                reader: MessageReader::default(),
                frequency_hz: config.services.frequency(name),
                ignore_alive: false,
                received: false,
                updated: false,
                alive: false,
                rcv_time: 0,
                rcv_frame: 0,
            });
        }

        for name in &config.ignore_alive {
            let &idx = by_name.get(name.as_str()).ok_or_else(|| {
                CadenceError::invalid_config(format!(
                    "ignore-alive topic '{name}' is not subscribed"
                ))
            })?;
            states[idx].ignore_alive = true;
            states[idx].alive = true;
        }

        debug!(
            "[SubMaster] Subscribed to {} topics over {} at {} (conflate={})",
            states.len(),
            T::NAME,
            config.address,
            config.conflate
        );

        Ok(Self {
            poller,
            topics: states,
            by_name,
            by_socket,
            frame: 0,
            liveness: config.liveness,
            clock: config.clock,
        })
    }

    /// Run one cycle, waiting at most `timeout_ms` (forever when negative).
    ///
    /// Returns the number of topics that received this cycle. An empty cycle
    /// after a timeout is `Ok(0)`, not an error.
    ///
    /// # Errors
    ///
    /// Poll and receive failures of the transport are returned as is. A
    /// receive failure on one topic still completes the cycle: frames already
    /// taken from any socket are recorded and liveness is recomputed before
    /// the first failure is returned.
    pub fn update(&mut self, timeout_ms: i32) -> Result<usize> {
        self.frame += 1;
        for topic in &mut self.topics {
            topic.updated = false;
        }

        let ready = self.poller.poll(timeout_ms)?;
        let now = self.clock.now_ns();
        let mut updated = 0;
        let mut failure = None;

        for id in ready {
            let Some(idx) = self.by_socket.get(id.0).copied().flatten() else {
                warn!("[SubMaster] Poller reported unknown socket {:?}", id);
                continue;
            };
            let topic = &mut self.topics[idx];
            let Some(socket) = self.poller.socket_mut(id) else {
                continue;
            };

            // Keep only the newest queued frame.
            let mut newest = None;
            let mut drained = 0;
            loop {
                match socket.receive(true) {
                    Ok(Some(msg)) => {
                        newest = Some(msg);
                        drained += 1;
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!("[SubMaster] Receive on '{}' failed: {}", topic.name, e);
                        failure.get_or_insert(e);
                        break;
                    }
                }
            }
            let Some(msg) = newest else {
                continue;
            };
            if drained > 1 {
                trace!("[SubMaster] '{}' skipped {} stale frames", topic.name, drained - 1);
            }

            match topic.reader.reset_from(msg.data()) {
                Ok(()) => {
                    topic.received = true;
                    topic.updated = true;
                    topic.rcv_time = now;
                    topic.rcv_frame = self.frame;
                    updated += 1;
                }
                Err(e) => {
                    warn!(
                        "[SubMaster] Discarding malformed frame on '{}': {}",
                        topic.name, e
                    );
                }
            }
            msg.close();
        }

        self.check_liveness(now);
        trace!("[SubMaster] frame {} updated {} topics", self.frame, updated);
        match failure {
            Some(e) => Err(e),
            None => Ok(updated),
        }
    }

    fn check_liveness(&mut self, now: u64) {
        for topic in &mut self.topics {
            topic.alive = if topic.ignore_alive {
                true
            } else if !topic.received {
                false
            } else {
                self.liveness.is_alive(&LivenessInput {
                    frequency_hz: topic.frequency_hz,
                    elapsed: Duration::from_nanos(now.saturating_sub(topic.rcv_time)),
                    missed_cycles: self.frame - topic.rcv_frame,
                })
            };
        }
    }

    /// Discard every queued frame without touching topic state.
    ///
    /// Call once at startup so the first [`update`](Self::update) only sees
    /// frames published after this point. Each socket gives up at most the
    /// frames it held on entry, so a publisher that keeps sending cannot hold
    /// the call forever. Returns the number of frames discarded.
    ///
    /// # Errors
    ///
    /// Receive failures of the transport are returned as is.
    pub fn drain(&mut self) -> Result<usize> {
        let mut discarded = 0;
        for topic in &self.topics {
            let Some(socket) = self.poller.socket_mut(topic.socket) else {
                continue;
            };
            for _ in 0..socket.queued() {
                if socket.receive(true)?.is_none() {
                    break;
                }
                discarded += 1;
            }
        }
        debug!("[SubMaster] Drained {} queued frames", discarded);
        Ok(discarded)
    }

    fn topic(&self, name: &str) -> Result<&TopicState> {
        self.by_name
            .get(name)
            .and_then(|&idx| self.topics.get(idx))
            .ok_or_else(|| CadenceError::unknown_topic(name))
    }

    /// Whether `name` received during the last update.
    ///
    /// # Errors
    ///
    /// Returns [`CadenceError::UnknownTopic`] if `name` is not subscribed.
    pub fn updated(&self, name: &str) -> Result<bool> {
        Ok(self.topic(name)?.updated)
    }

    /// Whether `name` is keeping up with its expected cadence.
    ///
    /// # Errors
    ///
    /// Returns [`CadenceError::UnknownTopic`] if `name` is not subscribed.
    pub fn alive(&self, name: &str) -> Result<bool> {
        Ok(self.topic(name)?.alive)
    }

    /// Validity flag of the newest envelope of `name` (`false` before any).
    ///
    /// # Errors
    ///
    /// Returns [`CadenceError::UnknownTopic`] if `name` is not subscribed.
    pub fn valid(&self, name: &str) -> Result<bool> {
        Ok(self.topic(name)?.valid())
    }

    /// Boot-clock time of the last receipt of `name` (0 before any).
    ///
    /// # Errors
    ///
    /// Returns [`CadenceError::UnknownTopic`] if `name` is not subscribed.
    pub fn rcv_time(&self, name: &str) -> Result<u64> {
        Ok(self.topic(name)?.rcv_time)
    }

    /// Update cycle of the last receipt of `name` (0 before any).
    ///
    /// # Errors
    ///
    /// Returns [`CadenceError::UnknownTopic`] if `name` is not subscribed.
    pub fn rcv_frame(&self, name: &str) -> Result<u64> {
        Ok(self.topic(name)?.rcv_frame)
    }

    /// Build-time timestamp of the newest envelope of `name`.
    ///
    /// # Errors
    ///
    /// Returns [`CadenceError::UnknownTopic`] if `name` is not subscribed.
    pub fn log_mono_time(&self, name: &str) -> Result<u64> {
        Ok(self.topic(name)?.reader.event().log_mono_time())
    }

    /// Reader holding the newest envelope of `name`.
    ///
    /// A topic that never received returns the default envelope.
    ///
    /// # Errors
    ///
    /// Returns [`CadenceError::UnknownTopic`] if `name` is not subscribed.
    pub fn reader(&self, name: &str) -> Result<&MessageReader> {
        Ok(&self.topic(name)?.reader)
    }

    /// Root of the newest envelope of `name`.
    ///
    /// # Errors
    ///
    /// Returns [`CadenceError::UnknownTopic`] if `name` is not subscribed.
    pub fn get(&self, name: &str) -> Result<Event<'_>> {
        Ok(self.topic(name)?.reader.event())
    }

    fn check_all(&self, names: &[&str], pred: impl Fn(&TopicState) -> bool) -> Result<bool> {
        if names.is_empty() {
            return Ok(self.topics.iter().all(pred));
        }
        let mut all = true;
        for name in names {
            all &= pred(self.topic(name)?);
        }
        Ok(all)
    }

    /// Whether every topic in `names` is alive (all topics when empty).
    ///
    /// # Errors
    ///
    /// Returns [`CadenceError::UnknownTopic`] for any unsubscribed name.
    pub fn all_alive(&self, names: &[&str]) -> Result<bool> {
        self.check_all(names, |t| t.alive)
    }

    /// Whether every topic in `names` is valid (all topics when empty).
    ///
    /// # Errors
    ///
    /// Returns [`CadenceError::UnknownTopic`] for any unsubscribed name.
    pub fn all_valid(&self, names: &[&str]) -> Result<bool> {
        self.check_all(names, TopicState::valid)
    }

    /// Whether every topic in `names` is alive and valid (all topics when empty).
    ///
    /// # Errors
    ///
    /// Returns [`CadenceError::UnknownTopic`] for any unsubscribed name.
    pub fn all_alive_and_valid(&self, names: &[&str]) -> Result<bool> {
        self.check_all(names, |t| t.alive && t.valid())
    }

    /// Current update cycle.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Subscribed topics in configuration order.
    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.topics.iter().map(|t| t.name.as_str())
    }
}

impl<T: Transport> Index<&str> for SubMaster<T> {
    type Output = MessageReader;

    /// # Panics
    ///
    /// Panics if `name` is not subscribed.
    fn index(&self, name: &str) -> &MessageReader {
        match self.reader(name) {
            Ok(reader) => reader,
            Err(e) => panic!("{e}"),
        }
    }
}

impl<T: Transport> fmt::Debug for SubMaster<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubMaster")
            .field("transport", &T::NAME)
            .field("topics", &self.topics)
            .field("frame", &self.frame)
            .finish_non_exhaustive()
    }
}
