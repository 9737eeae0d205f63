//! Liveness policies.
//!
//! A topic is alive while its publisher keeps up with the cadence it is
//! expected to run at. [`SubMaster`](crate::SubMaster) evaluates the policy once
//! per topic at the end of every update, but only for topics that have received
//! at least once and are not ignore-alive.

use std::time::Duration;

/// Below this the registered frequency is treated as unknown.
pub const MIN_FREQUENCY_HZ: f64 = 1e-5;

/// What a policy may look at when judging one topic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LivenessInput {
    /// Expected publish frequency from the service registry, if known.
    pub frequency_hz: Option<f64>,
    /// Time since the last frame was received.
    pub elapsed: Duration,
    /// Update cycles since the last frame was received.
    pub missed_cycles: u64,
}

impl LivenessInput {
    /// Registered frequency, if it is usable as a cadence.
    #[must_use]
    pub fn known_frequency(&self) -> Option<f64> {
        self.frequency_hz.filter(|hz| *hz > MIN_FREQUENCY_HZ)
    }
}

/// Decides whether a topic that has received before is still alive.
pub trait LivenessPolicy: Send + Sync {
    /// Return `true` while the topic is within tolerance.
    fn is_alive(&self, input: &LivenessInput) -> bool;
}

impl<F> LivenessPolicy for F
where
    F: Fn(&LivenessInput) -> bool + Send + Sync,
{
    fn is_alive(&self, input: &LivenessInput) -> bool {
        self(input)
    }
}

/// Alive while fewer than `periods` expected publish periods have elapsed.
///
/// A topic with no usable registered frequency stays alive once it has
/// received, since there is no cadence to judge it against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MissedPeriods {
    /// Tolerated number of expected periods without a frame.
    pub periods: f64,
}

impl MissedPeriods {
    /// Default tolerance in periods.
    pub const DEFAULT_PERIODS: f64 = 10.0;

    /// Tolerate `periods` missed periods.
    #[must_use]
    pub const fn new(periods: f64) -> Self {
        Self { periods }
    }
}

impl Default for MissedPeriods {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PERIODS)
    }
}

impl LivenessPolicy for MissedPeriods {
    fn is_alive(&self, input: &LivenessInput) -> bool {
        match input.known_frequency() {
            Some(hz) => input.elapsed.as_secs_f64() < self.periods / hz,
            None => true,
        }
    }
}

/// Alive while at most `max_cycles` update cycles passed without a frame.
///
/// Ignores frequency entirely; useful when the consumer loop runs at the
/// producer's rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissedCycles {
    /// Tolerated cycles without a frame.
    pub max_cycles: u64,
}

impl LivenessPolicy for MissedCycles {
    fn is_alive(&self, input: &LivenessInput) -> bool {
        input.missed_cycles <= self.max_cycles
    }
}
