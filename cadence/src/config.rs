//! SubMaster configuration.

use std::fmt;
use std::sync::Arc;

use cadence_core::clock::{BootClock, MonoClock};
use cadence_core::options::DEFAULT_ADDRESS;

use crate::liveness::{LivenessPolicy, MissedPeriods};
use crate::services::{ServiceRegistry, ServiceTable};

/// Default `SubMaster::update` timeout in milliseconds.
pub const DEFAULT_UPDATE_TIMEOUT_MS: i32 = 1000;

/// Construction options for [`SubMaster`](crate::SubMaster).
///
/// # Examples
///
/// ```
/// use cadence::config::SubMasterConfig;
/// use cadence::liveness::MissedCycles;
/// use cadence::services::ServiceTable;
///
/// let config = SubMasterConfig::default()
///     .with_ignore_alive(["controlsState"])
///     .with_services(ServiceTable::new().with_service("cameraState", 20.0))
///     .with_liveness(MissedCycles { max_cycles: 5 });
/// assert!(config.conflate);
/// ```
#[derive(Clone)]
pub struct SubMasterConfig {
    /// Publisher address (default local).
    pub address: String,
    /// Topics exempt from liveness checking.
    pub ignore_alive: Vec<String>,
    /// Keep only the newest unread frame per topic.
    pub conflate: bool,
    /// Expected frequency lookup.
    pub services: Arc<dyn ServiceRegistry>,
    /// Alive/not-alive decision.
    pub liveness: Arc<dyn LivenessPolicy>,
    /// Time source for receive times and liveness.
    pub clock: Arc<dyn MonoClock>,
}

impl Default for SubMasterConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            ignore_alive: Vec::new(),
            conflate: true,
            services: Arc::new(ServiceTable::default()),
            liveness: Arc::new(MissedPeriods::default()),
            clock: Arc::new(BootClock),
        }
    }
}

impl SubMasterConfig {
    /// Connect to publishers at `address` instead of the local host.
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Exempt `topics` from liveness checking.
    #[must_use]
    pub fn with_ignore_alive<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_alive = topics.into_iter().map(Into::into).collect();
        self
    }

    /// Enable or disable conflation on every topic.
    #[must_use]
    pub fn with_conflate(mut self, conflate: bool) -> Self {
        self.conflate = conflate;
        self
    }

    /// Use `services` for expected frequencies.
    #[must_use]
    pub fn with_services(mut self, services: impl ServiceRegistry + 'static) -> Self {
        self.services = Arc::new(services);
        self
    }

    /// Use `policy` to decide liveness.
    #[must_use]
    pub fn with_liveness(mut self, policy: impl LivenessPolicy + 'static) -> Self {
        self.liveness = Arc::new(policy);
        self
    }

    /// Use `clock` for receive times.
    #[must_use]
    pub fn with_clock(mut self, clock: impl MonoClock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }
}

impl fmt::Debug for SubMasterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubMasterConfig")
            .field("address", &self.address)
            .field("ignore_alive", &self.ignore_alive)
            .field("conflate", &self.conflate)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}
