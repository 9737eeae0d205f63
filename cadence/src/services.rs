//! Expected publish frequencies per topic.

use hashbrown::HashMap;

/// Source of the expected publish frequency of each topic.
pub trait ServiceRegistry: Send + Sync {
    /// Expected frequency of `name` in Hz, if registered.
    fn frequency(&self, name: &str) -> Option<f64>;
}

/// One registered service.
#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    /// Topic name.
    pub name: String,
    /// Expected publish frequency in Hz.
    pub frequency_hz: f64,
}

/// In-memory service registry.
///
/// ```
/// use cadence::services::{ServiceRegistry, ServiceTable};
///
/// let services = ServiceTable::new()
///     .with_service("carState", 100.0)
///     .with_service("roadCameraState", 20.0);
/// assert_eq!(services.frequency("carState"), Some(100.0));
/// assert_eq!(services.frequency("missing"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ServiceTable {
    services: HashMap<String, Service>,
}

impl ServiceTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` at `frequency_hz`.
    #[must_use]
    pub fn with_service(mut self, name: impl Into<String>, frequency_hz: f64) -> Self {
        self.insert(name, frequency_hz);
        self
    }

    /// Register or replace `name`, returning the previous entry.
    pub fn insert(&mut self, name: impl Into<String>, frequency_hz: f64) -> Option<Service> {
        let name = name.into();
        self.services.insert(
            name.clone(),
            Service {
                name,
                frequency_hz,
            },
        )
    }

    /// Look up a service.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Service> {
        self.services.get(name)
    }

    /// Number of registered services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Check if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Iterate over registered services in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &Service> {
        self.services.values()
    }
}

impl ServiceRegistry for ServiceTable {
    fn frequency(&self, name: &str) -> Option<f64> {
        self.get(name).map(|s| s.frequency_hz)
    }
}

impl FromIterator<(String, f64)> for ServiceTable {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (name, hz) in iter {
            table.insert(name, hz);
        }
        table
    }
}
