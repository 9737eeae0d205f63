//! Topic endpoints and addresses.
//!
//! An *endpoint* is the topic name a socket is bound to; an *address* says
//! which host publishes it. How the pair maps to an OS resource is up to the
//! backend. The helpers here are the shared pieces: name validation, address
//! parsing, and the stable topic-to-port mapping networked backends use.

use std::fmt;
use std::str::FromStr;

use crate::error::{CadenceError, Result};

/// First port handed out to topics by [`port_for`].
pub const START_PORT: u16 = 8023;

/// Last usable port.
pub const MAX_PORT: u16 = 65535;

/// Where a topic's publisher lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Address {
    /// This host (`127.0.0.1`, `localhost`, `::1` or empty).
    Loopback,
    /// Any other host name or IP.
    Remote(String),
}

impl Address {
    /// Parse an address string.
    ///
    /// # Examples
    ///
    /// ```
    /// use cadence_core::endpoint::Address;
    ///
    /// assert_eq!(Address::parse("localhost").unwrap(), Address::Loopback);
    /// assert!(matches!(Address::parse("10.0.0.2").unwrap(), Address::Remote(_)));
    /// assert!(Address::parse("bad host").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        s.parse()
    }

    /// Returns true if this is the local host.
    #[must_use]
    pub const fn is_loopback(&self) -> bool {
        matches!(self, Self::Loopback)
    }

    /// Host part suitable for a `tcp://` URI (IPv6 literals are bracketed).
    #[must_use]
    pub fn uri_host(&self) -> String {
        match self {
            Self::Loopback => "127.0.0.1".to_string(),
            Self::Remote(host) if host.contains(':') => format!("[{host}]"),
            Self::Remote(host) => host.clone(),
        }
    }
}

impl FromStr for Address {
    type Err = CadenceError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s {
            "" | "127.0.0.1" | "localhost" | "::1" => Ok(Self::Loopback),
            host if host.chars().any(|c| c.is_whitespace() || c == '/') => Err(
                CadenceError::InvalidEndpoint(format!("malformed address '{host}'")),
            ),
            host => Ok(Self::Remote(host.to_string())),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loopback => write!(f, "127.0.0.1"),
            Self::Remote(host) => write!(f, "{host}"),
        }
    }
}

/// Validate a topic endpoint name and return it.
///
/// Names are non-empty and made of ASCII letters, digits, `_`, `-` and `.`.
pub fn validate_endpoint(endpoint: &str) -> Result<&str> {
    if endpoint.is_empty() {
        return Err(CadenceError::InvalidEndpoint(
            "endpoint name cannot be empty".to_string(),
        ));
    }
    if let Some(c) = endpoint
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
    {
        return Err(CadenceError::InvalidEndpoint(format!(
            "endpoint '{endpoint}' contains invalid character {c:?}"
        )));
    }
    Ok(endpoint)
}

/// Stable port for a topic, in `START_PORT..MAX_PORT`.
///
/// Uses 64-bit FNV-1a so every process derives the same port for the same name.
#[must_use]
pub fn port_for(endpoint: &str) -> u16 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0100_0000_01b3;

    let hash = endpoint.bytes().fold(FNV_OFFSET, |h, b| {
        (h ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    });
    let span = u64::from(MAX_PORT - START_PORT);
    START_PORT + (hash % span) as u16
}

/// `tcp://` URI a subscriber connects to for `endpoint` at `address`.
#[must_use]
pub fn tcp_connect_uri(address: &Address, endpoint: &str) -> String {
    format!("tcp://{}:{}", address.uri_host(), port_for(endpoint))
}

/// `tcp://` URI a publisher binds for `endpoint`.
#[must_use]
pub fn tcp_bind_uri(endpoint: &str) -> String {
    format!("tcp://*:{}", port_for(endpoint))
}
