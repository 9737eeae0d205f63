//! Monotonic boot clock.
//!
//! Envelope timestamps and receive times are nanoseconds on a clock that every
//! process on the host shares and that keeps counting through suspend. On
//! Linux that is `CLOCK_BOOTTIME`; other unix targets fall back to
//! `CLOCK_MONOTONIC`.
//!
//! This module is the only place in the crate that calls into libc.

#![allow(unsafe_code)]

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Source of monotonic nanosecond timestamps.
pub trait MonoClock: Send + Sync + fmt::Debug {
    /// Current time in nanoseconds.
    fn now_ns(&self) -> u64;
}

/// The host's boot clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct BootClock;

impl MonoClock for BootClock {
    fn now_ns(&self) -> u64 {
        nanos_since_boot()
    }
}

/// Nanoseconds since boot.
#[cfg(unix)]
#[must_use]
pub fn nanos_since_boot() -> u64 {
    #[cfg(any(target_os = "linux", target_os = "android"))]
    const CLOCK_ID: libc::clockid_t = libc::CLOCK_BOOTTIME;
    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    const CLOCK_ID: libc::clockid_t = libc::CLOCK_MONOTONIC;

    let mut ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    // SAFETY: `ts` is a valid, writable timespec for the duration of the call.
    let rc = unsafe { libc::clock_gettime(CLOCK_ID, &mut ts) };
    if rc != 0 {
        return process_anchor_nanos();
    }
    (ts.tv_sec as u64) * 1_000_000_000 + ts.tv_nsec as u64
}

/// Nanoseconds since boot.
#[cfg(not(unix))]
#[must_use]
pub fn nanos_since_boot() -> u64 {
    process_anchor_nanos()
}

/// Monotonic nanoseconds measured from the first call in this process.
fn process_anchor_nanos() -> u64 {
    static ANCHOR: once_cell::sync::Lazy<std::time::Instant> =
        once_cell::sync::Lazy::new(std::time::Instant::now);
    ANCHOR.elapsed().as_nanos() as u64
}

/// Hand-driven clock for tests and simulation.
///
/// Clones share the same time source.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock reading `start_ns`.
    #[must_use]
    pub fn new(start_ns: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ns)),
        }
    }

    /// Jump to an absolute time.
    pub fn set_ns(&self, ns: u64) {
        self.now.store(ns, Ordering::SeqCst);
    }

    /// Move time forward.
    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_nanos() as u64, Ordering::SeqCst);
    }
}

impl MonoClock for ManualClock {
    fn now_ns(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}
