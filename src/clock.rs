//! Clock abstraction for deterministic testing.
//!
//! Engine time is expressed in seconds since an arbitrary origin.
//! Hosts use `SystemClock` (real time); tests and replays use `ManualClock`
//! with explicit advancement.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Trait abstracting time sources for the engine.
pub trait Clock: Send + Sync {
    /// Seconds elapsed since the clock's origin.
    fn now(&self) -> f64;
}

/// Production clock using the monotonic system timer.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Manually advanced clock.
///
/// Stores the current time as the bit pattern of an `f64` so it can be
/// shared behind `&self`.
#[derive(Debug, Default)]
pub struct ManualClock {
    bits: AtomicU64,
}

impl ManualClock {
    /// Create a clock at time zero.
    pub fn new() -> Self {
        Self::starting_at(0.0)
    }

    pub fn starting_at(seconds: f64) -> Self {
        Self {
            bits: AtomicU64::new(seconds.to_bits()),
        }
    }

    /// Advance time by the given number of seconds.
    pub fn advance(&self, seconds: f64) {
        self.set(self.now() + seconds);
    }

    /// Advance time by the given number of milliseconds.
    pub fn advance_ms(&self, ms: u64) {
        self.advance(ms as f64 / 1000.0);
    }

    pub fn set(&self, seconds: f64) {
        self.bits.store(seconds.to_bits(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}
