//! Single-flight guard for store operations.

use std::sync::atomic::{AtomicBool, Ordering};

/// Allows at most one holder at a time. Later callers are turned away
/// instead of queued.
#[derive(Debug, Default)]
pub struct SingleFlight {
    in_flight: AtomicBool,
}

impl SingleFlight {
    pub const fn new() -> Self {
        Self {
            in_flight: AtomicBool::new(false),
        }
    }

    /// Acquire the flag, or `None` when another holder is active.
    ///
    /// The flag is released when the returned permit drops, which covers
    /// normal returns, early `?` returns, panics, and a caller dropping the
    /// future mid-await.
    pub fn try_acquire(&self) -> Option<FlightPermit<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightPermit {
                flag: &self.in_flight,
            })
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

/// Proof of holding a [`SingleFlight`].
#[derive(Debug)]
#[must_use = "the flight is released as soon as the permit is dropped"]
pub struct FlightPermit<'a> {
    flag: &'a AtomicBool,
}

impl Drop for FlightPermit<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
