//! Settle delays and the clock used for debounce.
//!
//! Both are traits so tests can swap in a no-op settle and a hand-driven
//! clock without touching the register protocol under test.

use crate::consts::MIN_SETTLE_CYCLES;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Hardware settle delay between phases of a register handshake.
///
/// Implementations used against real hardware must block for at least
/// [`MIN_SETTLE_CYCLES`] core cycles without yielding to the scheduler.
pub trait Settle: Send + Sync + fmt::Debug {
    fn settle(&self);
}

/// Busy-waits a fixed number of spin iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusyWait {
    cycles: u32,
}

impl BusyWait {
    /// Creates a busy-wait of `cycles` iterations, raised to the hardware minimum if lower.
    pub fn new(cycles: u32) -> Self {
        BusyWait {
            cycles: cycles.max(MIN_SETTLE_CYCLES),
        }
    }

    pub fn cycles(&self) -> u32 {
        self.cycles
    }
}

impl Default for BusyWait {
    fn default() -> Self {
        BusyWait::new(MIN_SETTLE_CYCLES)
    }
}

impl Settle for BusyWait {
    #[inline(never)]
    fn settle(&self) {
        for _ in 0..self.cycles {
            std::hint::spin_loop();
        }
    }
}

/// Settle that returns immediately. Only for simulated register files.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSettle;

impl Settle for NoSettle {
    fn settle(&self) {}
}

/// Time source for debounce decisions.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        ManualClock {
            origin: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.elapsed.lock().unwrap_or_else(PoisonError::into_inner) += by;
    }

    /// Moves the clock to `at` past its origin. Never moves backwards.
    pub fn set_elapsed(&self, at: Duration) {
        let mut elapsed = self.elapsed.lock().unwrap_or_else(PoisonError::into_inner);
        *elapsed = (*elapsed).max(at);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.elapsed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
