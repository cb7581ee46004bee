//! Time keeping module for PineTime

use chrono::NaiveDateTime;
use embassy_time::Instant;
use sunshine_face::clock;

/// A wall-clock reading and the uptime at which it was taken
#[derive(Clone, Copy)]
pub struct TimeReference {
    /// Milliseconds since the Unix epoch
    epoch_ms: u64,
    /// Related system time
    instant: Instant,
}

impl TimeReference {
    /// Reference taken at boot from a known wall-clock time
    pub fn at_boot(epoch_ms: u64) -> Self {
        Self {
            epoch_ms,
            instant: Instant::from_ticks(0),
        }
    }

    /// Reference for a UTC time reported right now
    pub fn from_datetime(time: NaiveDateTime) -> Self {
        Self {
            epoch_ms: clock::epoch_millis(&time),
            instant: Instant::now(),
        }
    }
}

/// Wall clock derived from the monotonic uptime
pub struct WallClock {
    reference: TimeReference,
}

impl WallClock {
    pub fn new(reference: TimeReference) -> Self {
        Self { reference }
    }

    /// Milliseconds since the Unix epoch
    pub fn now_ms(&self) -> u64 {
        self.at(Instant::now())
    }

    /// Wall-clock time of an uptime instant
    pub fn at(&self, instant: Instant) -> u64 {
        let elapsed = instant.saturating_duration_since(self.reference.instant);
        self.reference.epoch_ms + elapsed.as_millis()
    }

    /// Uptime instant at which the wall clock reads `epoch_ms`
    pub fn instant_at(&self, epoch_ms: u64) -> Instant {
        let elapsed = epoch_ms.saturating_sub(self.reference.epoch_ms);
        self.reference.instant + embassy_time::Duration::from_millis(elapsed)
    }

    /// Update time reference
    pub fn set_time(&mut self, reference: TimeReference) {
        self.reference = reference;
    }
}
