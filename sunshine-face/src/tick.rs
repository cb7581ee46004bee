//! Interactive redraw timer
//!
//! While the face is visible and interactive it redraws at the start of every
//! wall-clock second. The scheduler only holds the next deadline; the executor
//! owning the engine sleeps until it and then calls back into the engine.

/// Update rate in interactive mode (seconds are shown)
pub const INTERACTIVE_UPDATE_RATE_MS: u64 = 1_000;

/// Delay from `now_ms` until the start of the next wall-clock second
pub const fn delay_to_next_tick(now_ms: u64) -> u64 {
    INTERACTIVE_UPDATE_RATE_MS - (now_ms % INTERACTIVE_UPDATE_RATE_MS)
}

/// Self-rescheduling one-shot timer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickScheduler {
    /// Wall-clock time of the pending tick
    deadline_ms: Option<u64>,
}

impl TickScheduler {
    pub const fn new() -> Self {
        Self { deadline_ms: None }
    }

    /// Drop any pending tick and, if the timer should run, fire right away
    pub fn update_timer(&mut self, now_ms: u64, should_run: bool) {
        self.deadline_ms = if should_run { Some(now_ms) } else { None };
    }

    /// Consume the pending tick and re-arm for the next second if still wanted.
    ///
    /// Returns the delay until the re-armed tick.
    pub fn on_fire(&mut self, now_ms: u64, should_run: bool) -> Option<u64> {
        self.deadline_ms = None;
        if !should_run {
            return None;
        }

        let delay = delay_to_next_tick(now_ms);
        self.deadline_ms = Some(now_ms + delay);
        Some(delay)
    }

    pub fn cancel(&mut self) {
        self.deadline_ms = None;
    }

    pub fn deadline(&self) -> Option<u64> {
        self.deadline_ms
    }

    pub fn is_armed(&self) -> bool {
        self.deadline_ms.is_some()
    }

    pub fn is_due(&self, now_ms: u64) -> bool {
        matches!(self.deadline_ms, Some(deadline) if deadline <= now_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_mid_second() {
        assert_eq!(delay_to_next_tick(123), 877);
        assert_eq!(delay_to_next_tick(1_469_180_400_999), 1);
    }

    #[test]
    fn test_delay_on_the_second_waits_full_period() {
        assert_eq!(delay_to_next_tick(0), 1_000);
        assert_eq!(delay_to_next_tick(42_000), 1_000);
    }

    #[test]
    fn test_update_timer_fires_immediately() {
        let mut ticker = TickScheduler::new();
        ticker.update_timer(5_250, true);
        assert_eq!(ticker.deadline(), Some(5_250));
        assert!(ticker.is_due(5_250));
    }

    #[test]
    fn test_update_timer_cancels_when_stopped() {
        let mut ticker = TickScheduler::new();
        ticker.update_timer(5_250, true);
        ticker.update_timer(5_300, false);
        assert!(!ticker.is_armed());
        assert!(!ticker.is_due(u64::MAX));
    }

    #[test]
    fn test_fire_rearms_on_next_second() {
        let mut ticker = TickScheduler::new();
        ticker.update_timer(10_123, true);
        assert_eq!(ticker.on_fire(10_123, true), Some(877));
        assert_eq!(ticker.deadline(), Some(11_000));
        assert!(!ticker.is_due(10_999));
        assert!(ticker.is_due(11_000));
    }

    #[test]
    fn test_fire_does_not_rearm_when_stopped() {
        let mut ticker = TickScheduler::new();
        ticker.update_timer(10_123, true);
        assert_eq!(ticker.on_fire(10_200, false), None);
        assert!(!ticker.is_armed());
    }
}
