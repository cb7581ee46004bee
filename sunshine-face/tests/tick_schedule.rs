//! Redraw timer properties

use proptest::prelude::*;
use sunshine_face::tick::{delay_to_next_tick, TickScheduler, INTERACTIVE_UPDATE_RATE_MS};

proptest! {
    #[test]
    fn delay_lands_on_next_second(now_ms in 0u64..4_000_000_000_000) {
        let delay = delay_to_next_tick(now_ms);
        prop_assert!(delay >= 1 && delay <= INTERACTIVE_UPDATE_RATE_MS);
        prop_assert_eq!((now_ms + delay) % INTERACTIVE_UPDATE_RATE_MS, 0);
    }

    #[test]
    fn delay_matches_offset_into_second(seconds in 0u64..1_000_000, offset in 1u64..1_000) {
        let now_ms = seconds * 1_000 + offset;
        prop_assert_eq!(delay_to_next_tick(now_ms), 1_000 - offset);
    }

    #[test]
    fn rearmed_tick_is_always_in_the_future(now_ms in 0u64..4_000_000_000_000) {
        let mut ticker = TickScheduler::new();
        ticker.update_timer(now_ms, true);
        prop_assert!(ticker.is_due(now_ms));

        ticker.on_fire(now_ms, true);
        let deadline = ticker.deadline().unwrap();
        prop_assert!(deadline > now_ms);
        prop_assert!(!ticker.is_due(now_ms));
    }

    #[test]
    fn stopped_timer_never_rearms(now_ms in 0u64..4_000_000_000_000, fires in 1usize..8) {
        let mut ticker = TickScheduler::new();
        ticker.update_timer(now_ms, false);
        for i in 0..fires {
            prop_assert_eq!(ticker.on_fire(now_ms + i as u64 * 250, false), None);
            prop_assert!(!ticker.is_armed());
        }
    }
}

#[test]
fn example_from_a_running_face() {
    // 123 ms past the second
    assert_eq!(delay_to_next_tick(1_469_180_400_123), 877);
}
