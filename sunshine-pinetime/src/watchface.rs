//! Watchface task
//!
//! Owns the engine and everything it draws to. Wakes up for face events from
//! the other tasks or for the next deadline the face cares about.

use chrono::TimeDelta;
use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Instant, Timer};
use sunshine_face::{Engine, Properties, ScreenShape};

use crate::{
    events::{FaceEvent, FACE_EVENTS},
    peripherals::{backlight::Backlight, display::Display},
    system::{
        bluetooth::{BleLink, SoftdeviceRng},
        time::{TimeReference, WallClock},
    },
};

pub type Face = Engine<BleLink, SoftdeviceRng>;

/// Minute boundaries drive the clock in ambient mode
const MINUTE_MS: u64 = 60_000;

/// Anything the task sleeps until
#[derive(Clone, Copy)]
enum Wakeup {
    /// Interactive tick at the start of a second
    Tick,
    /// Toast has to come off the screen
    ToastExpired,
    /// No interaction for a while, dim to ambient
    Inactive,
    /// Next minute in ambient mode
    AmbientMinute,
}

struct Watchface {
    face: Face,
    display: Display,
    backlight: Backlight,
    clock: WallClock,
    /// Offset used to turn the phone's local time into UTC
    utc_offset_secs: i32,
    last_activity: Instant,
}

#[embassy_executor::task]
pub async fn watchface_task(
    face: Face,
    display: Display,
    backlight: Backlight,
    clock: WallClock,
) {
    let mut watchface = Watchface {
        utc_offset_secs: face.config().utc_offset_secs,
        face,
        display,
        backlight,
        clock,
        last_activity: Instant::now(),
    };
    watchface.start();

    loop {
        watchface.redraw();

        let event = match watchface.next_wakeup() {
            Some((wakeup, at)) => match select(FACE_EVENTS.receive(), Timer::at(at)).await {
                Either::First(event) => Ok(event),
                Either::Second(()) => Err(wakeup),
            },
            None => Ok(FACE_EVENTS.receive().await),
        };

        match event {
            Ok(event) => watchface.handle_event(event),
            Err(wakeup) => watchface.handle_wakeup(wakeup),
        }
    }
}

impl Watchface {
    fn start(&mut self) {
        let now_ms = self.clock.now_ms();
        self.face.on_apply_window_insets(ScreenShape::Square);
        self.face.on_properties_changed(Properties {
            low_bit_ambient: false,
        });
        self.face.on_visibility_changed(true, now_ms);
        self.backlight.set(self.face.config().interactive_brightness);
    }

    fn redraw(&mut self) {
        if !self.face.is_visible() || !self.face.needs_redraw() {
            return;
        }
        let now_ms = self.clock.now_ms();
        if let Err(err) = self.face.draw(self.display.target(), now_ms) {
            defmt::warn!("Failed to draw face: {:?}", defmt::Debug2Format(&err));
        }
    }

    /// Earliest pending deadline
    fn next_wakeup(&self) -> Option<(Wakeup, Instant)> {
        if !self.face.is_visible() {
            return None;
        }

        let mut candidates: [Option<(Wakeup, Instant)>; 3] = [None; 3];

        candidates[0] = self
            .face
            .next_tick_deadline()
            .map(|at| (Wakeup::Tick, self.clock.instant_at(at)));
        candidates[1] = self
            .face
            .toast_deadline()
            .map(|at| (Wakeup::ToastExpired, self.clock.instant_at(at)));
        candidates[2] = if self.face.is_ambient() {
            let now_ms = self.clock.now_ms();
            let next_minute = now_ms - now_ms % MINUTE_MS + MINUTE_MS;
            Some((Wakeup::AmbientMinute, self.clock.instant_at(next_minute)))
        } else {
            let timeout = Duration::from_millis(self.face.config().ambient_timeout_ms);
            Some((Wakeup::Inactive, self.last_activity + timeout))
        };

        candidates.into_iter().flatten().min_by_key(|(_, at)| *at)
    }

    fn handle_wakeup(&mut self, wakeup: Wakeup) {
        let now_ms = self.clock.now_ms();
        match wakeup {
            Wakeup::Tick => self.face.handle_update_time_message(now_ms),
            // Drawing drops the expired toast
            Wakeup::ToastExpired => self.face.invalidate(),
            Wakeup::Inactive => {
                defmt::debug!("Entering ambient mode");
                self.face.on_ambient_mode_changed(true, now_ms);
                self.backlight.set(self.face.config().ambient_brightness);
            }
            Wakeup::AmbientMinute => self.face.on_time_tick(),
        }
    }

    fn handle_event(&mut self, event: FaceEvent) {
        let now_ms = self.clock.now_ms();
        match event {
            FaceEvent::Button => {
                if self.face.is_visible() && self.face.is_ambient() {
                    self.wake(now_ms);
                } else {
                    self.set_visible(!self.face.is_visible(), now_ms);
                }
            }
            FaceEvent::Touch(tap) => {
                if !self.face.is_visible() {
                    return;
                }
                self.wake(now_ms);
                self.face.on_tap_command(tap, now_ms);
            }
            FaceEvent::Connected => self.face.on_connected(),
            FaceEvent::ConnectionSuspended => self.face.on_connection_suspended(),
            FaceEvent::ConnectionFailed => self.face.on_connection_failed(),
            FaceEvent::DataChanged(event) => self.face.on_data_changed(&[event]),
            FaceEvent::SetTime(local) => {
                let utc = local - TimeDelta::seconds(i64::from(self.utc_offset_secs));
                self.clock.set_time(TimeReference::from_datetime(utc));
                defmt::info!("Clock set to {} ms", self.clock.now_ms());
                // Tick deadline is in wall-clock time, restart it
                let now_ms = self.clock.now_ms();
                self.face.on_ambient_mode_changed(self.face.is_ambient(), now_ms);
                self.face.invalidate();
            }
            FaceEvent::TimeZone(offset) => {
                self.utc_offset_secs = offset;
                self.face.on_time_zone_changed(offset);
            }
        }
    }

    /// Leave ambient mode after user interaction and pick up the phone again
    /// if it went away
    fn wake(&mut self, now_ms: u64) {
        self.last_activity = Instant::now();
        self.face.reconnect();
        if self.face.is_ambient() {
            defmt::debug!("Leaving ambient mode");
            self.face.on_ambient_mode_changed(false, now_ms);
            self.backlight.set(self.face.config().interactive_brightness);
        }
    }

    fn set_visible(&mut self, visible: bool, now_ms: u64) {
        defmt::debug!("Visible: {}", visible);
        if visible {
            self.last_activity = Instant::now();
            if self.face.is_ambient() {
                self.face.on_ambient_mode_changed(false, now_ms);
            }
            self.face.on_visibility_changed(true, now_ms);
            self.redraw();
            self.backlight.set(self.face.config().interactive_brightness);
        } else {
            self.face.on_visibility_changed(false, now_ms);
            self.backlight.off();
        }
    }
}
