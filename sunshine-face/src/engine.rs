//! Watchface engine
//!
//! Holds all per-face state and exposes one method per lifecycle callback.
//! Every callback is expected to run on the same executor task, so nothing in
//! here is shared or locked. Callbacks that change what is on screen mark the
//! engine invalidated; the owner redraws with [`Engine::draw`] when
//! [`Engine::needs_redraw`] says so.

use embedded_graphics::{pixelcolor::Rgb565, prelude::DrawTarget};
use rand_core::RngCore;

use crate::clock::LocalClock;
use crate::config::{FaceConfig, ScreenShape};
use crate::sync::{self, DataEvent, DataLink};
use crate::tick::TickScheduler;
use crate::ui::{SunshineWatchface, WatchFace, WatchFaceState};
use crate::weather::WeatherSnapshot;

/// Tap gesture phases reported by the touch controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TapType {
    /// Finger went down
    Touch,
    /// Gesture turned into something other than a tap
    TouchCancel,
    /// Completed tap
    Tap,
}

/// Display properties reported once the panel is known
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Properties {
    /// Panel has fewer bits per colour in ambient mode
    pub low_bit_ambient: bool,
}

pub struct Engine<L, R>
where
    L: DataLink,
    R: RngCore,
{
    config: FaceConfig,
    face: SunshineWatchface,
    ticker: TickScheduler,
    clock: LocalClock,
    weather: WeatherSnapshot,
    link: L,
    rng: R,

    visible: bool,
    ambient: bool,
    low_bit_ambient: bool,
    shape: ScreenShape,
    /// Data-change listener registered with the link
    listening: bool,
    invalidated: bool,
    toast_until_ms: Option<u64>,
}

impl<L, R> Engine<L, R>
where
    L: DataLink,
    R: RngCore,
{
    /// Create the engine. The face starts invisible and interactive.
    pub fn new(config: FaceConfig, link: L, rng: R) -> Self {
        let shape = ScreenShape::default();
        Self {
            face: SunshineWatchface::new(*config.layout(shape), config.palette),
            clock: LocalClock::new(config.utc_offset_secs),
            config,
            ticker: TickScheduler::new(),
            weather: WeatherSnapshot::new(),
            link,
            rng,
            visible: false,
            ambient: false,
            low_bit_ambient: false,
            shape,
            listening: false,
            invalidated: true,
            toast_until_ms: None,
        }
    }

    pub fn on_destroy(&mut self) {
        self.ticker.cancel();
        self.listening = false;
        if self.link.is_connected() {
            self.link.disconnect();
        }
        debug!("engine destroyed");
    }

    pub fn on_visibility_changed(&mut self, visible: bool, now_ms: u64) {
        self.visible = visible;

        if visible {
            self.link.connect();
            self.invalidate();
        } else if self.link.is_connected() {
            self.listening = false;
            self.link.disconnect();
        }

        // Timer depends on visibility as well as ambient mode
        self.update_timer(now_ms);
    }

    pub fn on_apply_window_insets(&mut self, shape: ScreenShape) {
        self.shape = shape;
        self.face.set_layout(*self.config.layout(shape));
        self.invalidate();
    }

    pub fn on_properties_changed(&mut self, properties: Properties) {
        self.low_bit_ambient = properties.low_bit_ambient;
    }

    /// Minute tick while in ambient mode
    pub fn on_time_tick(&mut self) {
        self.invalidate();
    }

    pub fn on_ambient_mode_changed(&mut self, ambient: bool, now_ms: u64) {
        if self.ambient != ambient {
            self.ambient = ambient;
            self.invalidate();
        }

        // Timer depends on ambient mode as well as visibility
        self.update_timer(now_ms);
    }

    pub fn on_tap_command(&mut self, tap: TapType, now_ms: u64) {
        if tap == TapType::Tap {
            self.toast_until_ms = Some(now_ms + self.config.toast_duration_ms);
        }
        self.invalidate();
    }

    pub fn on_time_zone_changed(&mut self, utc_offset_secs: i32) {
        self.clock.set_utc_offset(utc_offset_secs);
        self.invalidate();
    }

    /// Tick deadline reached
    pub fn handle_update_time_message(&mut self, now_ms: u64) {
        self.invalidate();
        let should_run = self.should_timer_be_running();
        self.ticker.on_fire(now_ms, should_run);
    }

    pub fn on_connected(&mut self) {
        self.listening = true;
        info!("data link connected");
        self.request_weather_data();
    }

    pub fn on_connection_suspended(&mut self) {
        debug!("data link suspended");
        self.listening = false;
        self.link.disconnect();
    }

    pub fn on_connection_failed(&mut self) {
        warn!("data link connection failed");
    }

    /// Bring the link back for a visible face whose phone went away
    pub fn reconnect(&mut self) {
        if self.visible && !self.link.is_connected() {
            debug!("reconnecting data link");
            self.link.connect();
        }
    }

    pub fn on_data_changed(&mut self, events: &[DataEvent]) {
        if !self.listening {
            debug!("dropping {} data events, not listening", events.len());
            return;
        }

        for event in events {
            let item = match event {
                DataEvent::Changed(item) => item,
                DataEvent::Deleted(path) => {
                    debug!("data item deleted: {}", path.as_str());
                    continue;
                }
            };

            debug!("data item changed: {}", item.path());
            let Some(update) = sync::weather_update(item) else {
                continue;
            };

            match update.high.as_deref() {
                Some(high) => debug!("high = {}", high),
                None => debug!("no high temperature in update"),
            }
            match update.low.as_deref() {
                Some(low) => debug!("low = {}", low),
                None => debug!("no low temperature in update"),
            }

            self.weather.apply(update);
            self.invalidate();
        }
    }

    /// Draw the face for `now_ms` and clear the invalidated flag
    pub fn draw<D>(&mut self, target: &mut D, now_ms: u64) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        if matches!(self.toast_until_ms, Some(until) if until <= now_ms) {
            self.toast_until_ms = None;
        }

        let Some(time) = self.clock.local(now_ms) else {
            warn!("wall clock out of range: {}", now_ms);
            return Ok(());
        };

        let state = WatchFaceState {
            time,
            ambient: self.ambient,
            low_bit_ambient: self.low_bit_ambient,
            weather: &self.weather,
            toast: self.toast_until_ms.map(|_| self.config.toast_message),
        };
        self.face.draw(&state, target)?;

        self.invalidated = false;
        Ok(())
    }

    pub fn invalidate(&mut self) {
        self.invalidated = true;
    }

    pub fn needs_redraw(&self) -> bool {
        self.invalidated
    }

    /// Timer runs only while visible and interactive
    pub fn should_timer_be_running(&self) -> bool {
        self.visible && !self.ambient
    }

    pub fn next_tick_deadline(&self) -> Option<u64> {
        self.ticker.deadline()
    }

    /// When the toast has to be taken off the screen
    pub fn toast_deadline(&self) -> Option<u64> {
        self.toast_until_ms
    }

    pub fn weather(&self) -> &WeatherSnapshot {
        &self.weather
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_ambient(&self) -> bool {
        self.ambient
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn shape(&self) -> ScreenShape {
        self.shape
    }

    pub fn config(&self) -> &FaceConfig {
        &self.config
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    fn update_timer(&mut self, now_ms: u64) {
        let should_run = self.should_timer_be_running();
        self.ticker.update_timer(now_ms, should_run);
    }

    fn request_weather_data(&mut self) {
        let item = match sync::request_weather_data(&mut self.rng) {
            Ok(item) => item,
            Err(_err) => {
                warn!("failed to build weather request: {:?}", _err);
                return;
            }
        };

        match self.link.put_data_item(&item) {
            Ok(()) => debug!("asked phone for weather data"),
            Err(_err) => warn!("failed asking phone for weather data: {:?}", _err),
        }
    }
}
