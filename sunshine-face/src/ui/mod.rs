//! UI definitions module

use chrono::NaiveDateTime;
use embedded_graphics::{pixelcolor::Rgb565, prelude::*, primitives::Rectangle};

use crate::weather::WeatherSnapshot;

mod sunshine_watchface;

pub use sunshine_watchface::{Frame, SunshineWatchface, WeatherLine};

pub trait WatchFace {
    /// Lay out one frame for the given state inside `bounds`
    fn compose<'a>(&self, state: &WatchFaceState<'a>, bounds: Rectangle) -> Frame<'a>;

    /// Render the state onto a display
    fn draw<D>(&self, state: &WatchFaceState<'_>, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let frame = self.compose(state, target.bounding_box());
        frame.draw(target)
    }
}

/// State for the watch face
#[derive(Debug, Clone, Copy)]
pub struct WatchFaceState<'a> {
    /// Local time to show
    pub time: NaiveDateTime,
    pub ambient: bool,
    pub low_bit_ambient: bool,
    pub weather: &'a WeatherSnapshot,
    /// Transient message after a tap
    pub toast: Option<&'a str>,
}
