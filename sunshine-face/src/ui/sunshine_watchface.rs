//! Sunshine watchface: time, date and today's high/low

use embedded_graphics::{
    mono_font::{MonoFont, MonoTextStyle},
    pixelcolor::Rgb565,
    prelude::*,
    primitives::{Line, PrimitiveStyle, Rectangle},
    text::{Alignment, Text},
};
use profont::{PROFONT_12_POINT, PROFONT_14_POINT, PROFONT_18_POINT, PROFONT_24_POINT};

use super::{WatchFace, WatchFaceState};
use crate::clock::{self, DateText, TimeText};
use crate::config::{Layout, Palette, TextSize};

/// Half width of the short rules under the date
const RULE_HALF_WIDTH: i32 = 20;
/// Gap between the date baseline and the rule below it
const RULE_OFFSET: i32 = 30;
/// Horizontal gap between high and low temperature
const TEMPERATURE_GAP: i32 = 20;

fn font(size: TextSize) -> &'static MonoFont<'static> {
    match size {
        TextSize::Small => &PROFONT_12_POINT,
        TextSize::Medium => &PROFONT_14_POINT,
        TextSize::Large => &PROFONT_18_POINT,
        TextSize::ExtraLarge => &PROFONT_24_POINT,
    }
}

/// Advance width of `text` set in a monospaced font
fn text_width(font: &MonoFont<'_>, text: &str) -> i32 {
    let chars = text.chars().count() as u32;
    if chars == 0 {
        return 0;
    }
    (font.character_size.width * chars + font.character_spacing * (chars - 1)) as i32
}

/// Colours of one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Colors {
    background: Rgb565,
    time: Rgb565,
    date: Rgb565,
    high: Rgb565,
    low: Rgb565,
}

impl Colors {
    fn select(palette: &Palette, ambient: bool, low_bit_ambient: bool) -> Self {
        match (ambient, low_bit_ambient) {
            // Low-bit panels only get pure white on black
            (true, true) => Self {
                background: Rgb565::BLACK,
                time: Rgb565::WHITE,
                date: Rgb565::WHITE,
                high: Rgb565::WHITE,
                low: Rgb565::WHITE,
            },
            (true, false) => Self {
                background: Rgb565::BLACK,
                time: palette.digital_text,
                date: palette.ambient_text,
                high: palette.digital_text,
                low: palette.ambient_text,
            },
            (false, _) => Self {
                background: palette.background,
                time: palette.digital_text,
                date: palette.primary_light,
                high: palette.digital_text,
                low: palette.digital_text,
            },
        }
    }
}

/// High and low temperature with their resolved positions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeatherLine<'a> {
    pub high: &'a str,
    pub low: &'a str,
    /// Left edge of the high temperature
    pub high_x: i32,
    /// Left edge of the low temperature
    pub low_x: i32,
    pub baseline: i32,
    /// Rule separating date and weather
    pub divider_y: i32,
}

/// Everything drawn for one redraw
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame<'a> {
    pub center_x: i32,
    pub time: TimeText,
    pub date: DateText,
    /// Short rule under the date
    pub rule_y: i32,
    /// Omitted unless both temperatures are known
    pub weather: Option<WeatherLine<'a>>,
    pub toast: Option<&'a str>,
    layout: Layout,
    colors: Colors,
}

impl Frame<'_> {
    pub fn background(&self) -> Rgb565 {
        self.colors.background
    }

    fn rule<D>(&self, y: i32, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        Line::new(
            Point::new(self.center_x - RULE_HALF_WIDTH, y),
            Point::new(self.center_x + RULE_HALF_WIDTH, y),
        )
        .into_styled(PrimitiveStyle::with_stroke(self.colors.date, 1))
        .draw(target)
    }
}

impl Drawable for Frame<'_> {
    type Color = Rgb565;
    type Output = ();

    fn draw<D>(&self, target: &mut D) -> Result<Self::Output, D::Error>
    where
        D: DrawTarget<Color = Self::Color>,
    {
        let layout = &self.layout;
        let colors = &self.colors;

        target.clear(colors.background)?;

        // Time
        let style = MonoTextStyle::new(font(layout.time_size), colors.time);
        Text::with_alignment(
            &self.time,
            Point::new(self.center_x, layout.time_y),
            style,
            Alignment::Center,
        )
        .draw(target)?;

        // Date and the rule beneath it
        let date_style = MonoTextStyle::new(font(layout.date_size), colors.date);
        Text::with_alignment(
            &self.date,
            Point::new(self.center_x, layout.date_y),
            date_style,
            Alignment::Center,
        )
        .draw(target)?;
        self.rule(self.rule_y, target)?;

        // Temperatures
        if let Some(weather) = &self.weather {
            self.rule(weather.divider_y, target)?;

            let high_style = MonoTextStyle::new(font(layout.high_size), colors.high);
            Text::new(
                weather.high,
                Point::new(weather.high_x, weather.baseline),
                high_style,
            )
            .draw(target)?;

            let low_style = MonoTextStyle::new(font(layout.low_size), colors.low);
            Text::new(
                weather.low,
                Point::new(weather.low_x, weather.baseline),
                low_style,
            )
            .draw(target)?;
        }

        if let Some(toast) = self.toast {
            Text::with_alignment(
                toast,
                Point::new(self.center_x, layout.toast_y),
                date_style,
                Alignment::Center,
            )
            .draw(target)?;
        }

        Ok(())
    }
}

/// Digital face with seconds. In ambient mode the seconds are hidden and, on
/// low-bit panels, everything is drawn in pure white.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SunshineWatchface {
    layout: Layout,
    palette: Palette,
}

impl SunshineWatchface {
    pub const fn new(layout: Layout, palette: Palette) -> Self {
        Self { layout, palette }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Switch layout, e.g. after the screen shape became known
    pub fn set_layout(&mut self, layout: Layout) {
        self.layout = layout;
    }

    fn weather_line<'a>(
        &self,
        high: &'a str,
        low: &'a str,
        center_x: i32,
        ambient: bool,
    ) -> WeatherLine<'a> {
        let high_width = text_width(font(self.layout.high_size), high);

        let high_x = if ambient {
            center_x - RULE_HALF_WIDTH
        } else {
            let low_width = text_width(font(self.layout.low_size), low);
            center_x - (high_width + TEMPERATURE_GAP + low_width) / 2
        };

        WeatherLine {
            high,
            low,
            high_x,
            low_x: high_x + high_width + TEMPERATURE_GAP,
            baseline: self.layout.weather_y,
            divider_y: self.layout.divider_y,
        }
    }
}

impl WatchFace for SunshineWatchface {
    fn compose<'a>(&self, state: &WatchFaceState<'a>, bounds: Rectangle) -> Frame<'a> {
        let center_x = bounds.top_left.x + bounds.size.width as i32 / 2;

        let weather = state
            .weather
            .both()
            .map(|(high, low)| self.weather_line(high, low, center_x, state.ambient));

        Frame {
            center_x,
            time: clock::format_time(&state.time, state.ambient),
            date: clock::format_date(&state.time.date()),
            rule_y: self.layout.date_y + RULE_OFFSET,
            weather,
            toast: state.toast,
            layout: self.layout,
            colors: Colors::select(&self.palette, state.ambient, state.low_bit_ambient),
        }
    }
}
