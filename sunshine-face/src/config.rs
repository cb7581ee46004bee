//! Watchface configuration
//!
//! Everything here is plain data with `const` defaults so the firmware can
//! keep its configuration in a `static`.

use embedded_graphics::pixelcolor::Rgb565;

/// Physical outline of the panel, reported through the window insets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScreenShape {
    #[default]
    Square,
    Round,
}

/// Text sizes available to the face
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TextSize {
    Small,
    Medium,
    Large,
    ExtraLarge,
}

/// Baselines and text sizes for one screen shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Layout {
    /// Time baseline
    pub time_y: i32,
    /// Date baseline; the short rule sits 30 px below it
    pub date_y: i32,
    /// Rule separating date and weather
    pub divider_y: i32,
    /// Temperature baseline
    pub weather_y: i32,
    /// Toast baseline
    pub toast_y: i32,
    pub time_size: TextSize,
    pub date_size: TextSize,
    pub high_size: TextSize,
    pub low_size: TextSize,
}

impl Layout {
    pub const SQUARE: Layout = Layout {
        time_y: 80,
        date_y: 112,
        divider_y: 158,
        weather_y: 195,
        toast_y: 228,
        time_size: TextSize::ExtraLarge,
        date_size: TextSize::Small,
        high_size: TextSize::Large,
        low_size: TextSize::Medium,
    };

    pub const ROUND: Layout = Layout {
        time_y: 90,
        date_y: 120,
        divider_y: 160,
        weather_y: 192,
        toast_y: 215,
        time_size: TextSize::ExtraLarge,
        date_size: TextSize::Small,
        high_size: TextSize::Large,
        low_size: TextSize::Medium,
    };
}

/// Colours used in interactive mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: Rgb565,
    pub digital_text: Rgb565,
    pub primary_light: Rgb565,
    pub ambient_text: Rgb565,
}

impl Palette {
    /// Sunshine blue background with white and light-blue text
    pub const SUNSHINE: Palette = Palette {
        background: Rgb565::new(0x06, 0x2B, 0x1B),
        digital_text: Rgb565::new(0x1F, 0x3F, 0x1F),
        primary_light: Rgb565::new(0x16, 0x39, 0x1E),
        ambient_text: Rgb565::new(0x1F, 0x3F, 0x1F),
    };
}

/// Watchface settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceConfig {
    /// Offset of local time from UTC
    pub utc_offset_secs: i32,
    /// Message shown after a tap
    pub toast_message: &'static str,
    /// How long the toast stays on screen
    pub toast_duration_ms: u64,
    pub palette: Palette,
    pub square: Layout,
    pub round: Layout,
    /// Backlight level (0-7) in interactive mode
    pub interactive_brightness: u8,
    /// Backlight level (0-7) in ambient mode
    pub ambient_brightness: u8,
    /// Idle time before a visible face drops to ambient mode
    pub ambient_timeout_ms: u64,
}

impl FaceConfig {
    pub const DEFAULT: FaceConfig = FaceConfig {
        utc_offset_secs: 0,
        toast_message: "Sunshine",
        toast_duration_ms: 2_000,
        palette: Palette::SUNSHINE,
        square: Layout::SQUARE,
        round: Layout::ROUND,
        interactive_brightness: 5,
        ambient_brightness: 1,
        ambient_timeout_ms: 15_000,
    };

    pub fn layout(&self, shape: ScreenShape) -> &Layout {
        match shape {
            ScreenShape::Square => &self.square,
            ScreenShape::Round => &self.round,
        }
    }
}

impl Default for FaceConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
