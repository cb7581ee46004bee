//! Drawing the face into an in-memory framebuffer

use core::convert::Infallible;

use embedded_graphics::{pixelcolor::Rgb565, prelude::*};
use rand_core::RngCore;
use sunshine_face::{
    config::Layout,
    sync::{DataItem, KEY_HIGH, KEY_LOW, WEATHER_PATH},
    DataEvent, DataLink, Engine, FaceConfig, LinkError, Properties, TapType,
};

const WIDTH: u32 = 240;
const HEIGHT: u32 = 240;
/// 2016-07-22 21:07:05.123 UTC
const NOW_MS: u64 = 1_469_221_625_123;

struct Framebuffer {
    pixels: Vec<Rgb565>,
}

impl Framebuffer {
    fn new() -> Self {
        Self {
            pixels: vec![Rgb565::new(0x0F, 0x00, 0x0F); (WIDTH * HEIGHT) as usize],
        }
    }

    fn pixel(&self, x: u32, y: u32) -> Rgb565 {
        self.pixels[(y * WIDTH + x) as usize]
    }

    /// Pixels in rows `top..=bottom` that differ from `background`
    fn ink_in_rows(&self, top: i32, bottom: i32, background: Rgb565) -> usize {
        (top as u32..=bottom as u32)
            .flat_map(|y| (0..WIDTH).map(move |x| (x, y)))
            .filter(|&(x, y)| self.pixel(x, y) != background)
            .count()
    }
}

impl OriginDimensions for Framebuffer {
    fn size(&self) -> Size {
        Size::new(WIDTH, HEIGHT)
    }
}

impl DrawTarget for Framebuffer {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0 && point.y >= 0 && (point.x as u32) < WIDTH && (point.y as u32) < HEIGHT
            {
                self.pixels[(point.y as u32 * WIDTH + point.x as u32) as usize] = color;
            }
        }
        Ok(())
    }
}

#[derive(Default)]
struct LoopbackLink {
    connected: bool,
}

impl DataLink for LoopbackLink {
    fn connect(&mut self) {
        self.connected = true;
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn put_data_item(&mut self, _item: &DataItem) -> Result<(), LinkError> {
        if self.connected {
            Ok(())
        } else {
            Err(LinkError::NotConnected)
        }
    }
}

struct ZeroRng;

impl RngCore for ZeroRng {
    fn next_u32(&mut self) -> u32 {
        0
    }

    fn next_u64(&mut self) -> u64 {
        0
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        dest.fill(0);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

fn connected_engine() -> Engine<LoopbackLink, ZeroRng> {
    let mut engine = Engine::new(FaceConfig::DEFAULT, LoopbackLink::default(), ZeroRng);
    engine.on_visibility_changed(true, NOW_MS);
    engine.on_connected();
    engine
}

fn send_weather(engine: &mut Engine<LoopbackLink, ZeroRng>, high: Option<&str>, low: Option<&str>) {
    let mut item = DataItem::new(WEATHER_PATH).unwrap();
    if let Some(high) = high {
        item.data_mut().put_string(KEY_HIGH, high).unwrap();
    }
    if let Some(low) = low {
        item.data_mut().put_string(KEY_LOW, low).unwrap();
    }
    engine.on_data_changed(&[DataEvent::Changed(item)]);
}

/// Rows between the date rule and the toast, where only the weather line lives
fn weather_band() -> (i32, i32) {
    let layout = Layout::SQUARE;
    (layout.date_y + 31, layout.weather_y + 8)
}

#[test]
fn draws_time_date_and_weather() {
    let mut engine = connected_engine();
    send_weather(&mut engine, Some("25°"), Some("16°"));

    let mut fb = Framebuffer::new();
    engine.draw(&mut fb, NOW_MS).unwrap();
    assert!(!engine.needs_redraw());

    let background = FaceConfig::DEFAULT.palette.background;
    let layout = Layout::SQUARE;
    assert!(fb.ink_in_rows(layout.time_y - 20, layout.time_y, background) > 0);
    assert!(fb.ink_in_rows(layout.date_y - 10, layout.date_y, background) > 0);

    let (top, bottom) = weather_band();
    assert!(fb.ink_in_rows(top, bottom, background) > 0);
}

#[test]
fn weather_band_empty_until_both_values_known() {
    let mut engine = connected_engine();
    let background = FaceConfig::DEFAULT.palette.background;
    let (top, bottom) = weather_band();

    let mut fb = Framebuffer::new();
    engine.draw(&mut fb, NOW_MS).unwrap();
    assert_eq!(fb.ink_in_rows(top, bottom, background), 0);

    send_weather(&mut engine, Some("25°"), None);
    let mut fb = Framebuffer::new();
    engine.draw(&mut fb, NOW_MS).unwrap();
    assert_eq!(fb.ink_in_rows(top, bottom, background), 0);

    send_weather(&mut engine, None, Some("16°"));
    let mut fb = Framebuffer::new();
    engine.draw(&mut fb, NOW_MS).unwrap();
    assert!(fb.ink_in_rows(top, bottom, background) > 0);
}

#[test]
fn low_bit_ambient_uses_only_black_and_white() {
    let mut engine = connected_engine();
    send_weather(&mut engine, Some("25°"), Some("16°"));
    engine.on_properties_changed(Properties {
        low_bit_ambient: true,
    });
    engine.on_ambient_mode_changed(true, NOW_MS);
    assert_eq!(engine.next_tick_deadline(), None);

    let mut fb = Framebuffer::new();
    engine.draw(&mut fb, NOW_MS).unwrap();

    assert!(fb
        .pixels
        .iter()
        .all(|&c| c == Rgb565::BLACK || c == Rgb565::WHITE));
    assert!(fb.pixels.iter().any(|&c| c == Rgb565::WHITE));
}

#[test]
fn toast_disappears_after_its_duration() {
    let mut engine = connected_engine();
    let background = FaceConfig::DEFAULT.palette.background;
    let toast_y = Layout::SQUARE.toast_y;

    engine.on_tap_command(TapType::Tap, NOW_MS);
    let mut fb = Framebuffer::new();
    engine.draw(&mut fb, NOW_MS).unwrap();
    assert!(fb.ink_in_rows(toast_y - 10, toast_y, background) > 0);

    let later = NOW_MS + FaceConfig::DEFAULT.toast_duration_ms;
    let mut fb = Framebuffer::new();
    engine.draw(&mut fb, later).unwrap();
    assert_eq!(fb.ink_in_rows(toast_y - 10, toast_y, background), 0);
    assert_eq!(engine.toast_deadline(), None);
}

#[test]
fn time_zone_change_redraws_the_time() {
    let mut engine = connected_engine();
    let layout = Layout::SQUARE;
    let time_rows = |fb: &Framebuffer| -> Vec<Rgb565> {
        (layout.time_y - 20..=layout.time_y)
            .flat_map(|y| (0..WIDTH).map(move |x| (x, y as u32)))
            .map(|(x, y)| fb.pixel(x, y))
            .collect()
    };

    let mut before = Framebuffer::new();
    engine.draw(&mut before, NOW_MS).unwrap();

    engine.on_time_zone_changed(3_600);
    assert!(engine.needs_redraw());
    let mut after = Framebuffer::new();
    engine.draw(&mut after, NOW_MS).unwrap();

    // 9:07:05 becomes 10:07:05
    assert_ne!(time_rows(&before), time_rows(&after));
}
