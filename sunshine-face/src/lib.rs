//! Board-agnostic core of the Sunshine weather watchface
//!
//! This crate contains everything that does not touch hardware:
//!
//! - Lifecycle engine driven by the firmware's callbacks
//! - Interactive redraw timer aligned to wall-clock seconds
//! - Weather data-sync payloads and the request sent to the phone
//! - Face rendering onto any `embedded-graphics` RGB565 target
//! - Clock formatting and BLE Current Time Service decoding
//!
//! The firmware owns the display, the radio and the executor; it feeds events
//! into [`engine::Engine`] and sleeps until [`engine::Engine::next_tick_deadline`].

#![no_std]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod sync;
pub mod tick;
pub mod ui;
pub mod weather;

pub use config::{FaceConfig, ScreenShape};
pub use engine::{Engine, Properties, TapType};
pub use error::{ClockError, LinkError, SyncError};
pub use sync::{DataEvent, DataItem, DataLink};
pub use weather::WeatherSnapshot;
